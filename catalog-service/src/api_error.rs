use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use common_auth::AuthError;
use serde::Serialize;

/// Service-level failures, mapped onto the API's uniform
/// `{success, error, message}` envelope.
#[derive(Debug)]
pub enum ApiError {
    Validation(String),
    Duplicate(&'static str),
    NotFound(&'static str),
    Auth(AuthError),
    Internal(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        ApiError::Internal(err.to_string())
    }

    /// Maps a persistence failure, turning the constraint violations that
    /// back the pre-insert checks into their client-facing kinds so a race
    /// between two identical inserts still yields a 409/422 rather than 500.
    pub fn from_db(err: sqlx::Error, duplicate: &'static str) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.kind() {
                sqlx::error::ErrorKind::UniqueViolation => return ApiError::Duplicate(duplicate),
                sqlx::error::ErrorKind::ForeignKeyViolation => {
                    return ApiError::validation("referenced resource does not exist");
                }
                _ => {}
            }
        }
        ApiError::internal(err)
    }
}

impl From<AuthError> for ApiError {
    fn from(value: AuthError) -> Self {
        ApiError::Auth(value)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: u16,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            // Auth errors already render the same envelope.
            ApiError::Auth(err) => return err.into_response(),
            ApiError::Validation(message) => (StatusCode::UNPROCESSABLE_ENTITY, message),
            ApiError::Duplicate(message) => (StatusCode::CONFLICT, message.to_string()),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message.to_string()),
            ApiError::Internal(cause) => {
                tracing::error!(error = %cause, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = ErrorBody {
            success: false,
            error: status.as_u16(),
            message,
        };
        (status, Json(body)).into_response()
    }
}
