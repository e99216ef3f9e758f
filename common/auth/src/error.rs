use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authorization header is expected")]
    MissingAuthorization,
    #[error("authorization header must be a bearer token")]
    InvalidAuthorization,
    #[error("token missing kid header")]
    MissingKeyId,
    #[error("no signing key found for kid '{0}'")]
    KeyNotFound(String),
    #[error("token expired")]
    TokenExpired,
    #[error("incorrect claims, check the audience and issuer: {0}")]
    InvalidClaims(String),
    #[error("unable to parse authentication token: {0}")]
    Malformed(String),
    #[error("permissions not included in token")]
    MissingPermissionsClaim,
    #[error("permission '{0}' not granted")]
    PermissionDenied(String),
    #[error("failed to fetch JWKS: {0}")]
    JwksFetch(String),
    #[error("failed to parse JWKS response: {0}")]
    JwksDecode(String),
    #[error("JWKS entry missing key id (kid)")]
    JwksMissingKid,
    #[error("JWKS key '{0}' missing required RSA components")]
    JwksMissingComponents(String),
    #[error("JWKS key '{kid}' uses unsupported key type '{kty}'")]
    JwksUnsupportedKey { kid: String, kty: String },
    #[error("JWKS key '{kid}' uses unsupported alg '{alg}'")]
    JwksUnsupportedAlg { kid: String, alg: String },
    #[error("failed to parse decoding key for kid '{0}': {1}")]
    KeyParse(String, String),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::MissingAuthorization
            | AuthError::InvalidAuthorization
            | AuthError::MissingKeyId
            | AuthError::TokenExpired
            | AuthError::InvalidClaims(_) => StatusCode::UNAUTHORIZED,
            AuthError::Malformed(_) | AuthError::MissingPermissionsClaim => {
                StatusCode::BAD_REQUEST
            }
            AuthError::KeyNotFound(_) | AuthError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            AuthError::JwksFetch(_)
            | AuthError::JwksDecode(_)
            | AuthError::JwksMissingKid
            | AuthError::JwksMissingComponents(_)
            | AuthError::JwksUnsupportedKey { .. }
            | AuthError::JwksUnsupportedAlg { .. }
            | AuthError::KeyParse(_, _) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Map a `jsonwebtoken` verification failure onto the taxonomy: expiry
    /// and claim mismatches keep their own kinds, everything else (bad
    /// signature, disallowed algorithm, garbage input) is a malformed token.
    pub fn from_jwt(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            ErrorKind::InvalidIssuer
            | ErrorKind::InvalidAudience
            | ErrorKind::InvalidSubject
            | ErrorKind::ImmatureSignature
            | ErrorKind::MissingRequiredClaim(_) => AuthError::InvalidClaims(err.to_string()),
            _ => AuthError::Malformed(err.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    error: u16,
    message: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "authorization pipeline failure");
        }
        let message = if status.is_server_error() {
            // Key-set and key-parse details stay in the logs.
            "Internal server error".to_string()
        } else {
            self.to_string()
        };
        let body = ErrorBody {
            success: false,
            error: status.as_u16(),
            message,
        };
        (status, Json(body)).into_response()
    }
}
