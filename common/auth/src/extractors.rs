use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::{header::AUTHORIZATION, request::Parts};

use crate::claims::Claims;
use crate::error::{AuthError, AuthResult};
use crate::guards::require_scope;
use crate::verifier::JwtVerifier;

/// Extracts and verifies the bearer token, rejecting the request before the
/// handler runs on any failure.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub claims: Claims,
}

impl AuthContext {
    /// Permission gate; handlers call this before touching any state.
    pub fn require(&self, scope: &str) -> AuthResult<()> {
        require_scope(&self.claims, scope)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    Arc<JwtVerifier>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let verifier = Arc::<JwtVerifier>::from_ref(state);

        let header_value = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingAuthorization)?;

        let token = parse_bearer(header_value)?;
        let claims = verifier.verify(&token).await?;

        Ok(Self { claims })
    }
}

/// Splits the header into exactly two whitespace-separated parts and demands
/// a case-insensitive `bearer` scheme.
pub fn parse_bearer(value: &axum::http::HeaderValue) -> AuthResult<String> {
    let raw = value
        .to_str()
        .map_err(|_| AuthError::InvalidAuthorization)?
        .trim();

    if raw.is_empty() {
        return Err(AuthError::MissingAuthorization);
    }

    let parts: Vec<&str> = raw.split_whitespace().collect();
    if parts.len() != 2 {
        return Err(AuthError::InvalidAuthorization);
    }
    if !parts[0].eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidAuthorization);
    }

    Ok(parts[1].to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn parse_bearer_accepts_valid_token() {
        let header = HeaderValue::from_static("Bearer abc.def.ghi");
        let token = parse_bearer(&header).expect("token");
        assert_eq!(token, "abc.def.ghi");
    }

    #[test]
    fn parse_bearer_scheme_is_case_insensitive() {
        let header = HeaderValue::from_static("BEARER abc.def.ghi");
        assert_eq!(parse_bearer(&header).expect("token"), "abc.def.ghi");
        let header = HeaderValue::from_static("bearer abc.def.ghi");
        assert_eq!(parse_bearer(&header).expect("token"), "abc.def.ghi");
    }

    #[test]
    fn parse_bearer_rejects_wrong_scheme() {
        let header = HeaderValue::from_static("Basic credentials");
        let err = parse_bearer(&header).expect_err("should reject");
        assert!(matches!(err, AuthError::InvalidAuthorization));
    }

    #[test]
    fn parse_bearer_rejects_scheme_without_token() {
        let header = HeaderValue::from_static("Bearer");
        let err = parse_bearer(&header).expect_err("should reject");
        assert!(matches!(err, AuthError::InvalidAuthorization));
    }

    #[test]
    fn parse_bearer_rejects_extra_parts() {
        let header = HeaderValue::from_static("Bearer abc def");
        let err = parse_bearer(&header).expect_err("should reject");
        assert!(matches!(err, AuthError::InvalidAuthorization));
    }

    #[test]
    fn parse_bearer_rejects_empty_value() {
        let header = HeaderValue::from_static("   ");
        let err = parse_bearer(&header).expect_err("should reject empty header");
        assert!(matches!(err, AuthError::MissingAuthorization));
    }
}
