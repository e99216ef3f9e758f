use crate::claims::Claims;
use crate::error::{AuthError, AuthResult};

/// Checks that verified claims grant a required scope.
///
/// A token without any permissions claim is an issuer misconfiguration
/// (400), distinct from a well-formed token that simply lacks the scope
/// (403).
pub fn require_scope(claims: &Claims, required: &str) -> AuthResult<()> {
    let permissions = claims
        .permissions
        .as_deref()
        .ok_or(AuthError::MissingPermissionsClaim)?;

    if permissions.iter().any(|scope| scope == required) {
        Ok(())
    } else {
        Err(AuthError::PermissionDenied(required.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn claims(permissions: Option<Vec<&str>>) -> Claims {
        Claims {
            subject: Some("user@clients".to_owned()),
            issuer: "https://issuer.example.com/".to_owned(),
            audience: vec!["catalog".to_owned()],
            expires_at: Utc.timestamp_opt(4_102_444_800, 0).single().expect("exp"),
            issued_at: None,
            permissions: permissions
                .map(|perms| perms.into_iter().map(str::to_owned).collect()),
            raw: serde_json::Value::Null,
        }
    }

    #[test]
    fn granted_scope_passes() {
        let claims = claims(Some(vec!["get:movies", "post:movies"]));
        assert!(require_scope(&claims, "post:movies").is_ok());
    }

    #[test]
    fn missing_scope_is_denied() {
        let claims = claims(Some(vec!["get:movies"]));
        let err = require_scope(&claims, "delete:movies").expect_err("denied");
        assert!(matches!(err, AuthError::PermissionDenied(scope) if scope == "delete:movies"));
    }

    #[test]
    fn absent_permissions_claim_is_a_different_failure() {
        let claims = claims(None);
        let err = require_scope(&claims, "get:movies").expect_err("misconfigured");
        assert!(matches!(err, AuthError::MissingPermissionsClaim));
    }
}
