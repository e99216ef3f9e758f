use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, AuthResult};

/// Application-focused representation of verified JWT claims.
///
/// `permissions` is `None` when the token carries no permissions claim at
/// all, which the guard layer treats as issuer misconfiguration rather than
/// insufficient privilege. The full decoded payload is kept in `raw` for
/// claims this struct does not model.
#[derive(Debug, Clone, Serialize)]
pub struct Claims {
    pub subject: Option<String>,
    pub issuer: String,
    pub audience: Vec<String>,
    pub expires_at: DateTime<Utc>,
    pub issued_at: Option<DateTime<Utc>>,
    pub permissions: Option<Vec<String>>,
    pub raw: serde_json::Value,
}

impl Claims {
    /// True only when the permissions claim is present and contains `scope`.
    pub fn has_permission(&self, scope: &str) -> bool {
        self.permissions
            .as_deref()
            .is_some_and(|perms| perms.iter().any(|value| value == scope))
    }
}

#[derive(Debug, Deserialize)]
struct ClaimsRepr {
    #[serde(default)]
    sub: Option<String>,
    iss: String,
    #[serde(default)]
    aud: Option<AudienceRepr>,
    exp: i64,
    #[serde(default)]
    iat: Option<i64>,
    #[serde(default)]
    permissions: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AudienceRepr {
    Single(String),
    Many(Vec<String>),
}

impl TryFrom<ClaimsRepr> for Claims {
    type Error = AuthError;

    fn try_from(value: ClaimsRepr) -> AuthResult<Self> {
        let expires_at = Utc
            .timestamp_opt(value.exp, 0)
            .single()
            .ok_or_else(|| AuthError::InvalidClaims(format!("exp out of range: {}", value.exp)))?;

        let issued_at = match value.iat {
            Some(iat) => Some(
                Utc.timestamp_opt(iat, 0)
                    .single()
                    .ok_or_else(|| AuthError::InvalidClaims(format!("iat out of range: {iat}")))?,
            ),
            None => None,
        };

        let audience = match value.aud {
            Some(AudienceRepr::Single(item)) => vec![item],
            Some(AudienceRepr::Many(items)) => items,
            None => Vec::new(),
        };

        Ok(Self {
            subject: value.sub,
            issuer: value.iss,
            audience,
            expires_at,
            issued_at,
            permissions: value.permissions,
            raw: serde_json::Value::Null,
        })
    }
}

impl TryFrom<serde_json::Value> for Claims {
    type Error = AuthError;

    fn try_from(value: serde_json::Value) -> AuthResult<Self> {
        let repr: ClaimsRepr = serde_json::from_value(value.clone())
            .map_err(|err| AuthError::InvalidClaims(err.to_string()))?;
        let mut claims = Claims::try_from(repr)?;
        claims.raw = value;
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_permissions_claim_stays_none() {
        let claims = Claims::try_from(json!({
            "iss": "https://issuer.example.com/",
            "aud": "catalog",
            "exp": 4_102_444_800i64,
        }))
        .expect("claims");

        assert!(claims.permissions.is_none());
        assert!(!claims.has_permission("get:movies"));
    }

    #[test]
    fn empty_permissions_claim_is_present_but_grants_nothing() {
        let claims = Claims::try_from(json!({
            "iss": "https://issuer.example.com/",
            "aud": "catalog",
            "exp": 4_102_444_800i64,
            "permissions": [],
        }))
        .expect("claims");

        assert_eq!(claims.permissions.as_deref(), Some(&[][..]));
        assert!(!claims.has_permission("get:movies"));
    }

    #[test]
    fn permission_lookup_is_exact() {
        let claims = Claims::try_from(json!({
            "iss": "https://issuer.example.com/",
            "aud": ["catalog", "other"],
            "exp": 4_102_444_800i64,
            "permissions": ["get:movies", "post:movies"],
        }))
        .expect("claims");

        assert!(claims.has_permission("get:movies"));
        assert!(!claims.has_permission("get:actors"));
        assert_eq!(claims.audience.len(), 2);
    }

    #[test]
    fn raw_payload_is_preserved() {
        let payload = json!({
            "iss": "https://issuer.example.com/",
            "aud": "catalog",
            "exp": 4_102_444_800i64,
            "azp": "client-id",
        });
        let claims = Claims::try_from(payload.clone()).expect("claims");
        assert_eq!(claims.raw, payload);
    }
}
