use std::time::Duration;

use jsonwebtoken::DecodingKey;
use reqwest::Client;
use serde::Deserialize;

use crate::error::{AuthError, AuthResult};

/// Upper bound on a single key-set fetch; a hung issuer endpoint surfaces as
/// `JwksFetch` rather than stalling the request.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct JwksFetcher {
    client: Client,
    url: String,
}

impl JwksFetcher {
    pub fn new(url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .expect("http client");
        Self {
            client,
            url: url.into(),
        }
    }

    /// Fetches and parses the key set, preserving document order. Any
    /// transport, status, or key-material problem is an error; keys are
    /// never silently skipped.
    pub async fn fetch(&self) -> AuthResult<Vec<(String, DecodingKey)>> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|err| AuthError::JwksFetch(err.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::JwksFetch(format!(
                "HTTP {} from {}",
                response.status(),
                self.url
            )));
        }

        let body: JwksResponse = response
            .json()
            .await
            .map_err(|err| AuthError::JwksDecode(err.to_string()))?;

        let mut keys = Vec::new();
        for key in body.keys.into_iter() {
            let kid = key.kid.ok_or(AuthError::JwksMissingKid)?;
            let kty = key.kty.unwrap_or_else(|| "RSA".to_string());
            if kty != "RSA" {
                return Err(AuthError::JwksUnsupportedKey { kid, kty });
            }

            if let Some(alg) = key.alg {
                if alg != "RS256" {
                    return Err(AuthError::JwksUnsupportedAlg { kid, alg });
                }
            }

            let modulus = key
                .n
                .ok_or_else(|| AuthError::JwksMissingComponents(kid.clone()))?;
            let exponent = key
                .e
                .ok_or_else(|| AuthError::JwksMissingComponents(kid.clone()))?;

            let decoding_key = DecodingKey::from_rsa_components(&modulus, &exponent)
                .map_err(|err| AuthError::KeyParse(kid.clone(), err.to_string()))?;
            keys.push((kid, decoding_key));
        }

        Ok(keys)
    }
}

#[derive(Debug, Deserialize)]
struct JwksResponse {
    keys: Vec<JwkEntry>,
}

#[derive(Debug, Deserialize)]
struct JwkEntry {
    kid: Option<String>,
    kty: Option<String>,
    alg: Option<String>,
    n: Option<String>,
    e: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn fetch_rejects_non_success_status() {
        let server = MockServer::start();
        let _mock = server.mock(|when, then| {
            when.method(GET).path("/jwks");
            then.status(503);
        });

        let fetcher = JwksFetcher::new(format!("{}/jwks", server.base_url()));
        let err = fetcher.fetch().await.err().expect("should fail");
        assert!(matches!(err, AuthError::JwksFetch(_)));
    }

    #[tokio::test]
    async fn fetch_rejects_unparseable_body() {
        let server = MockServer::start();
        let _mock = server.mock(|when, then| {
            when.method(GET).path("/jwks");
            then.status(200).body("not json");
        });

        let fetcher = JwksFetcher::new(format!("{}/jwks", server.base_url()));
        let err = fetcher.fetch().await.err().expect("should fail");
        assert!(matches!(err, AuthError::JwksDecode(_)));
    }

    #[tokio::test]
    async fn fetch_rejects_non_rsa_keys() {
        let server = MockServer::start();
        let body = serde_json::json!({
            "keys": [{ "kid": "ec-key", "kty": "EC", "alg": "ES256" }]
        });
        let _mock = server.mock(|when, then| {
            when.method(GET).path("/jwks");
            then.status(200)
                .header("content-type", "application/json")
                .body(body.to_string());
        });

        let fetcher = JwksFetcher::new(format!("{}/jwks", server.base_url()));
        let err = fetcher.fetch().await.err().expect("should fail");
        assert!(matches!(err, AuthError::JwksUnsupportedKey { .. }));
    }

    #[tokio::test]
    async fn fetch_rejects_entries_without_kid() {
        let server = MockServer::start();
        let body = serde_json::json!({
            "keys": [{ "kty": "RSA", "n": "AQAB", "e": "AQAB" }]
        });
        let _mock = server.mock(|when, then| {
            when.method(GET).path("/jwks");
            then.status(200)
                .header("content-type", "application/json")
                .body(body.to_string());
        });

        let fetcher = JwksFetcher::new(format!("{}/jwks", server.base_url()));
        let err = fetcher.fetch().await.err().expect("should fail");
        assert!(matches!(err, AuthError::JwksMissingKid));
    }
}
