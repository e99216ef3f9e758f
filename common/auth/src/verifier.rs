use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde_json::Value;
use tracing::debug;

use crate::claims::Claims;
use crate::config::JwtConfig;
use crate::error::{AuthError, AuthResult};
use crate::jwks::JwksFetcher;

/// How long fetched key material stays fresh. Signatures and claims are
/// still verified on every request; only the public keys are cached.
pub const DEFAULT_KEY_TTL: Duration = Duration::from_secs(300);

/// Thread-safe store for decoding keys loaded from JWKS/PEM sources.
#[derive(Clone, Default)]
pub struct InMemoryKeyStore {
    inner: Arc<RwLock<StoreInner>>,
}

#[derive(Default)]
struct StoreInner {
    keys: HashMap<String, DecodingKey>,
    refreshed_at: Option<Instant>,
}

impl InMemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_key(&self, kid: impl Into<String>, key: DecodingKey) {
        let mut guard = self.inner.write().expect("rwlock poisoned");
        guard.keys.insert(kid.into(), key);
    }

    pub fn insert_rsa_pem(&self, kid: impl Into<String>, pem: &[u8]) -> AuthResult<()> {
        let kid = kid.into();
        let key = DecodingKey::from_rsa_pem(pem)
            .map_err(|err| AuthError::KeyParse(kid.clone(), err.to_string()))?;
        self.insert_key(kid, key);
        Ok(())
    }

    pub fn get(&self, kid: &str) -> Option<DecodingKey> {
        let guard = self.inner.read().expect("rwlock poisoned");
        guard.keys.get(kid).cloned()
    }

    pub fn contains(&self, kid: &str) -> bool {
        let guard = self.inner.read().expect("rwlock poisoned");
        guard.keys.contains_key(kid)
    }

    /// Swaps in a freshly fetched key set and restarts the freshness clock.
    pub fn replace_all<I>(&self, entries: I)
    where
        I: IntoIterator<Item = (String, DecodingKey)>,
    {
        let mut guard = self.inner.write().expect("rwlock poisoned");
        guard.keys.clear();
        for (kid, key) in entries.into_iter() {
            guard.keys.insert(kid, key);
        }
        guard.refreshed_at = Some(Instant::now());
    }

    /// Keys loaded outside a JWKS refresh (PEM preloads) never go stale.
    pub fn is_stale(&self, ttl: Duration) -> bool {
        let guard = self.inner.read().expect("rwlock poisoned");
        guard
            .refreshed_at
            .map(|at| at.elapsed() > ttl)
            .unwrap_or(false)
    }
}

#[derive(Clone)]
pub struct JwtVerifier {
    config: JwtConfig,
    store: InMemoryKeyStore,
    jwks: Option<JwksFetcher>,
    key_ttl: Duration,
}

impl JwtVerifier {
    pub fn new(config: JwtConfig) -> Self {
        Self {
            config,
            store: InMemoryKeyStore::new(),
            jwks: None,
            key_ttl: DEFAULT_KEY_TTL,
        }
    }

    pub fn builder(config: JwtConfig) -> JwtVerifierBuilder {
        JwtVerifierBuilder::new(config)
    }

    /// Verifies signature, expiry, audience, and issuer in one pass against
    /// a fixed RS256 allow-list. Key material is fetched on a cache miss or
    /// once the TTL lapses; an unknown kid after a refresh is a 403.
    pub async fn verify(&self, token: &str) -> AuthResult<Claims> {
        let header =
            decode_header(token).map_err(|err| AuthError::Malformed(err.to_string()))?;
        let kid = header.kid.ok_or(AuthError::MissingKeyId)?;

        let key = match self.store.get(&kid) {
            Some(key) if !self.store.is_stale(self.key_ttl) => key,
            _ => {
                self.refresh_jwks().await?;
                self.store
                    .get(&kid)
                    .ok_or_else(|| AuthError::KeyNotFound(kid.clone()))?
            }
        };

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[self.config.issuer.clone()]);
        validation.set_audience(&[self.config.audience.clone()]);
        validation.leeway = self.config.leeway_seconds.into();

        let token_data = decode::<Value>(token, &key, &validation).map_err(AuthError::from_jwt)?;
        let claims = Claims::try_from(token_data.claims)?;
        debug!(kid, "verified bearer token");
        Ok(claims)
    }

    /// Re-fetches the issuer's key set, replacing the store contents.
    /// Returns the number of keys loaded; zero when no fetcher is wired.
    pub async fn refresh_jwks(&self) -> AuthResult<usize> {
        let fetcher = match &self.jwks {
            Some(fetcher) => fetcher,
            None => return Ok(0),
        };

        let keys = fetcher.fetch().await?;
        let count = keys.len();
        if count > 0 {
            self.store.replace_all(keys);
        }
        Ok(count)
    }
}

pub struct JwtVerifierBuilder {
    config: JwtConfig,
    store: InMemoryKeyStore,
    jwks: Option<JwksFetcher>,
    key_ttl: Duration,
}

impl JwtVerifierBuilder {
    fn new(config: JwtConfig) -> Self {
        Self {
            config,
            store: InMemoryKeyStore::new(),
            jwks: None,
            key_ttl: DEFAULT_KEY_TTL,
        }
    }

    pub fn with_decoding_key(self, kid: impl Into<String>, key: DecodingKey) -> Self {
        self.store.insert_key(kid, key);
        self
    }

    pub fn with_rsa_pem(self, kid: impl Into<String>, pem: &[u8]) -> AuthResult<Self> {
        self.store.insert_rsa_pem(kid, pem)?;
        Ok(self)
    }

    pub fn with_jwks_url(mut self, url: impl Into<String>) -> Self {
        self.jwks = Some(JwksFetcher::new(url));
        self
    }

    pub fn with_jwks_fetcher(mut self, fetcher: JwksFetcher) -> Self {
        self.jwks = Some(fetcher);
        self
    }

    pub fn with_key_ttl(mut self, ttl: Duration) -> Self {
        self.key_ttl = ttl;
        self
    }

    /// Builds without touching the network; keys load lazily on the first
    /// verification that needs them.
    pub fn build(self) -> JwtVerifier {
        JwtVerifier {
            config: self.config,
            store: self.store,
            jwks: self.jwks,
            key_ttl: self.key_ttl,
        }
    }
}
