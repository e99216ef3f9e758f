use std::sync::Arc;

use axum::extract::FromRef;
use common_auth::JwtVerifier;
use sqlx::PgPool;

/// Shared application state used by handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub jwt_verifier: Arc<JwtVerifier>,
}

impl AppState {
    pub fn new(db: PgPool, jwt_verifier: Arc<JwtVerifier>) -> Self {
        Self { db, jwt_verifier }
    }
}

impl FromRef<AppState> for Arc<JwtVerifier> {
    fn from_ref(state: &AppState) -> Self {
        state.jwt_verifier.clone()
    }
}
