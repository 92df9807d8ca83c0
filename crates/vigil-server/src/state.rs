use std::sync::Arc;

use vigil_auth::{JwtKeys, password};
use vigil_storage::Database;

use crate::config::Config;

/// Shared application state, injected into all route handlers via Axum state.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub jwt: Arc<JwtKeys>,
    pub config: Arc<Config>,
    /// Verified against when a login names no known user.
    pub decoy_hash: Arc<str>,
}

impl AppState {
    pub fn new(config: Config, db: Database) -> Self {
        let jwt = JwtKeys::with_expiry_check(&config.jwt_secret, config.jwt_verify_exp);
        let decoy_hash = password::decoy_hash(config.password_hash_iterations).into();
        Self {
            db,
            jwt: Arc::new(jwt),
            decoy_hash,
            config: Arc::new(config),
        }
    }
}
