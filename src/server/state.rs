//! Application state shared across handlers.

use crate::auth::AuthService;
use crate::catalog::CatalogService;
use crate::config::Config;
use crate::db::Database;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Authentication service.
    pub auth: Arc<AuthService>,
    /// Book and review operations.
    pub catalog: Arc<CatalogService>,
}

impl AppState {
    /// Create application state, wiring the services to one database.
    pub fn new(config: &Config, db: Database) -> Self {
        let auth = AuthService::new(
            db.clone(),
            config.auth.session_days,
            config.auth.registration_enabled(),
            config.auth.min_password_length,
        );
        let catalog = CatalogService::new(db, &config.listing);

        Self {
            auth: Arc::new(auth),
            catalog: Arc::new(catalog),
        }
    }
}
