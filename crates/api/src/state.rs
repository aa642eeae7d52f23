//! Shared application state for the HTTP layer.

use std::sync::Arc;

use credilock_core::LockoutService;
use credilock_infra::DbManager;

/// Handed to every handler via axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<LockoutService>,
    pub db: Arc<DbManager>,
}

impl AppState {
    pub fn new(service: Arc<LockoutService>, db: Arc<DbManager>) -> Self {
        Self { service, db }
    }
}
