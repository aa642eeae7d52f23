//! Route registration.

mod devices;
mod health;
mod lockout;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Assemble the full application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health::health))
        .route("/api/lockout/cycle", post(lockout::run_cycle))
        .route("/api/lockout/blocks", post(lockout::run_blocks))
        .route("/api/lockout/unblocks", post(lockout::run_unblocks))
        .route("/api/lockout/stats", get(lockout::stats))
        .route("/api/lockout/at-risk", get(lockout::at_risk))
        .route("/api/lockout/overdue", get(lockout::overdue))
        .route("/api/devices/{sale_id}/lock", post(devices::lock))
        .route("/api/devices/{sale_id}/unlock", post(devices::unlock))
        .with_state(state)
}
