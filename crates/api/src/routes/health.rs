//! Liveness endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use credilock_domain::CredilockError;
use serde_json::{json, Value};

use crate::error::ApiResult;
use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let db = Arc::clone(&state.db);
    tokio::task::spawn_blocking(move || db.health_check())
        .await
        .map_err(|e| CredilockError::Internal(format!("health check task failed: {e}")))??;

    Ok(Json(json!({ "status": "ok", "database": "ok" })))
}
