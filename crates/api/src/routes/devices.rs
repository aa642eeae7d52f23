//! Manual per-device overrides.
//!
//! Bypass the delinquency computation: validate, call the gateway, update
//! device state and the audit log exactly like the automatic path.

use axum::extract::{Path, State};
use axum::Json;
use credilock_domain::{AuditActor, ManagedDevice};
use serde::Deserialize;

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct OverrideRequest {
    pub reason: String,
    /// Operator name; absent means the API credential itself acted.
    pub actor: Option<String>,
    pub tenant_id: Option<String>,
}

impl OverrideRequest {
    fn actor(&self) -> AuditActor {
        match &self.actor {
            Some(name) => AuditActor::User(name.clone()),
            None => AuditActor::System,
        }
    }
}

pub async fn lock(
    State(state): State<AppState>,
    Path(sale_id): Path<i64>,
    Json(request): Json<OverrideRequest>,
) -> ApiResult<Json<ManagedDevice>> {
    let device = state
        .service
        .lock_for_sale(sale_id, &request.reason, request.actor(), request.tenant_id.as_deref())
        .await?;
    Ok(Json(device))
}

pub async fn unlock(
    State(state): State<AppState>,
    Path(sale_id): Path<i64>,
    Json(request): Json<OverrideRequest>,
) -> ApiResult<Json<ManagedDevice>> {
    let device = state
        .service
        .unlock_for_sale(sale_id, &request.reason, request.actor(), request.tenant_id.as_deref())
        .await?;
    Ok(Json(device))
}
