//! Reconciliation triggers and read endpoints.
//!
//! Pass and cycle triggers always answer 200 with counts plus an errors
//! array: a cycle "completes with partial errors", it does not fail as a
//! whole. Only the manual override endpoints surface per-request failures.

use axum::extract::{Query, State};
use axum::Json;
use credilock_domain::{
    AtRiskDevice, BlockSummary, CycleSummary, DeviceStats, OverdueSale, UnblockSummary,
};
use serde::Deserialize;

use crate::error::ApiResult;
use crate::state::AppState;

/// Optional tenant scope, accepted in the body of trigger requests.
#[derive(Debug, Default, Deserialize)]
pub struct TenantScope {
    pub tenant_id: Option<String>,
}

/// Optional tenant scope as a query parameter on read endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct TenantQuery {
    pub tenant_id: Option<String>,
}

pub async fn run_cycle(
    State(state): State<AppState>,
    body: Option<Json<TenantScope>>,
) -> Json<CycleSummary> {
    let scope = body.map(|Json(scope)| scope).unwrap_or_default();
    let summary = state.service.run_full_cycle(scope.tenant_id.as_deref()).await;
    Json(summary)
}

pub async fn run_blocks(
    State(state): State<AppState>,
    body: Option<Json<TenantScope>>,
) -> Json<BlockSummary> {
    let scope = body.map(|Json(scope)| scope).unwrap_or_default();
    let summary = state.service.process_auto_blocks(scope.tenant_id.as_deref()).await;
    Json(summary)
}

pub async fn run_unblocks(
    State(state): State<AppState>,
    body: Option<Json<TenantScope>>,
) -> Json<UnblockSummary> {
    let scope = body.map(|Json(scope)| scope).unwrap_or_default();
    let summary = state.service.process_auto_unblocks(scope.tenant_id.as_deref()).await;
    Json(summary)
}

pub async fn stats(
    State(state): State<AppState>,
    Query(query): Query<TenantQuery>,
) -> ApiResult<Json<DeviceStats>> {
    let stats = state.service.stats(query.tenant_id.as_deref()).await?;
    Ok(Json(stats))
}

pub async fn at_risk(
    State(state): State<AppState>,
    Query(query): Query<TenantQuery>,
) -> ApiResult<Json<Vec<AtRiskDevice>>> {
    let report = state.service.at_risk_devices(query.tenant_id.as_deref()).await?;
    Ok(Json(report))
}

pub async fn overdue(
    State(state): State<AppState>,
    Query(query): Query<TenantQuery>,
) -> ApiResult<Json<Vec<OverdueSale>>> {
    let report = state.service.overdue_sales(query.tenant_id.as_deref()).await?;
    Ok(Json(report))
}
