//! HTTP surface tests: real engine and SQLite store behind the router, with
//! an in-memory gateway standing in for the vendor.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{Days, Utc};
use chrono_tz::Tz;
use credilock_api::{build_router, AppState};
use credilock_core::lockout::ports::{DeviceGateway, DirectoryDevice};
use credilock_core::{local_today, LockoutPolicy, LockoutService};
use credilock_domain::{CredilockError, Result as DomainResult};
use credilock_infra::{
    DbManager, SqliteAuditLog, SqliteDeviceRepository, SqliteSaleRepository,
};
use rusqlite::params;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

const TZ: Tz = chrono_tz::America::Mexico_City;

/// Gateway test double: records calls, optionally fails for one device.
#[derive(Default)]
struct TestGateway {
    locks: Mutex<Vec<String>>,
    unlocks: Mutex<Vec<String>>,
    failing: Mutex<Option<String>>,
}

#[async_trait]
impl DeviceGateway for TestGateway {
    async fn find_device(&self, device_number: &str) -> DomainResult<Option<DirectoryDevice>> {
        Ok(Some(DirectoryDevice {
            device_number: device_number.to_string(),
            name: None,
            locked: false,
        }))
    }

    async fn lock_device(&self, device_number: &str, _reason: &str) -> DomainResult<()> {
        if self.failing.lock().expect("mutex").as_deref() == Some(device_number) {
            return Err(CredilockError::Gateway(format!("vendor down for {device_number}")));
        }
        self.locks.lock().expect("mutex").push(device_number.to_string());
        Ok(())
    }

    async fn unlock_device(&self, device_number: &str) -> DomainResult<()> {
        if self.failing.lock().expect("mutex").as_deref() == Some(device_number) {
            return Err(CredilockError::Gateway(format!("vendor down for {device_number}")));
        }
        self.unlocks.lock().expect("mutex").push(device_number.to_string());
        Ok(())
    }
}

struct TestApp {
    _tmp: TempDir,
    router: Router,
    db: Arc<DbManager>,
    gateway: Arc<TestGateway>,
}

fn test_app() -> TestApp {
    let tmp = TempDir::new().expect("temp dir");
    let db = Arc::new(DbManager::new(tmp.path().join("test.db"), 2).expect("manager"));
    db.run_migrations().expect("migrations");

    let gateway = Arc::new(TestGateway::default());
    let service = Arc::new(LockoutService::new(
        Arc::new(SqliteSaleRepository::new(db.clone())),
        Arc::new(SqliteDeviceRepository::new(db.clone())),
        gateway.clone(),
        Arc::new(SqliteAuditLog::new(db.clone())),
        LockoutPolicy { days_to_block: 2, days_to_warn: 1, tz: TZ },
    ));

    let router = build_router(AppState::new(service, db.clone()));
    TestApp { _tmp: tmp, router, db, gateway }
}

/// Seed one delinquent weekly sale (last payment `days_ago` days back) with
/// an active device.
fn seed_case(db: &DbManager, sale_id: i64, device_id: i64, days_ago: u64) {
    let today = local_today(TZ);
    let paid_at =
        today.checked_sub_days(Days::new(days_ago)).expect("date in range").format("%Y-%m-%d");
    let sale_date =
        today.checked_sub_days(Days::new(days_ago + 60)).expect("date").format("%Y-%m-%d");

    let conn = db.get_connection().expect("connection");
    conn.execute(
        "INSERT INTO financed_sales \
         (id, client_id, client_name, total_amount, balance_due, frequency, sale_date, status, is_credit, tenant_id) \
         VALUES (?1, ?2, ?3, 3000.0, 1200.0, 'weekly', ?4, 'active', 1, 't1')",
        params![sale_id, sale_id, format!("Client {sale_id}"), sale_date.to_string()],
    )
    .expect("sale");
    conn.execute(
        "INSERT INTO payments (sale_id, amount, paid_at) VALUES (?1, 200.0, ?2)",
        params![sale_id, paid_at.to_string()],
    )
    .expect("payment");
    conn.execute(
        "INSERT INTO managed_devices (id, sale_id, device_number, imei, status, tenant_id) \
         VALUES (?1, ?2, ?3, '350000000000000', 'active', 't1')",
        params![device_id, sale_id, format!("DEV-{device_id:04}")],
    )
    .expect("device");
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, value)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn post_empty(uri: &str) -> Request<Body> {
    Request::builder().method("POST").uri(uri).body(Body::empty()).expect("request")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).expect("request")
}

#[tokio::test]
async fn health_reports_ok() {
    let app = test_app();
    let (status, body) = send(&app.router, get("/api/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "ok");
}

#[tokio::test]
async fn cycle_endpoint_runs_both_passes_and_always_returns_200() {
    let app = test_app();
    seed_case(&app.db, 1, 10, 10); // 3 days late -> lock

    let (status, body) = send(&app.router, post_empty("/api/lockout/cycle")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["blocks"]["blocked"], 1);
    assert_eq!(body["blocks"]["errors"], json!([]));
    assert_eq!(body["unblocks"]["unblocked"], 0);
    assert_eq!(app.gateway.locks.lock().expect("mutex").len(), 1);
}

#[tokio::test]
async fn cycle_completes_with_partial_errors_as_200() {
    let app = test_app();
    seed_case(&app.db, 1, 10, 10);
    seed_case(&app.db, 2, 20, 10);
    *app.gateway.failing.lock().expect("mutex") = Some("DEV-0010".into());

    let (status, body) = send(&app.router, post_empty("/api/lockout/blocks")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["blocked"], 1);
    assert_eq!(body["errors"].as_array().expect("errors array").len(), 1);
    assert_eq!(body["errors"][0]["device_id"], 10);
}

#[tokio::test]
async fn blocks_endpoint_accepts_a_tenant_scope() {
    let app = test_app();
    seed_case(&app.db, 1, 10, 10);

    let (status, body) =
        send(&app.router, post_json("/api/lockout/blocks", json!({ "tenant_id": "t9" }))).await;

    assert_eq!(status, StatusCode::OK);
    // Wrong tenant: the listing is empty, nothing blocked.
    assert_eq!(body["processed"], 0);
    assert_eq!(body["blocked"], 0);
}

#[tokio::test]
async fn stats_and_reports_are_tenant_scoped_reads() {
    let app = test_app();
    seed_case(&app.db, 1, 10, 8); // 1 day late -> at risk

    let (status, stats) = send(&app.router, get("/api/lockout/stats?tenant_id=t1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total"], 1);
    assert_eq!(stats["active"], 1);
    assert_eq!(stats["at_risk"], 1);

    let (status, at_risk) = send(&app.router, get("/api/lockout/at-risk")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(at_risk.as_array().expect("array").len(), 1);
    assert_eq!(at_risk[0]["days_late"], 1);

    let (status, overdue) = send(&app.router, get("/api/lockout/overdue")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(overdue.as_array().expect("array").len(), 1);
    assert_eq!(overdue[0]["sale"]["id"], 1);
}

#[tokio::test]
async fn manual_lock_and_unlock_round_trip() {
    let app = test_app();
    seed_case(&app.db, 1, 10, 0); // current, not delinquent

    let (status, device) = send(
        &app.router,
        post_json(
            "/api/devices/1/lock",
            json!({ "reason": "client requested suspension", "actor": "carla" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(device["status"], "locked");
    assert_eq!(device["lock_reason"], "client requested suspension");

    let (status, device) = send(
        &app.router,
        post_json("/api/devices/1/unlock", json!({ "reason": "resolved at branch" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(device["status"], "active");
    assert_eq!(device["lock_reason"], Value::Null);
}

#[tokio::test]
async fn manual_lock_validation_and_lookup_failures_map_to_http_statuses() {
    let app = test_app();
    seed_case(&app.db, 1, 10, 0);

    // Blank reason -> 400.
    let (status, body) =
        send(&app.router, post_json("/api/devices/1/lock", json!({ "reason": "  " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "InvalidInput");

    // Unknown sale -> 404.
    let (status, body) =
        send(&app.router, post_json("/api/devices/999/lock", json!({ "reason": "x" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["type"], "NotFound");
}

#[tokio::test]
async fn manual_lock_gateway_failure_is_a_bad_gateway() {
    let app = test_app();
    seed_case(&app.db, 1, 10, 0);
    *app.gateway.failing.lock().expect("mutex") = Some("DEV-0010".into());

    let (status, body) =
        send(&app.router, post_json("/api/devices/1/lock", json!({ "reason": "x" }))).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["type"], "Gateway");
}
