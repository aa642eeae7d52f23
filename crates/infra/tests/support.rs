//! Shared fixtures for infra integration tests.

use std::sync::Arc;

use chrono::NaiveDate;
use credilock_infra::DbManager;
use rusqlite::params;
use tempfile::TempDir;

/// Fresh migrated database in a temp directory. Keep the `TempDir` alive for
/// the duration of the test.
pub fn manager() -> (TempDir, Arc<DbManager>) {
    let temp_dir = TempDir::new().expect("temp dir created");
    let db_path = temp_dir.path().join("credilock.db");
    let manager = DbManager::new(&db_path, 4).expect("manager created");
    manager.run_migrations().expect("migrations run");
    (temp_dir, Arc::new(manager))
}

#[allow(clippy::too_many_arguments)]
pub fn seed_sale(
    db: &DbManager,
    id: i64,
    client_name: &str,
    balance_due: f64,
    frequency: &str,
    sale_date: NaiveDate,
    status: &str,
    is_credit: bool,
    tenant: &str,
) {
    let conn = db.get_connection().expect("connection");
    conn.execute(
        "INSERT INTO financed_sales \
         (id, client_id, client_name, total_amount, balance_due, frequency, sale_date, status, is_credit, tenant_id) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            id,
            id * 100,
            client_name,
            balance_due + 1000.0,
            balance_due,
            frequency,
            sale_date.format("%Y-%m-%d").to_string(),
            status,
            is_credit,
            tenant,
        ],
    )
    .expect("sale inserted");
}

pub fn seed_payment(db: &DbManager, id: i64, sale_id: i64, paid_at: NaiveDate) {
    let conn = db.get_connection().expect("connection");
    conn.execute(
        "INSERT INTO payments (id, sale_id, amount, paid_at) VALUES (?1, ?2, ?3, ?4)",
        params![id, sale_id, 250.0, paid_at.format("%Y-%m-%d").to_string()],
    )
    .expect("payment inserted");
}

pub fn seed_device(db: &DbManager, id: i64, sale_id: i64, status: &str, tenant: &str) {
    let conn = db.get_connection().expect("connection");
    conn.execute(
        "INSERT INTO managed_devices \
         (id, sale_id, device_number, imei, status, tenant_id) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![id, sale_id, format!("DEV-{id:04}"), format!("4901542032{id:05}"), status, tenant],
    )
    .expect("device inserted");
}

pub fn device_status(db: &DbManager, device_id: i64) -> String {
    let conn = db.get_connection().expect("connection");
    conn.query_row(
        "SELECT status FROM managed_devices WHERE id = ?1",
        params![device_id],
        |row| row.get(0),
    )
    .expect("device present")
}

pub fn audit_rows(db: &DbManager) -> Vec<(String, String, String)> {
    let conn = db.get_connection().expect("connection");
    let mut stmt = conn
        .prepare("SELECT actor, action, details FROM audit_log ORDER BY id")
        .expect("statement");
    let rows = stmt
        .query_map(params![], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
        .expect("query");
    rows.collect::<rusqlite::Result<Vec<_>>>().expect("rows")
}
