//! SQLite-backed managed device repository.
//!
//! Owns every status transition the engine persists, including the fresh
//! status read used as the guard immediately before a gateway call.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use credilock_core::lockout::ports::DeviceRepository as DeviceRepositoryPort;
use credilock_domain::{
    CredilockError, DeviceStats, DeviceStatus, LockedDeviceCase, ManagedDevice,
    Result as DomainResult,
};
use rusqlite::params;
use tokio::task;

use super::manager::{map_sql_error, DbManager};
use super::rows::{
    device_from_row, payments_for_sale, sale_from_row, DEVICE_COLUMNS, SALE_COLUMNS,
};
use super::sale_repository::map_join_error;

// Device columns come first in the locked-case join, so the sale mapper
// starts after them.
const DEVICE_COLUMN_COUNT: usize = 9;

pub struct SqliteDeviceRepository {
    db: Arc<DbManager>,
}

impl SqliteDeviceRepository {
    /// Construct a repository backed by the shared database manager.
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DeviceRepositoryPort for SqliteDeviceRepository {
    async fn find_locked_cases(&self, tenant: Option<&str>) -> DomainResult<Vec<LockedDeviceCase>> {
        let db = Arc::clone(&self.db);
        let tenant = tenant.map(str::to_owned);

        task::spawn_blocking(move || -> DomainResult<Vec<LockedDeviceCase>> {
            let conn = db.get_connection()?;

            // Left join: a device whose sale was deleted must still be
            // listed, so the engine can unlock it unconditionally.
            let sql = format!(
                "SELECT {DEVICE_COLUMNS}, {SALE_COLUMNS} \
                 FROM managed_devices d \
                 LEFT JOIN financed_sales s ON s.id = d.sale_id \
                 WHERE d.status = 'locked' \
                   AND (?1 IS NULL OR d.tenant_id = ?1) \
                 ORDER BY d.id"
            );

            let mut stmt = conn.prepare_cached(&sql).map_err(map_sql_error)?;
            let pairs = stmt
                .query_map([&tenant], |row| {
                    let device = device_from_row(row, 0)?;
                    // The sale side of the left join may be all NULLs.
                    let sale_id: Option<i64> = row.get(DEVICE_COLUMN_COUNT)?;
                    let sale = match sale_id {
                        Some(_) => Some(sale_from_row(row, DEVICE_COLUMN_COUNT)?),
                        None => None,
                    };
                    Ok((device, sale))
                })
                .map_err(map_sql_error)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(map_sql_error)?;

            pairs
                .into_iter()
                .map(|(device, sale)| {
                    let payments = match &sale {
                        Some(sale) => {
                            payments_for_sale(&conn, sale.id).map_err(map_sql_error)?
                        }
                        None => Vec::new(),
                    };
                    Ok(LockedDeviceCase { device, sale, payments })
                })
                .collect()
        })
        .await
        .map_err(map_join_error)?
    }

    async fn find_by_sale(
        &self,
        sale_id: i64,
        tenant: Option<&str>,
    ) -> DomainResult<Option<ManagedDevice>> {
        let db = Arc::clone(&self.db);
        let tenant = tenant.map(str::to_owned);

        task::spawn_blocking(move || -> DomainResult<Option<ManagedDevice>> {
            let conn = db.get_connection()?;
            let sql = format!(
                "SELECT {DEVICE_COLUMNS} FROM managed_devices d \
                 WHERE d.sale_id = ?1 AND (?2 IS NULL OR d.tenant_id = ?2)"
            );
            let mut stmt = conn.prepare_cached(&sql).map_err(map_sql_error)?;

            let mut rows = stmt
                .query_map(params![sale_id, tenant], |row| device_from_row(row, 0))
                .map_err(map_sql_error)?;
            rows.next().transpose().map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn current_status(&self, device_id: i64) -> DomainResult<DeviceStatus> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<DeviceStatus> {
            let conn = db.get_connection()?;
            let status: String = conn
                .query_row(
                    "SELECT status FROM managed_devices WHERE id = ?1",
                    [device_id],
                    |row| row.get(0),
                )
                .map_err(|err| match err {
                    rusqlite::Error::QueryReturnedNoRows => {
                        CredilockError::NotFound(format!("device {device_id} does not exist"))
                    }
                    other => map_sql_error(other),
                })?;

            DeviceStatus::parse(&status).ok_or_else(|| {
                CredilockError::Database(format!("unknown device status: {status}"))
            })
        })
        .await
        .map_err(map_join_error)?
    }

    async fn mark_locked(
        &self,
        device_id: i64,
        reason: &str,
        at: DateTime<Utc>,
    ) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let reason = reason.to_owned();

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            let updated = conn
                .execute(
                    "UPDATE managed_devices \
                     SET status = 'locked', last_locked_at = ?1, lock_reason = ?2 \
                     WHERE id = ?3",
                    params![at.timestamp(), reason, device_id],
                )
                .map_err(map_sql_error)?;

            if updated == 0 {
                return Err(CredilockError::NotFound(format!(
                    "device {device_id} does not exist"
                )));
            }
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn mark_unlocked(&self, device_id: i64, at: DateTime<Utc>) -> DomainResult<()> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            let updated = conn
                .execute(
                    "UPDATE managed_devices \
                     SET status = 'active', last_unlocked_at = ?1, lock_reason = NULL \
                     WHERE id = ?2",
                    params![at.timestamp(), device_id],
                )
                .map_err(map_sql_error)?;

            if updated == 0 {
                return Err(CredilockError::NotFound(format!(
                    "device {device_id} does not exist"
                )));
            }
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn status_counts(&self, tenant: Option<&str>) -> DomainResult<DeviceStats> {
        let db = Arc::clone(&self.db);
        let tenant = tenant.map(str::to_owned);

        task::spawn_blocking(move || -> DomainResult<DeviceStats> {
            let conn = db.get_connection()?;
            let mut stmt = conn
                .prepare_cached(
                    "SELECT status, COUNT(*) FROM managed_devices \
                     WHERE (?1 IS NULL OR tenant_id = ?1) \
                     GROUP BY status",
                )
                .map_err(map_sql_error)?;

            let rows = stmt
                .query_map([&tenant], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, u64>(1)?))
                })
                .map_err(map_sql_error)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(map_sql_error)?;

            let mut stats = DeviceStats::default();
            for (status, count) in rows {
                stats.total += count;
                match DeviceStatus::parse(&status) {
                    Some(DeviceStatus::Active) => stats.active += count,
                    Some(DeviceStatus::Locked) => stats.locked += count,
                    Some(DeviceStatus::Wiped) => stats.wiped += count,
                    Some(DeviceStatus::Returned) => stats.returned += count,
                    Some(DeviceStatus::Lost) => stats.lost += count,
                    None => {
                        return Err(CredilockError::Database(format!(
                            "unknown device status: {status}"
                        )))
                    }
                }
            }
            Ok(stats)
        })
        .await
        .map_err(map_join_error)?
    }
}
