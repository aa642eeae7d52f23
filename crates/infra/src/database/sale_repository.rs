//! SQLite-backed financed sale repository.

use std::sync::Arc;

use async_trait::async_trait;
use credilock_core::lockout::ports::SaleRepository as SaleRepositoryPort;
use credilock_domain::{CredilockError, DelinquentSale, FinancedSale, Result as DomainResult};
use tokio::task;

use super::manager::{map_sql_error, DbManager};
use super::rows::{
    device_from_row, payments_for_sale, sale_from_row, DEVICE_COLUMNS, SALE_COLUMNS,
    SALE_COLUMN_COUNT,
};

/// Read access to financed sales, their linked device and payment history.
pub struct SqliteSaleRepository {
    db: Arc<DbManager>,
}

impl SqliteSaleRepository {
    /// Construct a repository backed by the shared database manager.
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SaleRepositoryPort for SqliteSaleRepository {
    async fn find_delinquency_candidates(
        &self,
        tenant: Option<&str>,
    ) -> DomainResult<Vec<DelinquentSale>> {
        let db = Arc::clone(&self.db);
        let tenant = tenant.map(str::to_owned);

        task::spawn_blocking(move || -> DomainResult<Vec<DelinquentSale>> {
            let conn = db.get_connection()?;

            // Inner join: sales without a linked device are excluded.
            let sql = format!(
                "SELECT {SALE_COLUMNS}, {DEVICE_COLUMNS} \
                 FROM financed_sales s \
                 INNER JOIN managed_devices d ON d.sale_id = s.id \
                 WHERE s.is_credit = 1 \
                   AND s.balance_due > 0 \
                   AND s.status != 'paid_off' \
                   AND (?1 IS NULL OR s.tenant_id = ?1) \
                 ORDER BY s.id"
            );

            let mut stmt = conn.prepare_cached(&sql).map_err(map_sql_error)?;
            let pairs = stmt
                .query_map([&tenant], |row| {
                    let sale = sale_from_row(row, 0)?;
                    let device = device_from_row(row, SALE_COLUMN_COUNT)?;
                    Ok((sale, device))
                })
                .map_err(map_sql_error)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(map_sql_error)?;

            pairs
                .into_iter()
                .map(|(sale, device)| {
                    let payments = payments_for_sale(&conn, sale.id).map_err(map_sql_error)?;
                    Ok(DelinquentSale { sale, device, payments })
                })
                .collect()
        })
        .await
        .map_err(map_join_error)?
    }

    async fn find_sale(&self, sale_id: i64) -> DomainResult<Option<FinancedSale>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<Option<FinancedSale>> {
            let conn = db.get_connection()?;
            let sql = format!("SELECT {SALE_COLUMNS} FROM financed_sales s WHERE s.id = ?1");
            let mut stmt = conn.prepare_cached(&sql).map_err(map_sql_error)?;

            let mut rows = stmt
                .query_map([sale_id], |row| sale_from_row(row, 0))
                .map_err(map_sql_error)?;
            rows.next().transpose().map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }
}

pub(crate) fn map_join_error(err: task::JoinError) -> CredilockError {
    CredilockError::Internal(format!("database task failed: {err}"))
}
