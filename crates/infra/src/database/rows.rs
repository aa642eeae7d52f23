//! Row-to-domain mappers shared by the repositories.
//!
//! Join queries select sale and device columns in a fixed order; the mappers
//! below read from a starting offset so the same code serves plain and
//! joined listings.

use chrono::{DateTime, NaiveDate, Utc};
use credilock_domain::{
    DeviceStatus, FinancedSale, ManagedDevice, Payment, PaymentFrequency, SaleStatus,
};
use rusqlite::types::Type;
use rusqlite::{Connection, Error as SqlError, Row};

/// Column list for `financed_sales`, in mapper order.
pub(crate) const SALE_COLUMNS: &str =
    "s.id, s.client_id, s.client_name, s.total_amount, s.balance_due, \
     s.frequency, s.sale_date, s.status, s.is_credit, s.tenant_id";
pub(crate) const SALE_COLUMN_COUNT: usize = 10;

/// Column list for `managed_devices`, in mapper order.
pub(crate) const DEVICE_COLUMNS: &str =
    "d.id, d.sale_id, d.device_number, d.imei, d.status, \
     d.last_locked_at, d.last_unlocked_at, d.lock_reason, d.tenant_id";

pub(crate) fn sale_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<FinancedSale> {
    let frequency: String = row.get(offset + 5)?;
    let sale_date: String = row.get(offset + 6)?;
    let status: String = row.get(offset + 7)?;

    Ok(FinancedSale {
        id: row.get(offset)?,
        client_id: row.get(offset + 1)?,
        client_name: row.get(offset + 2)?,
        total_amount: row.get(offset + 3)?,
        balance_due: row.get(offset + 4)?,
        frequency: PaymentFrequency::parse(&frequency),
        sale_date: parse_date(&sale_date, offset + 6)?,
        status: SaleStatus::parse(&status).ok_or_else(|| {
            conversion_error(offset + 7, format!("unknown sale status: {status}"))
        })?,
        is_credit: row.get(offset + 8)?,
        tenant_id: row.get(offset + 9)?,
    })
}

pub(crate) fn device_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<ManagedDevice> {
    let status: String = row.get(offset + 4)?;

    Ok(ManagedDevice {
        id: row.get(offset)?,
        sale_id: row.get(offset + 1)?,
        device_number: row.get(offset + 2)?,
        imei: row.get(offset + 3)?,
        status: DeviceStatus::parse(&status).ok_or_else(|| {
            conversion_error(offset + 4, format!("unknown device status: {status}"))
        })?,
        last_locked_at: epoch_to_datetime(row.get::<_, Option<i64>>(offset + 5)?),
        last_unlocked_at: epoch_to_datetime(row.get::<_, Option<i64>>(offset + 6)?),
        lock_reason: row.get(offset + 7)?,
        tenant_id: row.get(offset + 8)?,
    })
}

/// Payment history for one sale, most recent first.
pub(crate) fn payments_for_sale(conn: &Connection, sale_id: i64) -> rusqlite::Result<Vec<Payment>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, sale_id, amount, paid_at FROM payments WHERE sale_id = ?1 ORDER BY paid_at DESC",
    )?;
    let rows = stmt.query_map([sale_id], |row| {
        let paid_at: String = row.get(3)?;
        Ok(Payment {
            id: row.get(0)?,
            sale_id: row.get(1)?,
            amount: row.get(2)?,
            paid_at: parse_date(&paid_at, 3)?,
        })
    })?;
    rows.collect()
}

fn parse_date(value: &str, column: usize) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| conversion_error(column, format!("invalid date '{value}': {e}")))
}

fn epoch_to_datetime(value: Option<i64>) -> Option<DateTime<Utc>> {
    value.and_then(|secs| DateTime::from_timestamp(secs, 0))
}

fn conversion_error(column: usize, message: String) -> SqlError {
    SqlError::FromSqlConversionFailure(column, Type::Text, message.into())
}
