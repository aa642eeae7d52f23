//! Reconciliation inputs, outcomes and reporting shapes.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::device::ManagedDevice;
use super::sale::{FinancedSale, Payment};

/// Result of the delinquency computation for one sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delinquency {
    /// Whole days past the due date, floored at zero.
    pub days_late: i64,
    pub due_date: NaiveDate,
    pub is_overdue: bool,
}

/// Listing row for the block pass: a delinquency-eligible credit sale with
/// its linked device and payment history (payments ordered date-descending).
#[derive(Debug, Clone)]
pub struct DelinquentSale {
    pub sale: FinancedSale,
    pub device: ManagedDevice,
    pub payments: Vec<Payment>,
}

/// Listing row for the unblock pass: a locked device with its owning sale
/// (if it still exists) and that sale's payment history.
#[derive(Debug, Clone)]
pub struct LockedDeviceCase {
    pub device: ManagedDevice,
    pub sale: Option<FinancedSale>,
    pub payments: Vec<Payment>,
}

/// What happened to one device during a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassAction {
    Blocked,
    AlreadyBlocked,
    BelowThreshold,
    Unblocked,
    LeftLocked,
}

/// Per-device outcome line, one per processed device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionDetail {
    pub device_id: i64,
    pub sale_id: Option<i64>,
    pub client_name: Option<String>,
    pub days_late: Option<i64>,
    pub action: PassAction,
}

/// Per-device (or pass-level) failure recorded without aborting the batch.
///
/// A listing-query failure is reported with both ids absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassError {
    pub device_id: Option<i64>,
    pub sale_id: Option<i64>,
    pub message: String,
}

impl PassError {
    pub fn general(message: impl Into<String>) -> Self {
        Self { device_id: None, sale_id: None, message: message.into() }
    }

    pub fn for_device(device_id: i64, sale_id: Option<i64>, message: impl Into<String>) -> Self {
        Self { device_id: Some(device_id), sale_id, message: message.into() }
    }
}

/// Outcome of one auto-block pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlockSummary {
    pub processed: u64,
    pub blocked: u64,
    pub already_blocked: u64,
    pub errors: Vec<PassError>,
    pub details: Vec<ActionDetail>,
}

/// Outcome of one auto-unblock pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnblockSummary {
    pub processed: u64,
    pub unblocked: u64,
    pub errors: Vec<PassError>,
    pub details: Vec<ActionDetail>,
}

/// Outcome of one full reconciliation cycle (blocks then unblocks).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleSummary {
    pub timestamp: DateTime<Utc>,
    pub days_to_block: i64,
    pub days_to_warn: i64,
    pub blocks: BlockSummary,
    pub unblocks: UnblockSummary,
}

/// Early-warning entry: delinquent but still below the block threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtRiskDevice {
    pub device: ManagedDevice,
    pub sale: FinancedSale,
    pub days_late: i64,
    pub due_date: NaiveDate,
}

/// A sale past its due date, with the current state of its linked device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverdueSale {
    pub sale: FinancedSale,
    pub device: ManagedDevice,
    pub days_late: i64,
    pub due_date: NaiveDate,
}

/// Aggregate device counts per status, plus the at-risk count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceStats {
    pub total: u64,
    pub active: u64,
    pub locked: u64,
    pub wiped: u64,
    pub returned: u64,
    pub lost: u64,
    pub at_risk: u64,
}
