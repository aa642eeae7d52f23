//! Port interfaces for the lockout reconciliation engine.
//!
//! These traits define the boundaries between core business logic
//! and infrastructure implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use credilock_domain::{
    AuditEvent, DelinquentSale, DeviceStats, DeviceStatus, FinancedSale, LockedDeviceCase,
    ManagedDevice, Result,
};

/// Device record as known by the external device-management backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryDevice {
    pub device_number: String,
    pub name: Option<String>,
    pub locked: bool,
}

/// Trait for the external device-management backend.
///
/// Action calls are idempotent from the caller's perspective: locking a
/// device the vendor already considers locked succeeds or is a no-op.
/// Failures surface as `CredilockError::Gateway` so a pass can catch them
/// per device without aborting the batch.
#[async_trait]
pub trait DeviceGateway: Send + Sync {
    /// Look up a device by its directory identifier.
    async fn find_device(&self, device_number: &str) -> Result<Option<DirectoryDevice>>;

    /// Remotely lock a device, recording the reason with the vendor.
    async fn lock_device(&self, device_number: &str, reason: &str) -> Result<()>;

    /// Remotely unlock a device.
    async fn unlock_device(&self, device_number: &str) -> Result<()>;
}

/// Read access to financed sales and their payment history.
#[async_trait]
pub trait SaleRepository: Send + Sync {
    /// Credit sales with an outstanding balance and not paid off, inner-joined
    /// with their linked device (sales without a device are excluded) and
    /// payment history ordered date-descending.
    async fn find_delinquency_candidates(
        &self,
        tenant: Option<&str>,
    ) -> Result<Vec<DelinquentSale>>;

    /// Look up a single sale by id.
    async fn find_sale(&self, sale_id: i64) -> Result<Option<FinancedSale>>;
}

/// Managed-device persistence. Status transitions go through here and
/// nowhere else.
#[async_trait]
pub trait DeviceRepository: Send + Sync {
    /// All locked devices with their owning sale (if it still exists) and
    /// that sale's payment history.
    async fn find_locked_cases(&self, tenant: Option<&str>) -> Result<Vec<LockedDeviceCase>>;

    /// The device linked to a sale, scoped to the tenant filter.
    async fn find_by_sale(
        &self,
        sale_id: i64,
        tenant: Option<&str>,
    ) -> Result<Option<ManagedDevice>>;

    /// Fresh status read. The engine calls this immediately before every
    /// gateway action so a racing cycle's transition is observed instead of
    /// a stale batch-listing row.
    async fn current_status(&self, device_id: i64) -> Result<DeviceStatus>;

    /// Persist the `Active → Locked` transition.
    async fn mark_locked(&self, device_id: i64, reason: &str, at: DateTime<Utc>) -> Result<()>;

    /// Persist the `Locked → Active` transition, clearing the lock reason.
    async fn mark_unlocked(&self, device_id: i64, at: DateTime<Utc>) -> Result<()>;

    /// Device counts per status. The `at_risk` field is left at zero; the
    /// engine fills it from the delinquency listing.
    async fn status_counts(&self, tenant: Option<&str>) -> Result<DeviceStats>;
}

/// Append-only audit log. Entries are never mutated or deleted by the core.
#[async_trait]
pub trait AuditLog: Send + Sync {
    async fn record(&self, event: AuditEvent) -> Result<()>;
}
