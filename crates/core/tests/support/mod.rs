//! Mock port implementations for testing
//!
//! Provides in-memory mocks for the lockout ports, enabling deterministic
//! engine tests without database or network dependencies.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use credilock_core::lockout::ports::{
    AuditLog, DeviceGateway, DeviceRepository, DirectoryDevice, SaleRepository,
};
use credilock_domain::{
    AuditEvent, CredilockError, DelinquentSale, DeviceStats, DeviceStatus, FinancedSale,
    LockedDeviceCase, ManagedDevice, Payment, PaymentFrequency, Result as DomainResult,
    SaleStatus,
};

/// In-memory mock for `SaleRepository`.
#[derive(Default)]
pub struct MockSaleRepository {
    candidates: Mutex<Vec<DelinquentSale>>,
    fail_listing: AtomicBool,
}

impl MockSaleRepository {
    pub fn new(candidates: Vec<DelinquentSale>) -> Self {
        Self { candidates: Mutex::new(candidates), fail_listing: AtomicBool::new(false) }
    }

    /// Make the next listing queries fail, simulating a data-store outage.
    pub fn fail_listing(&self) {
        self.fail_listing.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl SaleRepository for MockSaleRepository {
    async fn find_delinquency_candidates(
        &self,
        tenant: Option<&str>,
    ) -> DomainResult<Vec<DelinquentSale>> {
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(CredilockError::Database("listing query failed".into()));
        }
        let candidates = self.candidates.lock().expect("sale mock poisoned");
        Ok(candidates
            .iter()
            .filter(|c| tenant.is_none_or(|t| c.sale.tenant_id == t))
            .cloned()
            .collect())
    }

    async fn find_sale(&self, sale_id: i64) -> DomainResult<Option<FinancedSale>> {
        let candidates = self.candidates.lock().expect("sale mock poisoned");
        Ok(candidates.iter().find(|c| c.sale.id == sale_id).map(|c| c.sale.clone()))
    }
}

struct DeviceRecord {
    device: ManagedDevice,
    sale: Option<FinancedSale>,
    payments: Vec<Payment>,
}

/// In-memory mock for `DeviceRepository` holding live device state, so the
/// engine's guard reads observe the transitions it applied earlier in the
/// same test.
#[derive(Default)]
pub struct MockDeviceRepository {
    records: Mutex<HashMap<i64, DeviceRecord>>,
}

impl MockDeviceRepository {
    pub fn insert(&self, device: ManagedDevice, sale: Option<FinancedSale>, payments: Vec<Payment>) {
        let mut records = self.records.lock().expect("device mock poisoned");
        records.insert(device.id, DeviceRecord { device, sale, payments });
    }

    pub fn device(&self, device_id: i64) -> ManagedDevice {
        let records = self.records.lock().expect("device mock poisoned");
        records.get(&device_id).map(|r| r.device.clone()).expect("device not seeded")
    }
}

#[async_trait]
impl DeviceRepository for MockDeviceRepository {
    async fn find_locked_cases(&self, tenant: Option<&str>) -> DomainResult<Vec<LockedDeviceCase>> {
        let records = self.records.lock().expect("device mock poisoned");
        Ok(records
            .values()
            .filter(|r| r.device.status == DeviceStatus::Locked)
            .filter(|r| tenant.is_none_or(|t| r.device.tenant_id == t))
            .map(|r| LockedDeviceCase {
                device: r.device.clone(),
                sale: r.sale.clone(),
                payments: r.payments.clone(),
            })
            .collect())
    }

    async fn find_by_sale(
        &self,
        sale_id: i64,
        tenant: Option<&str>,
    ) -> DomainResult<Option<ManagedDevice>> {
        let records = self.records.lock().expect("device mock poisoned");
        Ok(records
            .values()
            .filter(|r| tenant.is_none_or(|t| r.device.tenant_id == t))
            .find(|r| r.device.sale_id == sale_id)
            .map(|r| r.device.clone()))
    }

    async fn current_status(&self, device_id: i64) -> DomainResult<DeviceStatus> {
        let records = self.records.lock().expect("device mock poisoned");
        records
            .get(&device_id)
            .map(|r| r.device.status)
            .ok_or_else(|| CredilockError::NotFound(format!("device {device_id}")))
    }

    async fn mark_locked(
        &self,
        device_id: i64,
        reason: &str,
        at: DateTime<Utc>,
    ) -> DomainResult<()> {
        let mut records = self.records.lock().expect("device mock poisoned");
        let record = records
            .get_mut(&device_id)
            .ok_or_else(|| CredilockError::NotFound(format!("device {device_id}")))?;
        record.device.status = DeviceStatus::Locked;
        record.device.last_locked_at = Some(at);
        record.device.lock_reason = Some(reason.to_string());
        Ok(())
    }

    async fn mark_unlocked(&self, device_id: i64, at: DateTime<Utc>) -> DomainResult<()> {
        let mut records = self.records.lock().expect("device mock poisoned");
        let record = records
            .get_mut(&device_id)
            .ok_or_else(|| CredilockError::NotFound(format!("device {device_id}")))?;
        record.device.status = DeviceStatus::Active;
        record.device.last_unlocked_at = Some(at);
        record.device.lock_reason = None;
        Ok(())
    }

    async fn status_counts(&self, tenant: Option<&str>) -> DomainResult<DeviceStats> {
        let records = self.records.lock().expect("device mock poisoned");
        let mut stats = DeviceStats::default();
        for r in records.values() {
            if tenant.is_some_and(|t| r.device.tenant_id != t) {
                continue;
            }
            stats.total += 1;
            match r.device.status {
                DeviceStatus::Active => stats.active += 1,
                DeviceStatus::Locked => stats.locked += 1,
                DeviceStatus::Wiped => stats.wiped += 1,
                DeviceStatus::Returned => stats.returned += 1,
                DeviceStatus::Lost => stats.lost += 1,
            }
        }
        Ok(stats)
    }
}

/// Mock gateway that records every call and can be told to fail for
/// specific device numbers.
#[derive(Default)]
pub struct MockDeviceGateway {
    pub locks: Mutex<Vec<(String, String)>>,
    pub unlocks: Mutex<Vec<String>>,
    failing: Mutex<Vec<String>>,
}

impl MockDeviceGateway {
    pub fn fail_for(&self, device_number: &str) {
        self.failing.lock().expect("gateway mock poisoned").push(device_number.to_string());
    }

    pub fn lock_calls(&self) -> Vec<(String, String)> {
        self.locks.lock().expect("gateway mock poisoned").clone()
    }

    pub fn unlock_calls(&self) -> Vec<String> {
        self.unlocks.lock().expect("gateway mock poisoned").clone()
    }

    fn check(&self, device_number: &str) -> DomainResult<()> {
        let failing = self.failing.lock().expect("gateway mock poisoned");
        if failing.iter().any(|d| d == device_number) {
            return Err(CredilockError::Gateway(format!("vendor rejected device {device_number}")));
        }
        Ok(())
    }
}

#[async_trait]
impl DeviceGateway for MockDeviceGateway {
    async fn find_device(&self, device_number: &str) -> DomainResult<Option<DirectoryDevice>> {
        self.check(device_number)?;
        Ok(Some(DirectoryDevice {
            device_number: device_number.to_string(),
            name: None,
            locked: false,
        }))
    }

    async fn lock_device(&self, device_number: &str, reason: &str) -> DomainResult<()> {
        self.check(device_number)?;
        self.locks
            .lock()
            .expect("gateway mock poisoned")
            .push((device_number.to_string(), reason.to_string()));
        Ok(())
    }

    async fn unlock_device(&self, device_number: &str) -> DomainResult<()> {
        self.check(device_number)?;
        self.unlocks.lock().expect("gateway mock poisoned").push(device_number.to_string());
        Ok(())
    }
}

/// Append-only in-memory audit log.
#[derive(Default)]
pub struct MockAuditLog {
    events: Mutex<Vec<AuditEvent>>,
}

impl MockAuditLog {
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().expect("audit mock poisoned").clone()
    }
}

#[async_trait]
impl AuditLog for MockAuditLog {
    async fn record(&self, event: AuditEvent) -> DomainResult<()> {
        self.events.lock().expect("audit mock poisoned").push(event);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Fixture builders
// ---------------------------------------------------------------------------

pub fn sale(id: i64, frequency: PaymentFrequency, sale_date: NaiveDate) -> FinancedSale {
    FinancedSale {
        id,
        client_id: id * 10,
        client_name: format!("Client {id}"),
        total_amount: 5000.0,
        balance_due: 2000.0,
        frequency,
        sale_date,
        status: SaleStatus::Active,
        is_credit: true,
        tenant_id: "t1".into(),
    }
}

pub fn device(id: i64, sale_id: i64, status: DeviceStatus) -> ManagedDevice {
    ManagedDevice {
        id,
        sale_id,
        device_number: format!("DEV-{id:04}"),
        imei: format!("35831005198264{id}"),
        status,
        last_locked_at: None,
        last_unlocked_at: None,
        lock_reason: None,
        tenant_id: "t1".into(),
    }
}

pub fn payment(id: i64, sale_id: i64, paid_at: NaiveDate) -> Payment {
    Payment { id, sale_id, amount: 200.0, paid_at }
}
