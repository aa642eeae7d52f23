//! Lockout reconciliation service - core business logic.
//!
//! Orchestrates one reconciliation cycle: list the eligible sales/devices,
//! apply the delinquency calculator, decide lock/unlock actions against the
//! device state machine, invoke the directory gateway and record outcomes.
//!
//! Devices are processed strictly one at a time within a pass. Concurrent
//! cycle triggers are tolerated without locking: every transition re-reads
//! the device status immediately before the external call, so a racing
//! duplicate degrades to a local no-op.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use credilock_domain::{
    ActionDetail, AtRiskDevice, AuditAction, AuditActor, AuditEvent, BlockSummary,
    CredilockError, CycleSummary, Delinquency, DelinquentSale, DeviceStats, DeviceStatus,
    LockedDeviceCase, LockoutConfig, ManagedDevice, OverdueSale, PassAction, PassError, Result,
    UnblockSummary,
};
use tracing::{debug, error, info, warn};

use super::ports::{AuditLog, DeviceGateway, DeviceRepository, SaleRepository};
use crate::delinquency::{delinquency, local_today};

/// Resolved runtime policy for the engine.
#[derive(Debug, Clone, Copy)]
pub struct LockoutPolicy {
    pub days_to_block: i64,
    pub days_to_warn: i64,
    pub tz: Tz,
}

impl LockoutPolicy {
    /// Resolve the configured thresholds and timezone.
    pub fn from_config(config: &LockoutConfig) -> Result<Self> {
        Ok(Self {
            days_to_block: config.days_to_block,
            days_to_warn: config.days_to_warn,
            tz: config.tz()?,
        })
    }
}

/// Outcome of a single guarded transition attempt.
enum TransitionOutcome {
    Done,
    /// The fresh status read found the transition already applied (or the
    /// device gone terminal); nothing was sent to the vendor.
    Superseded(DeviceStatus),
}

/// Lockout reconciliation engine.
///
/// All dependencies are injected at construction time; the service holds no
/// mutable state of its own.
pub struct LockoutService {
    sales: Arc<dyn SaleRepository>,
    devices: Arc<dyn DeviceRepository>,
    gateway: Arc<dyn DeviceGateway>,
    audit: Arc<dyn AuditLog>,
    policy: LockoutPolicy,
}

impl LockoutService {
    pub fn new(
        sales: Arc<dyn SaleRepository>,
        devices: Arc<dyn DeviceRepository>,
        gateway: Arc<dyn DeviceGateway>,
        audit: Arc<dyn AuditLog>,
        policy: LockoutPolicy,
    ) -> Self {
        Self { sales, devices, gateway, audit, policy }
    }

    pub fn policy(&self) -> &LockoutPolicy {
        &self.policy
    }

    /// Lock the devices of sales that crossed the block threshold.
    ///
    /// Never fails as a whole: a listing-query failure is reported as a
    /// single general error with zero counts, and per-device failures are
    /// collected while the batch continues.
    pub async fn process_auto_blocks(&self, tenant: Option<&str>) -> BlockSummary {
        let mut summary = BlockSummary::default();

        let candidates = match self.sales.find_delinquency_candidates(tenant).await {
            Ok(candidates) => candidates,
            Err(err) => {
                error!(error = %err, "auto-block listing query failed");
                summary.errors.push(PassError::general(err.to_string()));
                return summary;
            }
        };

        let today = local_today(self.policy.tz);
        info!(candidates = candidates.len(), ?tenant, "starting auto-block pass");

        for case in &candidates {
            summary.processed += 1;

            if case.device.status.is_terminal() {
                debug!(device_id = case.device.id, status = case.device.status.as_str(), "skipping terminal device");
                continue;
            }

            if case.device.status == DeviceStatus::Locked {
                summary.already_blocked += 1;
                summary.details.push(detail(case, None, PassAction::AlreadyBlocked));
                continue;
            }

            let delinquency = delinquency(&case.sale, &case.payments, today);
            if delinquency.days_late < self.policy.days_to_block {
                summary.details.push(detail(case, Some(delinquency), PassAction::BelowThreshold));
                continue;
            }

            match self.block_device(case, delinquency).await {
                Ok(TransitionOutcome::Done) => {
                    summary.blocked += 1;
                    summary.details.push(detail(case, Some(delinquency), PassAction::Blocked));
                }
                Ok(TransitionOutcome::Superseded(DeviceStatus::Locked)) => {
                    summary.already_blocked += 1;
                    summary.details.push(detail(case, Some(delinquency), PassAction::AlreadyBlocked));
                }
                Ok(TransitionOutcome::Superseded(status)) => {
                    debug!(device_id = case.device.id, status = status.as_str(), "device left eligible set mid-pass");
                }
                Err(err) => {
                    warn!(device_id = case.device.id, sale_id = case.sale.id, error = %err, "auto-block failed for device");
                    summary.errors.push(PassError::for_device(
                        case.device.id,
                        Some(case.sale.id),
                        err.to_string(),
                    ));
                }
            }
        }

        info!(
            processed = summary.processed,
            blocked = summary.blocked,
            already_blocked = summary.already_blocked,
            errors = summary.errors.len(),
            "auto-block pass finished"
        );
        summary
    }

    /// Unlock locked devices whose sale caught up or was paid off.
    pub async fn process_auto_unblocks(&self, tenant: Option<&str>) -> UnblockSummary {
        let mut summary = UnblockSummary::default();

        let cases = match self.devices.find_locked_cases(tenant).await {
            Ok(cases) => cases,
            Err(err) => {
                error!(error = %err, "auto-unblock listing query failed");
                summary.errors.push(PassError::general(err.to_string()));
                return summary;
            }
        };

        let today = local_today(self.policy.tz);
        info!(locked = cases.len(), ?tenant, "starting auto-unblock pass");

        for case in &cases {
            summary.processed += 1;

            // The listing only returns locked devices, but a concurrent
            // cycle may have moved one on already.
            if case.device.status != DeviceStatus::Locked {
                continue;
            }

            let recomputed = self.unlock_decision(case, today);
            let Some(days_late) = recomputed.keep_locked_days() else {
                match self.unblock_device(&case.device, recomputed.audit_detail(case)).await {
                    Ok(TransitionOutcome::Done) => {
                        summary.unblocked += 1;
                        summary.details.push(unblock_detail(case, recomputed.days_late(), PassAction::Unblocked));
                    }
                    Ok(TransitionOutcome::Superseded(_)) => {}
                    Err(err) => {
                        warn!(device_id = case.device.id, error = %err, "auto-unblock failed for device");
                        summary.errors.push(PassError::for_device(
                            case.device.id,
                            case.sale.as_ref().map(|s| s.id),
                            err.to_string(),
                        ));
                    }
                }
                continue;
            };

            summary.details.push(unblock_detail(case, Some(days_late), PassAction::LeftLocked));
        }

        info!(
            processed = summary.processed,
            unblocked = summary.unblocked,
            errors = summary.errors.len(),
            "auto-unblock pass finished"
        );
        summary
    }

    /// One full reconciliation cycle: blocks then unblocks, sequentially.
    ///
    /// The ordering plus the status guards keep the two passes disjoint: a
    /// device locked by the block pass is over threshold, so the unblock
    /// pass leaves it locked in the same cycle.
    pub async fn run_full_cycle(&self, tenant: Option<&str>) -> CycleSummary {
        let blocks = self.process_auto_blocks(tenant).await;
        let unblocks = self.process_auto_unblocks(tenant).await;

        CycleSummary {
            timestamp: Utc::now(),
            days_to_block: self.policy.days_to_block,
            days_to_warn: self.policy.days_to_warn,
            blocks,
            unblocks,
        }
    }

    /// Early-warning report: delinquent but still below the block threshold,
    /// and not currently locked. Pure read, no side effects.
    pub async fn at_risk_devices(&self, tenant: Option<&str>) -> Result<Vec<AtRiskDevice>> {
        let candidates = self.sales.find_delinquency_candidates(tenant).await?;
        let today = local_today(self.policy.tz);

        Ok(candidates
            .into_iter()
            .filter(|case| case.device.status == DeviceStatus::Active)
            .filter_map(|case| {
                let d = delinquency(&case.sale, &case.payments, today);
                (d.days_late >= self.policy.days_to_warn && d.days_late < self.policy.days_to_block)
                    .then(|| AtRiskDevice {
                        device: case.device,
                        sale: case.sale,
                        days_late: d.days_late,
                        due_date: d.due_date,
                    })
            })
            .collect())
    }

    /// All sales past their due date, with their device's current state.
    /// Pure read, no side effects.
    pub async fn overdue_sales(&self, tenant: Option<&str>) -> Result<Vec<OverdueSale>> {
        let candidates = self.sales.find_delinquency_candidates(tenant).await?;
        let today = local_today(self.policy.tz);

        Ok(candidates
            .into_iter()
            .filter_map(|case| {
                let d = delinquency(&case.sale, &case.payments, today);
                d.is_overdue.then(|| OverdueSale {
                    sale: case.sale,
                    device: case.device,
                    days_late: d.days_late,
                    due_date: d.due_date,
                })
            })
            .collect())
    }

    /// Aggregate device counts. Pure read, no side effects.
    pub async fn stats(&self, tenant: Option<&str>) -> Result<DeviceStats> {
        let mut stats = self.devices.status_counts(tenant).await?;
        stats.at_risk = self.at_risk_devices(tenant).await?.len() as u64;
        Ok(stats)
    }

    /// Manual override: lock the device linked to a sale, bypassing the
    /// delinquency computation.
    pub async fn lock_for_sale(
        &self,
        sale_id: i64,
        reason: &str,
        actor: AuditActor,
        tenant: Option<&str>,
    ) -> Result<ManagedDevice> {
        let reason = validated_reason(reason)?;
        let mut device = self.require_device(sale_id, tenant).await?;

        self.gateway.lock_device(&device.device_number, reason).await?;

        let now = Utc::now();
        self.devices.mark_locked(device.id, reason, now).await?;
        self.audit
            .record(AuditEvent {
                actor,
                action: AuditAction::Block,
                details: format!(
                    "device {} manually locked for sale #{sale_id}: {reason}",
                    device.device_number
                ),
                tenant_id: Some(device.tenant_id.clone()),
            })
            .await?;

        device.status = DeviceStatus::Locked;
        device.last_locked_at = Some(now);
        device.lock_reason = Some(reason.to_string());
        Ok(device)
    }

    /// Manual override: unlock the device linked to a sale.
    pub async fn unlock_for_sale(
        &self,
        sale_id: i64,
        reason: &str,
        actor: AuditActor,
        tenant: Option<&str>,
    ) -> Result<ManagedDevice> {
        let reason = validated_reason(reason)?;
        let mut device = self.require_device(sale_id, tenant).await?;

        self.gateway.unlock_device(&device.device_number).await?;

        let now = Utc::now();
        self.devices.mark_unlocked(device.id, now).await?;
        self.audit
            .record(AuditEvent {
                actor,
                action: AuditAction::Unblock,
                details: format!(
                    "device {} manually unlocked for sale #{sale_id}: {reason}",
                    device.device_number
                ),
                tenant_id: Some(device.tenant_id.clone()),
            })
            .await?;

        device.status = DeviceStatus::Active;
        device.last_unlocked_at = Some(now);
        device.lock_reason = None;
        Ok(device)
    }

    async fn require_device(
        &self,
        sale_id: i64,
        tenant: Option<&str>,
    ) -> Result<ManagedDevice> {
        let device = self
            .devices
            .find_by_sale(sale_id, tenant)
            .await?
            .ok_or_else(|| {
                CredilockError::NotFound(format!("no device linked to sale #{sale_id}"))
            })?;

        if device.status.is_terminal() {
            return Err(CredilockError::InvalidInput(format!(
                "device {} is {} and can no longer be managed",
                device.device_number,
                device.status.as_str()
            )));
        }
        Ok(device)
    }

    async fn block_device(
        &self,
        case: &DelinquentSale,
        delinquency: Delinquency,
    ) -> Result<TransitionOutcome> {
        // Guard-before-act: last read before the external call.
        let status = self.devices.current_status(case.device.id).await?;
        if status != DeviceStatus::Active {
            return Ok(TransitionOutcome::Superseded(status));
        }

        let reason = format!(
            "Auto block: {} days late on sale #{}",
            delinquency.days_late, case.sale.id
        );
        self.gateway.lock_device(&case.device.device_number, &reason).await?;

        let now = Utc::now();
        self.devices.mark_locked(case.device.id, &reason, now).await?;
        self.audit
            .record(AuditEvent {
                actor: AuditActor::System,
                action: AuditAction::Block,
                details: format!(
                    "device {} locked for {} on sale #{} ({} days late, due {})",
                    case.device.device_number,
                    case.sale.client_name,
                    case.sale.id,
                    delinquency.days_late,
                    delinquency.due_date
                ),
                tenant_id: Some(case.device.tenant_id.clone()),
            })
            .await?;

        Ok(TransitionOutcome::Done)
    }

    async fn unblock_device(
        &self,
        device: &ManagedDevice,
        audit_detail: String,
    ) -> Result<TransitionOutcome> {
        // Guard-before-act: last read before the external call.
        let status = self.devices.current_status(device.id).await?;
        if status != DeviceStatus::Locked {
            return Ok(TransitionOutcome::Superseded(status));
        }

        self.gateway.unlock_device(&device.device_number).await?;

        let now = Utc::now();
        self.devices.mark_unlocked(device.id, now).await?;
        self.audit
            .record(AuditEvent {
                actor: AuditActor::System,
                action: AuditAction::Unblock,
                details: audit_detail,
                tenant_id: Some(device.tenant_id.clone()),
            })
            .await?;

        Ok(TransitionOutcome::Done)
    }

    fn unlock_decision(&self, case: &LockedDeviceCase, today: NaiveDate) -> UnlockDecision {
        match &case.sale {
            None => UnlockDecision::SaleGone,
            Some(sale) if sale.is_paid_off() => UnlockDecision::PaidOff,
            Some(sale) => {
                let d = delinquency(sale, &case.payments, today);
                if d.days_late < self.policy.days_to_block {
                    UnlockDecision::CaughtUp(d.days_late)
                } else {
                    UnlockDecision::StillDelinquent(d.days_late)
                }
            }
        }
    }
}

/// Why (or why not) a locked device gets unlocked this pass.
enum UnlockDecision {
    /// The owning sale no longer exists; never keep a device locked for it.
    SaleGone,
    /// Balance reached zero or status moved to paid off.
    PaidOff,
    /// Delinquent but back below the block threshold.
    CaughtUp(i64),
    StillDelinquent(i64),
}

impl UnlockDecision {
    /// `Some(days_late)` when the device must stay locked.
    fn keep_locked_days(&self) -> Option<i64> {
        match self {
            Self::StillDelinquent(days) => Some(*days),
            _ => None,
        }
    }

    fn days_late(&self) -> Option<i64> {
        match self {
            Self::SaleGone | Self::PaidOff => None,
            Self::CaughtUp(days) | Self::StillDelinquent(days) => Some(*days),
        }
    }

    fn audit_detail(&self, case: &LockedDeviceCase) -> String {
        let device = &case.device.device_number;
        match (self, &case.sale) {
            (Self::SaleGone, _) => {
                format!("device {device} unlocked: owning sale no longer exists")
            }
            (Self::PaidOff, Some(sale)) => format!(
                "device {device} unlocked for {}: sale #{} paid off",
                sale.client_name, sale.id
            ),
            (Self::CaughtUp(days), Some(sale)) => format!(
                "device {device} unlocked for {}: sale #{} back under threshold ({days} days late)",
                sale.client_name, sale.id
            ),
            // StillDelinquent never unlocks; the remaining arms are
            // unreachable combinations kept total for the compiler.
            (_, _) => format!("device {device} unlocked"),
        }
    }
}

fn validated_reason(reason: &str) -> Result<&str> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(CredilockError::InvalidInput("a non-empty reason is required".into()));
    }
    Ok(reason)
}

fn detail(case: &DelinquentSale, d: Option<Delinquency>, action: PassAction) -> ActionDetail {
    ActionDetail {
        device_id: case.device.id,
        sale_id: Some(case.sale.id),
        client_name: Some(case.sale.client_name.clone()),
        days_late: d.map(|d| d.days_late),
        action,
    }
}

fn unblock_detail(
    case: &LockedDeviceCase,
    days_late: Option<i64>,
    action: PassAction,
) -> ActionDetail {
    ActionDetail {
        device_id: case.device.id,
        sale_id: case.sale.as_ref().map(|s| s.id),
        client_name: case.sale.as_ref().map(|s| s.client_name.clone()),
        days_late,
        action,
    }
}
