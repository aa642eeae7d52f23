//! Domain types and models

pub mod audit;
pub mod device;
pub mod lockout;
pub mod sale;

// Re-export the commonly used types for convenience
pub use audit::{AuditAction, AuditActor, AuditEvent};
pub use device::{DeviceStatus, ManagedDevice};
pub use lockout::{
    ActionDetail, AtRiskDevice, BlockSummary, CycleSummary, Delinquency, DelinquentSale,
    DeviceStats, LockedDeviceCase, OverdueSale, PassAction, PassError, UnblockSummary,
};
pub use sale::{FinancedSale, Payment, PaymentFrequency, SaleStatus};
