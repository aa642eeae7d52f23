//! SQLite persistence for sales, devices and the audit log.

mod audit_log;
mod manager;
mod rows;

mod device_repository;
mod sale_repository;

pub use audit_log::SqliteAuditLog;
pub use device_repository::SqliteDeviceRepository;
pub use manager::DbManager;
pub use sale_repository::SqliteSaleRepository;
