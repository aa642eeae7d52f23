//! Cron-based reconciliation cycle driver.

mod error;
mod lockout_scheduler;

pub use error::{SchedulerError, SchedulerResult};
pub use lockout_scheduler::{LockoutScheduler, LockoutSchedulerConfig};
