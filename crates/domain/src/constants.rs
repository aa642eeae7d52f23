//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

// Delinquency thresholds (days)
pub const DEFAULT_DAYS_TO_BLOCK: i64 = 2;
pub const DEFAULT_DAYS_TO_WARN: i64 = 1;

// Payment period lengths (days); monthly advances one calendar month instead
pub const DAILY_PERIOD_DAYS: i64 = 1;
pub const WEEKLY_PERIOD_DAYS: i64 = 7;
pub const FORTNIGHTLY_PERIOD_DAYS: i64 = 15;

// Device directory defaults
pub const DEFAULT_DIRECTORY_TIMEOUT_SECS: u64 = 15;

// Cycle driver defaults: four times daily, on the hour
pub const DEFAULT_CYCLE_CRON: &str = "0 0 */6 * * *";

// Business civil timezone; all due-date arithmetic is calendar-local
pub const DEFAULT_TIMEZONE: &str = "America/Mexico_City";
