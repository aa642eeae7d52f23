//! Configuration structures.
//!
//! Loaded by the infra config loader from environment variables or a
//! JSON/TOML file; defaults live here next to the types.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CYCLE_CRON, DEFAULT_DAYS_TO_BLOCK, DEFAULT_DAYS_TO_WARN,
    DEFAULT_DIRECTORY_TIMEOUT_SECS, DEFAULT_TIMEZONE,
};
use crate::errors::{CredilockError, Result};

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub lockout: LockoutConfig,
    pub directory: DirectoryConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

fn default_pool_size() -> u32 {
    4
}

/// Delinquency thresholds and the business civil timezone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockoutConfig {
    #[serde(default = "default_days_to_block")]
    pub days_to_block: i64,
    #[serde(default = "default_days_to_warn")]
    pub days_to_warn: i64,
    /// IANA zone name. The business operates in a single fixed timezone and
    /// every due-date comparison happens in its civil calendar.
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

impl Default for LockoutConfig {
    fn default() -> Self {
        Self {
            days_to_block: DEFAULT_DAYS_TO_BLOCK,
            days_to_warn: DEFAULT_DAYS_TO_WARN,
            timezone: DEFAULT_TIMEZONE.to_string(),
        }
    }
}

impl LockoutConfig {
    /// Resolve the configured IANA zone name.
    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| CredilockError::Config(format!("Invalid timezone: {}", self.timezone)))
    }
}

fn default_days_to_block() -> i64 {
    DEFAULT_DAYS_TO_BLOCK
}

fn default_days_to_warn() -> i64 {
    DEFAULT_DAYS_TO_WARN
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

/// Connection settings for the external device-management backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
    /// Configuration profile assigned to devices in normal use.
    pub profile_normal: String,
    /// Configuration profile that renders the device locked.
    pub profile_blocked: String,
    #[serde(default = "default_directory_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_directory_timeout_secs() -> u64 {
    DEFAULT_DIRECTORY_TIMEOUT_SECS
}

/// Cycle driver settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_cycle_cron")]
    pub cycle_cron: String,
    /// Run one full cycle immediately at process startup.
    #[serde(default = "default_true")]
    pub run_on_start: bool,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { cycle_cron: DEFAULT_CYCLE_CRON.to_string(), run_on_start: true, enabled: true }
    }
}

fn default_cycle_cron() -> String {
    DEFAULT_CYCLE_CRON.to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { bind_addr: default_bind_addr() }
    }
}

fn default_bind_addr() -> String {
    "127.0.0.1:8080".to_string()
}
