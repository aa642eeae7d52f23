//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `CREDILOCK_DB_PATH`: Database file path (required)
//! - `CREDILOCK_DB_POOL_SIZE`: Connection pool size
//! - `CREDILOCK_DAYS_TO_BLOCK`: Delinquency threshold that locks a device
//! - `CREDILOCK_DAYS_TO_WARN`: Delinquency threshold for the at-risk report
//! - `CREDILOCK_TIMEZONE`: IANA name of the business civil timezone
//! - `CREDILOCK_DIRECTORY_URL`: Device directory base URL (required)
//! - `CREDILOCK_DIRECTORY_USERNAME` / `CREDILOCK_DIRECTORY_PASSWORD`:
//!   vendor credentials (required)
//! - `CREDILOCK_DIRECTORY_PROFILE_NORMAL` / `CREDILOCK_DIRECTORY_PROFILE_BLOCKED`:
//!   configuration-profile identifiers (required)
//! - `CREDILOCK_DIRECTORY_TIMEOUT_SECS`: Per-call vendor timeout
//! - `CREDILOCK_CYCLE_CRON`: Cron expression for the reconciliation cycle
//! - `CREDILOCK_CYCLE_ON_START`: Run one cycle at startup (true/false)
//! - `CREDILOCK_SCHEDULER_ENABLED`: Enable the periodic driver (true/false)
//! - `CREDILOCK_BIND_ADDR`: HTTP listen address

use std::path::{Path, PathBuf};

use credilock_domain::{
    ApiConfig, Config, CredilockError, DatabaseConfig, DirectoryConfig, LockoutConfig, Result,
    SchedulerConfig,
};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// All required environment variables must be present; optional ones fall
/// back to the documented defaults.
pub fn load_from_env() -> Result<Config> {
    let defaults = LockoutConfig::default();
    let scheduler_defaults = SchedulerConfig::default();

    let config = Config {
        database: DatabaseConfig {
            path: env_var("CREDILOCK_DB_PATH")?,
            pool_size: env_parse("CREDILOCK_DB_POOL_SIZE", 4)?,
        },
        lockout: LockoutConfig {
            days_to_block: env_parse("CREDILOCK_DAYS_TO_BLOCK", defaults.days_to_block)?,
            days_to_warn: env_parse("CREDILOCK_DAYS_TO_WARN", defaults.days_to_warn)?,
            timezone: env_or("CREDILOCK_TIMEZONE", &defaults.timezone),
        },
        directory: DirectoryConfig {
            base_url: env_var("CREDILOCK_DIRECTORY_URL")?,
            username: env_var("CREDILOCK_DIRECTORY_USERNAME")?,
            password: env_var("CREDILOCK_DIRECTORY_PASSWORD")?,
            profile_normal: env_var("CREDILOCK_DIRECTORY_PROFILE_NORMAL")?,
            profile_blocked: env_var("CREDILOCK_DIRECTORY_PROFILE_BLOCKED")?,
            timeout_secs: env_parse(
                "CREDILOCK_DIRECTORY_TIMEOUT_SECS",
                credilock_domain::constants::DEFAULT_DIRECTORY_TIMEOUT_SECS,
            )?,
        },
        scheduler: SchedulerConfig {
            cycle_cron: env_or("CREDILOCK_CYCLE_CRON", &scheduler_defaults.cycle_cron),
            run_on_start: env_bool("CREDILOCK_CYCLE_ON_START", scheduler_defaults.run_on_start),
            enabled: env_bool("CREDILOCK_SCHEDULER_ENABLED", scheduler_defaults.enabled),
        },
        api: ApiConfig {
            bind_addr: env_or("CREDILOCK_BIND_ADDR", &ApiConfig::default().bind_addr),
        },
    };

    // Fail fast on an unparseable timezone instead of at the first cycle.
    config.lockout.tz()?;

    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(CredilockError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            CredilockError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| CredilockError::Config(format!("Failed to read config file: {e}")))?;

    let config = parse_config(&contents, &config_path)?;
    config.lockout.tz()?;
    Ok(config)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| CredilockError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| CredilockError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(CredilockError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// Searches the current working directory, up to two parent levels, and the
/// executable's directory for `config.{json,toml}` / `credilock.{json,toml}`.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(vec![
            cwd.join("config.json"),
            cwd.join("config.toml"),
            cwd.join("credilock.json"),
            cwd.join("credilock.toml"),
            cwd.join("../config.json"),
            cwd.join("../config.toml"),
            cwd.join("../../config.json"),
            cwd.join("../../config.toml"),
        ]);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(vec![
                exe_dir.join("config.json"),
                exe_dir.join("config.toml"),
                exe_dir.join("credilock.json"),
                exe_dir.join("credilock.toml"),
            ]);
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        CredilockError::Config(format!("Missing required environment variable: {key}"))
    })
}

/// Optional environment variable with a default.
fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an optional numeric environment variable.
fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(value) => value
            .parse::<T>()
            .map_err(|e| CredilockError::Config(format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(default),
    }
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
