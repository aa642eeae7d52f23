//! CrediLock service binary.
//!
//! Bootstrap order: environment → logging → configuration → database →
//! gateway → engine → scheduler → HTTP server.

use std::sync::Arc;

use anyhow::Context;
use credilock_api::{build_router, AppState};
use credilock_core::{LockoutPolicy, LockoutService};
use credilock_infra::{
    config, DbManager, DirectoryClient, LockoutScheduler, LockoutSchedulerConfig,
    SqliteAuditLog, SqliteDeviceRepository, SqliteSaleRepository,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cfg = config::load().context("loading configuration")?;

    let db = Arc::new(
        DbManager::new(&cfg.database.path, cfg.database.pool_size)
            .context("opening database")?,
    );
    db.run_migrations().context("running migrations")?;

    let gateway =
        Arc::new(DirectoryClient::new(&cfg.directory).context("building directory client")?);

    let service = Arc::new(LockoutService::new(
        Arc::new(SqliteSaleRepository::new(db.clone())),
        Arc::new(SqliteDeviceRepository::new(db.clone())),
        gateway,
        Arc::new(SqliteAuditLog::new(db.clone())),
        LockoutPolicy::from_config(&cfg.lockout).context("resolving lockout policy")?,
    ));

    let mut scheduler = if cfg.scheduler.enabled {
        let mut scheduler = LockoutScheduler::with_config(
            LockoutSchedulerConfig {
                cron_expression: cfg.scheduler.cycle_cron.clone(),
                run_on_start: cfg.scheduler.run_on_start,
                ..Default::default()
            },
            service.clone(),
        );
        scheduler.start().await.context("starting cycle scheduler")?;
        Some(scheduler)
    } else {
        info!("cycle scheduler disabled by configuration");
        None
    };

    let app = build_router(AppState::new(service, db));
    let listener = tokio::net::TcpListener::bind(&cfg.api.bind_addr)
        .await
        .with_context(|| format!("binding {}", cfg.api.bind_addr))?;
    info!(addr = %cfg.api.bind_addr, "credilock listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    if let Some(scheduler) = scheduler.as_mut() {
        if let Err(err) = scheduler.stop().await {
            warn!(error = %err, "cycle scheduler did not stop cleanly");
        }
    }

    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
    }
}
