//! Periodic reconciliation cycle driver.
//!
//! Cron-based scheduler that runs the full lockout cycle at fixed intervals,
//! all tenants. Join handles are tracked, cancellation is explicit, and every
//! asynchronous operation is wrapped in a timeout. A failed or timed-out
//! cycle is logged and swallowed so the next scheduled run still fires.

use std::sync::Arc;
use std::time::Duration;

use credilock_core::LockoutService;
use credilock_domain::constants::DEFAULT_CYCLE_CRON;
use tokio::task::JoinHandle;
use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::scheduling::error::{SchedulerError, SchedulerResult};

/// Configuration for the cycle driver.
#[derive(Debug, Clone)]
pub struct LockoutSchedulerConfig {
    /// Cron expression describing the execution schedule.
    pub cron_expression: String,
    /// Run one full cycle immediately when the scheduler starts.
    pub run_on_start: bool,
    /// Timeout applied to a single cycle execution.
    pub job_timeout: Duration,
    /// Timeout for starting the underlying scheduler.
    pub start_timeout: Duration,
    /// Timeout for stopping the scheduler.
    pub stop_timeout: Duration,
    /// Timeout for awaiting the monitor task join handle.
    pub join_timeout: Duration,
}

impl Default for LockoutSchedulerConfig {
    fn default() -> Self {
        Self {
            cron_expression: DEFAULT_CYCLE_CRON.into(),
            run_on_start: true,
            job_timeout: Duration::from_secs(600),
            start_timeout: Duration::from_secs(5),
            stop_timeout: Duration::from_secs(5),
            join_timeout: Duration::from_secs(5),
        }
    }
}

/// Reconciliation cycle scheduler with explicit lifecycle management.
pub struct LockoutScheduler {
    scheduler: Option<JobScheduler>,
    config: LockoutSchedulerConfig,
    monitor_handle: Option<JoinHandle<()>>,
    cancellation: CancellationToken,
    service: Arc<LockoutService>,
}

impl LockoutScheduler {
    /// Create a scheduler with the default configuration.
    pub fn new(cron_expression: String, service: Arc<LockoutService>) -> Self {
        let config = LockoutSchedulerConfig { cron_expression, ..Default::default() };
        Self::with_config(config, service)
    }

    /// Create a scheduler with a custom configuration.
    pub fn with_config(config: LockoutSchedulerConfig, service: Arc<LockoutService>) -> Self {
        Self {
            scheduler: None,
            config,
            monitor_handle: None,
            cancellation: CancellationToken::new(),
            service,
        }
    }

    /// Start the scheduler, spawning the monitoring task.
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        self.cancellation = CancellationToken::new();

        let scheduler_instance = self.build_scheduler().await?;
        let start_timeout = self.config.start_timeout;

        let start_result = tokio::time::timeout(start_timeout, scheduler_instance.start())
            .await
            .map_err(|source| SchedulerError::Timeout { duration: start_timeout, source })?;

        start_result.map_err(|source| SchedulerError::StartFailed { source })?;

        self.scheduler = Some(scheduler_instance);

        let cancel = self.cancellation.clone();
        let service = self.service.clone();
        let job_timeout = self.config.job_timeout;
        let run_on_start = self.config.run_on_start;
        let handle = tokio::spawn(async move {
            Self::monitor_task(cancel, service, job_timeout, run_on_start).await;
        });

        self.monitor_handle = Some(handle);
        info!(scheduler = "lockout", event = "start", "lockout scheduler started");
        Ok(())
    }

    /// Stop the scheduler and wait for the monitor task to finish.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        if !self.is_running() {
            return Err(SchedulerError::NotRunning);
        }

        self.cancellation.cancel();

        let mut scheduler = match self.scheduler.take() {
            Some(scheduler) => scheduler,
            None => return Err(SchedulerError::NotRunning),
        };

        let stop_timeout = self.config.stop_timeout;
        let stop_result =
            tokio::time::timeout(stop_timeout, async move { scheduler.shutdown().await })
                .await
                .map_err(|source| SchedulerError::Timeout { duration: stop_timeout, source })?;

        stop_result.map_err(|source| SchedulerError::StopFailed { source })?;

        if let Some(handle) = self.monitor_handle.take() {
            let join_timeout = self.config.join_timeout;
            tokio::time::timeout(join_timeout, handle)
                .await
                .map_err(|source| SchedulerError::Timeout { duration: join_timeout, source })?
                .map_err(|source| SchedulerError::JoinFailed { source })?;
        }

        info!(scheduler = "lockout", event = "stop", "lockout scheduler stopped");
        self.cancellation = CancellationToken::new();
        Ok(())
    }

    /// Returns true when a scheduler instance is active.
    pub fn is_running(&self) -> bool {
        self.scheduler.is_some()
    }

    async fn build_scheduler(&self) -> SchedulerResult<JobScheduler> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|source| SchedulerError::CreationFailed { source })?;
        let cron_expr = self.config.cron_expression.clone();
        let service = self.service.clone();
        let job_timeout = self.config.job_timeout;

        let job_definition = Job::new_async(cron_expr.as_str(), move |_id, _lock| {
            let service = service.clone();
            Box::pin(async move {
                Self::run_cycle(service, job_timeout).await;
            })
        })
        .map_err(|source| SchedulerError::JobRegistrationFailed { source })?;

        let job_id = job_definition.guid();
        scheduler
            .add(job_definition)
            .await
            .map_err(|source| SchedulerError::JobRegistrationFailed { source })?;

        debug!(cron = %self.config.cron_expression, job_id = %job_id, "registered reconciliation cycle job");
        Ok(scheduler)
    }

    /// Run one cycle for all tenants under the job timeout.
    ///
    /// The engine itself never fails a cycle (partial errors land in the
    /// summary), so the only failure mode here is the timeout.
    async fn run_cycle(service: Arc<LockoutService>, job_timeout: Duration) {
        debug!(scheduler = "lockout", event = "job_invoked", "reconciliation cycle starting");

        match tokio::time::timeout(job_timeout, service.run_full_cycle(None)).await {
            Ok(summary) => {
                info!(
                    scheduler = "lockout",
                    event = "job_complete",
                    blocked = summary.blocks.blocked,
                    already_blocked = summary.blocks.already_blocked,
                    unblocked = summary.unblocks.unblocked,
                    block_errors = summary.blocks.errors.len(),
                    unblock_errors = summary.unblocks.errors.len(),
                    "reconciliation cycle finished"
                );
            }
            Err(_) => {
                warn!(
                    scheduler = "lockout",
                    event = "job_timeout",
                    timeout_secs = job_timeout.as_secs(),
                    "reconciliation cycle timed out"
                );
            }
        }
    }

    async fn monitor_task(
        cancel: CancellationToken,
        service: Arc<LockoutService>,
        job_timeout: Duration,
        run_on_start: bool,
    ) {
        if run_on_start {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = Self::run_cycle(service, job_timeout) => {}
            }
        }

        cancel.cancelled().await;
        debug!(scheduler = "lockout", event = "monitor_cancelled", "lockout scheduler monitor cancelled");
    }
}

impl Drop for LockoutScheduler {
    fn drop(&mut self) {
        if self.is_running() {
            warn!(
                scheduler = "lockout",
                event = "drop_cancel",
                "LockoutScheduler dropped while running; cancelling tasks"
            );
            self.cancellation.cancel();
        }
    }
}
