use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info, warn};

use super::checker::{Checker, DEFAULT_CHECK_TIMEOUT};
use super::clock::Clock;
use super::types::{CheckOutcome, CheckResult};
use crate::database::{RecordOutcome, StoreResult, Target, TargetStore};

/// Timing knobs fixed at process start
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Wall-clock period between ticks
    pub tick_period: Duration,
    /// Upper bound for a single check
    pub check_timeout: Duration,
    /// How many checks of one tick may be in flight at once
    pub max_concurrent_checks: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_period: Duration::from_secs(60),
            check_timeout: DEFAULT_CHECK_TIMEOUT,
            max_concurrent_checks: 16,
        }
    }
}

/// What one tick did, mostly for logs and tests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickSummary {
    /// Enabled targets in the snapshot
    pub considered: usize,
    pub due: usize,
    pub recorded: usize,
    /// Targets deleted while their check was running
    pub vanished: usize,
    /// Results the store refused; the target stays due and is retried next tick
    pub persist_failures: usize,
}

/// Periodically checks every enabled target whose interval has elapsed.
///
/// The scheduler holds no lock of its own: it reads a snapshot, fans the
/// checks out and writes each result back through the store's per-record
/// update. Two overlapping ticks may check the same target twice, in which
/// case the last write wins.
pub struct Scheduler {
    store: Arc<dyn TargetStore>,
    checker: Arc<dyn Checker>,
    clock: Arc<dyn Clock>,
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(
        store: Arc<dyn TargetStore>,
        checker: Arc<dyn Checker>,
        clock: Arc<dyn Clock>,
        config: SchedulerConfig,
    ) -> Self {
        Self { store, checker, clock, config }
    }

    /// Run one sweep over the enabled targets and wait for all its checks.
    ///
    /// Results are recorded with the tick's own timestamp so a target whose
    /// interval equals the tick period is due again on the very next tick.
    pub async fn tick(&self) -> TickSummary {
        let now = self.clock.now();

        let snapshot = match self.store.find_enabled().await {
            Ok(targets) => targets,
            Err(e) => {
                error!("Failed to load enabled targets, skipping tick: {e}");
                return TickSummary::default();
            }
        };

        let due: Vec<Target> = snapshot.iter().filter(|target| target.enabled && target.is_due(now)).cloned().collect();
        let mut summary = TickSummary { considered: snapshot.len(), due: due.len(), ..TickSummary::default() };
        debug!(considered = summary.considered, due = summary.due, "Tick started");

        let checks = due.into_iter().map(|target| {
            let store = self.store.clone();
            let checker = self.checker.clone();
            let timeout = self.config.check_timeout;
            async move {
                let result = checker.check(&target.url, timeout).await;
                record(store.as_ref(), &target, CheckResult { timestamp: now, ..result }).await
            }
        });

        let outcomes = stream::iter(checks)
            .buffer_unordered(self.config.max_concurrent_checks.max(1))
            .collect::<Vec<StoreResult<RecordOutcome>>>()
            .await;

        for outcome in outcomes {
            match outcome {
                Ok(RecordOutcome::Recorded) => summary.recorded += 1,
                Ok(RecordOutcome::NotFound) => summary.vanished += 1,
                Err(_) => summary.persist_failures += 1,
            }
        }

        debug!(
            recorded = summary.recorded,
            vanished = summary.vanished,
            persist_failures = summary.persist_failures,
            "Tick finished"
        );
        summary
    }

    /// Start ticking: once right away, then every `tick_period`.
    ///
    /// Each tick runs in its own task, so a slow tick never holds back the
    /// timer.
    pub fn start(self: Arc<Self>) -> SchedulerHandle {
        let (stop_tx, mut stop_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut timer = interval(self.config.tick_period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

            info!("Start pinging every {}s", self.config.tick_period.as_secs_f64());

            loop {
                tokio::select! {
                    _ = timer.tick() => {
                        let scheduler = self.clone();
                        tokio::spawn(async move {
                            scheduler.tick().await;
                        });
                    }
                    _ = stop_rx.changed() => break,
                }
            }

            info!("Scheduler stopped");
        });

        SchedulerHandle { stop_tx, task }
    }
}

async fn record(store: &dyn TargetStore, target: &Target, result: CheckResult) -> StoreResult<RecordOutcome> {
    match &result.outcome {
        CheckOutcome::Success { status_code } => {
            info!(target_id = %target.id, url = %target.url, status = status_code, "Ping succeeded")
        }
        CheckOutcome::Failure { message } => {
            warn!(target_id = %target.id, url = %target.url, error = %message, "Ping failed")
        }
    }

    let outcome = store.record_check_result(&target.id, &result).await;
    match &outcome {
        Ok(RecordOutcome::Recorded) => {}
        Ok(RecordOutcome::NotFound) => {
            debug!(target_id = %target.id, "Target deleted during check, result dropped")
        }
        Err(e) => warn!(target_id = %target.id, "Failed to persist check result: {e}"),
    }
    outcome
}

/// Owner of a running scheduler loop.
pub struct SchedulerHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stop the timer. Checks already in flight are left to finish or be
    /// dropped with the runtime. Dropping the handle stops the timer as well.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        if let Err(e) = self.task.await {
            error!("Scheduler task ended abnormally: {e}");
        }
    }
}
