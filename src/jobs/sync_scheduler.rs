//! Background scheduler for recurring syncs.
//!
//! A polling loop: once per check interval it lists all schedules and runs
//! the due ones one at a time. A schedule is due when it is enabled, its
//! `next_run` has passed, and it is not already `pending`. Every execution
//! attempt, success or failure, recomputes `next_run` from the claim time so
//! a failing schedule keeps cycling instead of retrying in a tight loop.
//!
//! The scheduler is constructed and started by `main`; there is no implicit
//! process-wide instance. `stop()` only prevents future ticks; an in-flight
//! tick (and any executor it is awaiting) always runs to completion.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDateTime, Utc};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::entities::sync_schedules::Model;
use crate::models::sync_types::{calculate_next_run, RunResult, SyncType};
use crate::services::schedule_store::ScheduleStore;
use crate::services::sync_executors::{SyncError, SyncExecutor};

pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(60);

struct LoopHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

pub struct SyncScheduler {
    inner: Arc<Inner>,
    running: Mutex<Option<LoopHandle>>,
}

struct Inner {
    store: Arc<dyn ScheduleStore>,
    executor: Arc<dyn SyncExecutor>,
    check_interval: Duration,
}

impl SyncScheduler {
    pub fn new(
        store: Arc<dyn ScheduleStore>,
        executor: Arc<dyn SyncExecutor>,
        check_interval: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                executor,
                check_interval,
            }),
            running: Mutex::new(None),
        }
    }

    /// Starts the poll loop: one check immediately, then one per interval.
    /// Starting an already-running scheduler logs a warning and does nothing.
    pub async fn start(&self) {
        let mut running = self.running.lock().await;
        if running.is_some() {
            warn!("sync scheduler already running, ignoring start");
            return;
        }

        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(inner.check_interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => inner.run_pending().await,
                    _ = shutdown_rx.changed() => break,
                }
            }
            info!("sync scheduler stopped");
        });

        *running = Some(LoopHandle { shutdown, task });
        info!(
            check_interval_secs = self.inner.check_interval.as_secs(),
            "sync scheduler started"
        );
    }

    /// Signals the poll loop to end and waits for any in-flight tick to
    /// finish. Executors are never interrupted mid-run.
    pub async fn stop(&self) {
        let handle = self.running.lock().await.take();
        match handle {
            Some(LoopHandle { shutdown, task }) => {
                let _ = shutdown.send(true);
                if let Err(err) = task.await {
                    error!("sync scheduler task failed: {}", err);
                }
            }
            None => warn!("sync scheduler is not running, ignoring stop"),
        }
    }

    /// Runs one check outside the poll loop. Used by the loop itself and by
    /// tests that drive ticks manually.
    pub async fn run_pending(&self) {
        self.inner.run_pending().await;
    }
}

impl Inner {
    /// One tick: checks every schedule and runs the due ones sequentially,
    /// in store order. Nothing here is allowed to escape as a panic or an
    /// error; one bad schedule must not stop the others, and one bad tick
    /// must not stop future ticks.
    async fn run_pending(&self) {
        let schedules = match self.store.list_schedules().await {
            Ok(schedules) => schedules,
            Err(err) => {
                error!("failed to list sync schedules: {}", err);
                return;
            }
        };

        for schedule in schedules {
            if !schedule.is_enabled {
                continue;
            }
            let now = Utc::now().naive_utc();
            let due = matches!(schedule.next_run, Some(next_run) if next_run <= now);
            if !due {
                continue;
            }
            if schedule.last_result.as_deref() == Some(RunResult::Pending.as_str()) {
                debug!(
                    schedule_id = schedule.id,
                    sync_type = %schedule.sync_type,
                    "sync still running, skipping"
                );
                continue;
            }
            self.run_schedule(&schedule, now).await;
        }
    }

    async fn run_schedule(&self, schedule: &Model, now: NaiveDateTime) {
        match self.store.claim_for_run(schedule.id, now).await {
            Ok(true) => {}
            Ok(false) => {
                // Claimed elsewhere (or edited) between the list and now.
                debug!(schedule_id = schedule.id, "lost claim, skipping");
                return;
            }
            Err(err) => {
                error!(
                    schedule_id = schedule.id,
                    sync_type = %schedule.sync_type,
                    "failed to claim schedule: {}", err
                );
                return;
            }
        }

        info!(
            schedule_id = schedule.id,
            sync_type = %schedule.sync_type,
            "running scheduled sync"
        );

        let outcome = match SyncType::parse(&schedule.sync_type) {
            Some(sync_type) => self.executor.execute(sync_type).await,
            None => Err(SyncError::UnknownType(schedule.sync_type.clone())),
        };

        // Advance from the claim time whether the run succeeded or not, so a
        // failing schedule waits for its next normal cycle.
        let next_run = calculate_next_run(&schedule.frequency, now);

        let record = match outcome {
            Ok(()) => {
                info!(
                    schedule_id = schedule.id,
                    sync_type = %schedule.sync_type,
                    next_run = %next_run,
                    "scheduled sync succeeded"
                );
                self.store
                    .record_outcome(schedule.id, RunResult::Success, next_run, None)
                    .await
            }
            Err(err) => {
                error!(
                    schedule_id = schedule.id,
                    sync_type = %schedule.sync_type,
                    "scheduled sync failed: {}", err
                );
                self.store
                    .record_outcome(
                        schedule.id,
                        RunResult::Failure,
                        next_run,
                        Some(err.to_string()),
                    )
                    .await
            }
        };

        if let Err(err) = record {
            error!(
                schedule_id = schedule.id,
                "failed to record sync outcome: {}", err
            );
        }
    }
}
