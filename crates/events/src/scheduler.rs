//! Background lesson reminder loop.
//!
//! [`ReminderScheduler`] owns at most one polling task. Each tick runs one
//! reminder cycle and logs its [`CycleOutcome`]; a failed or panicked cycle
//! never ends the loop. The host keeps the scheduler (or any
//! [`SchedulerHandle`] it returned) and stops it on shutdown.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use campus_core::reminders::{Lookahead, DEFAULT_POLL_INTERVAL};
use campus_core::types::Timestamp;
use chrono::Utc;
use futures::FutureExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::reminders::{ReminderError, ReminderGenerator};

/// Shortest accepted poll interval; smaller values are raised to this.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Polling cadence and lookahead for the loop.
#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    pub poll_interval: Duration,
    pub lookahead: Lookahead,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            lookahead: Lookahead::scheduler_default(),
        }
    }
}

/// `Stopping` lasts from the moment a stop cancels the loop until its task
/// has exited. A `start` issued meanwhile begins a new run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Stopped,
    Running,
    Stopping,
}

/// Result of one reminder cycle.
#[derive(Debug)]
pub enum CycleOutcome {
    Completed { created: u64 },
    Failed(ReminderError),
    Panicked,
}

// ---------------------------------------------------------------------------
// ReminderScheduler
// ---------------------------------------------------------------------------

struct Run {
    id: u64,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

struct Inner {
    state: SchedulerState,
    run: Option<Run>,
    next_run_id: u64,
}

pub struct ReminderScheduler {
    generator: Arc<ReminderGenerator>,
    config: SchedulerConfig,
    inner: Arc<Mutex<Inner>>,
}

impl ReminderScheduler {
    pub fn new(generator: Arc<ReminderGenerator>, mut config: SchedulerConfig) -> Self {
        if config.poll_interval < MIN_POLL_INTERVAL {
            tracing::warn!(
                requested_ms = config.poll_interval.as_millis() as u64,
                min_ms = MIN_POLL_INTERVAL.as_millis() as u64,
                "Reminder poll interval too small, using minimum"
            );
            config.poll_interval = MIN_POLL_INTERVAL;
        }
        Self {
            generator,
            config,
            inner: Arc::new(Mutex::new(Inner {
                state: SchedulerState::Stopped,
                run: None,
                next_run_id: 1,
            })),
        }
    }

    /// Start the polling loop, or return a handle to the loop that is
    /// already running.
    pub async fn start(&self) -> SchedulerHandle {
        let mut inner = self.inner.lock().await;

        if let Some(run) = &inner.run {
            if inner.state == SchedulerState::Running {
                return SchedulerHandle {
                    inner: Arc::clone(&self.inner),
                    run_id: run.id,
                };
            }
        }

        let id = inner.next_run_id;
        inner.next_run_id += 1;

        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_loop(
            Arc::clone(&self.generator),
            self.config,
            cancel.clone(),
        ));
        inner.run = Some(Run { id, cancel, task });
        inner.state = SchedulerState::Running;

        tracing::info!(
            poll_ms = self.config.poll_interval.as_millis() as u64,
            lookahead_mins = self.config.lookahead.duration().num_minutes(),
            "Reminder scheduler started"
        );

        SchedulerHandle {
            inner: Arc::clone(&self.inner),
            run_id: id,
        }
    }

    /// Stop whatever loop is running. A no-op when nothing is.
    pub async fn stop(&self) {
        stop_run(&self.inner, None).await;
    }

    pub async fn state(&self) -> SchedulerState {
        self.inner.lock().await.state
    }

    pub fn config(&self) -> SchedulerConfig {
        self.config
    }

    /// Run a single cycle at `now`, outside the loop.
    pub async fn run_cycle(&self, now: Timestamp) -> CycleOutcome {
        run_cycle(&self.generator, now, self.config.lookahead).await
    }
}

// ---------------------------------------------------------------------------
// SchedulerHandle
// ---------------------------------------------------------------------------

/// Stops the run it was issued for. Handles for the same run are
/// interchangeable; only the first `stop` does anything.
#[derive(Clone)]
pub struct SchedulerHandle {
    inner: Arc<Mutex<Inner>>,
    run_id: u64,
}

impl SchedulerHandle {
    pub fn run_id(&self) -> u64 {
        self.run_id
    }

    pub async fn stop(&self) {
        stop_run(&self.inner, Some(self.run_id)).await;
    }

    pub async fn state(&self) -> SchedulerState {
        self.inner.lock().await.state
    }
}

/// Cancel and await the current run if it matches `run_id` (or any run
/// when `run_id` is `None`). The lock is released while the task winds
/// down, so `state()` reports `Stopping` and a concurrent `start` can
/// begin a new run; in that case the state is left as the new run set it.
async fn stop_run(inner: &Mutex<Inner>, run_id: Option<u64>) {
    let run = {
        let mut guard = inner.lock().await;

        let matches = guard
            .run
            .as_ref()
            .is_some_and(|run| run_id.map_or(true, |id| id == run.id));
        if !matches || guard.state != SchedulerState::Running {
            return;
        }
        let Some(run) = guard.run.take() else {
            return;
        };
        guard.state = SchedulerState::Stopping;
        run
    };

    run.cancel.cancel();
    if let Err(e) = run.task.await {
        tracing::error!(error = %e, "Reminder scheduler task ended abnormally");
    }

    let mut guard = inner.lock().await;
    if guard.state == SchedulerState::Stopping && guard.run.is_none() {
        guard.state = SchedulerState::Stopped;
    }

    tracing::info!(run_id = run.id, "Reminder scheduler stopped");
}

// ---------------------------------------------------------------------------
// Loop
// ---------------------------------------------------------------------------

async fn run_loop(
    generator: Arc<ReminderGenerator>,
    config: SchedulerConfig,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(config.poll_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                let outcome = tokio::select! {
                    _ = cancel.cancelled() => break,
                    outcome = run_cycle(&generator, Utc::now(), config.lookahead) => outcome,
                };
                log_outcome(&outcome);
            }
        }
    }

    tracing::debug!("Reminder scheduler loop exited");
}

async fn run_cycle(
    generator: &ReminderGenerator,
    now: Timestamp,
    lookahead: Lookahead,
) -> CycleOutcome {
    let cycle = AssertUnwindSafe(generator.generate_due_reminders(now, lookahead));
    match cycle.catch_unwind().await {
        Ok(Ok(created)) => CycleOutcome::Completed { created },
        Ok(Err(e)) => CycleOutcome::Failed(e),
        Err(_) => CycleOutcome::Panicked,
    }
}

fn log_outcome(outcome: &CycleOutcome) {
    match outcome {
        CycleOutcome::Completed { created: 0 } => {}
        CycleOutcome::Completed { created } => {
            tracing::debug!(created, "Reminder cycle completed");
        }
        CycleOutcome::Failed(e) => {
            tracing::error!(error = %e, "Reminder cycle failed");
        }
        CycleOutcome::Panicked => {
            tracing::error!("Reminder cycle panicked");
        }
    }
}
