//! Cycle scheduler
//!
//! The Scheduler is responsible for:
//! - Running the first cycle immediately, so misconfiguration shows up at once
//! - Repeating the cycle on a fixed interval, if one is configured
//! - Stopping on a shutdown signal or, in batch mode, after a maximum runtime
//!
//! ## Timeline
//!
//! ```text
//! start      +interval   +2·interval            shutdown
//!   │            │            │                    │
//!   ▼            ▼            ▼                    ▼
//! [cycle]      [cycle]      [cycle]    ...       stop
//! ```
//!
//! Cycles never overlap: each one is awaited inside the loop, and ticks that
//! fall due while a cycle overruns are skipped. A shutdown that arrives during
//! a cycle lets it finish; no further cycle starts.

use crate::error::{Error, Result};
use crate::reconciler::{ReconcileOutcome, ReconcileTarget, Reconciler};
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::IntervalStream;
use tracing::{debug, info, trace, warn};

/// Scheduler configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Time between cycles; `None` runs a single cycle
    pub interval: Option<Duration>,

    /// Stop after this long even without a shutdown signal
    pub max_runtime: Option<Duration>,

    /// Capacity of the monitoring event channel
    ///
    /// When full, new events are dropped (with a warning log).
    pub event_channel_capacity: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: None,
            max_runtime: None,
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_event_channel_capacity() -> usize {
    100
}

/// Why the scheduler stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// No interval configured; the single cycle ran
    RunOnce,
    /// The shutdown future resolved
    Shutdown,
    /// `max_runtime` elapsed
    Deadline,
}

/// Events emitted by the Scheduler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerEvent {
    /// Scheduler started
    Started {
        interval: Option<Duration>,
    },

    /// A cycle finished without error
    CycleCompleted {
        cycle: u64,
        outcome: ReconcileOutcome,
    },

    /// A cycle was aborted (the error was logged by the reconciler)
    CycleFailed {
        cycle: u64,
    },

    /// Scheduler stopped
    Stopped {
        reason: StopReason,
    },
}

/// Periodic driver for the [`Reconciler`]
pub struct Scheduler {
    reconciler: Reconciler,
    target: ReconcileTarget,
    interval: Option<Duration>,
    max_runtime: Option<Duration>,
    event_tx: mpsc::Sender<SchedulerEvent>,
}

impl Scheduler {
    /// Create a new scheduler
    ///
    /// # Returns
    ///
    /// A tuple of (scheduler, event_receiver) where event_receiver yields
    /// scheduler events. Dropping the receiver is fine; events are then
    /// discarded.
    pub fn new(
        reconciler: Reconciler,
        target: ReconcileTarget,
        config: SchedulerConfig,
    ) -> Result<(Self, mpsc::Receiver<SchedulerEvent>)> {
        if config.interval == Some(Duration::ZERO) {
            return Err(Error::config("scheduler interval must be > 0"));
        }
        if config.event_channel_capacity == 0 {
            return Err(Error::config("event channel capacity must be > 0"));
        }

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let scheduler = Self {
            reconciler,
            target,
            interval: config.interval,
            max_runtime: config.max_runtime,
            event_tx: tx,
        };

        Ok((scheduler, rx))
    }

    /// Run until `shutdown` resolves
    ///
    /// The first cycle always runs to completion before `shutdown` is
    /// consulted.
    pub async fn run_until<F>(&self, shutdown: F) -> StopReason
    where
        F: Future<Output = ()>,
    {
        let started_at = Instant::now();
        self.emit_event(SchedulerEvent::Started {
            interval: self.interval,
        });

        let mut cycle = 0u64;

        // First run
        cycle += 1;
        self.run_cycle(cycle).await;

        let Some(period) = self.interval else {
            debug!("No interval set, exiting after first run");
            return self.stop(StopReason::RunOnce);
        };

        info!("Scheduling reconciliation every {:?}", period);

        let Some(first_tick) = Instant::now().checked_add(period) else {
            warn!("Interval {:?} is out of range, exiting after first run", period);
            return self.stop(StopReason::RunOnce);
        };

        let mut ticker = tokio::time::interval_at(first_tick, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut ticks = IntervalStream::new(ticker);

        let deadline = runtime_limit(started_at, self.max_runtime);
        tokio::pin!(shutdown);
        tokio::pin!(deadline);

        let reason = loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    break StopReason::Shutdown;
                }

                _ = &mut deadline => {
                    info!("Maximum runtime reached");
                    break StopReason::Deadline;
                }

                Some(_) = ticks.next() => {
                    cycle += 1;
                    self.run_cycle(cycle).await;
                }
            }
        };

        self.stop(reason)
    }

    async fn run_cycle(&self, cycle: u64) {
        debug!("Starting cycle {}", cycle);

        match self.reconciler.run_cycle(&self.target).await {
            Some(outcome) => {
                self.emit_event(SchedulerEvent::CycleCompleted { cycle, outcome });
            }
            None => {
                self.emit_event(SchedulerEvent::CycleFailed { cycle });
            }
        }
    }

    fn stop(&self, reason: StopReason) -> StopReason {
        info!("Scheduler stopped: {:?}", reason);
        self.emit_event(SchedulerEvent::Stopped { reason });
        reason
    }

    /// Emit a scheduler event
    fn emit_event(&self, event: SchedulerEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
            }
            Err(TrySendError::Closed(_)) => {
                trace!("Event receiver dropped");
            }
        }
    }
}

/// Resolve once `max_runtime` has elapsed since `started_at`
///
/// A limit too large to represent as an instant never resolves.
async fn runtime_limit(started_at: Instant, max_runtime: Option<Duration>) {
    match max_runtime.and_then(|limit| started_at.checked_add(limit)) {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}
