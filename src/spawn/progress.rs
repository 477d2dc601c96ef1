//! Cosmetic progress estimation for an owned spawn, and the timers scoped
//! to one attempt.
//!
//! The bridge gives no incremental feedback while its spawn script runs, so
//! progress is a guess from elapsed time: linear against an assumed ceiling,
//! capped below 100% until the bridge confirms success. Nothing else may
//! treat the estimate as ground truth.
//!
//! Both per-attempt timers (the progress ticker and the hard-timeout
//! deadline) are returned as [`TimerGuard`]s that abort their task on drop,
//! so leaving the attempt by any path stops them. Aborting only takes effect
//! at the task's next await, so callers that must not see a late tick use
//! [`TimerGuard::stop`], which waits for the task to be gone.

use std::fmt;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::event::{ConsoleEvent, EventSender, emit};

/// Highest percentage shown before the bridge confirms success.
pub const PROGRESS_CAP_PERCENT: f64 = 95.0;

/// Coarse textual phase derived from elapsed time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnPhase {
    /// 0-15s
    Allocating,
    /// 15-45s
    Configuring,
    /// 45-90s
    Starting,
    /// 90s+
    Finalizing,
    /// Confirmed by the bridge.
    Complete,
}

impl SpawnPhase {
    pub fn for_elapsed(elapsed: Duration) -> Self {
        match elapsed.as_secs_f64() {
            s if s < 15.0 => SpawnPhase::Allocating,
            s if s < 45.0 => SpawnPhase::Configuring,
            s if s < 90.0 => SpawnPhase::Starting,
            _ => SpawnPhase::Finalizing,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SpawnPhase::Allocating => "Allocating port and environment...",
            SpawnPhase::Configuring => "Configuring Discord gateway...",
            SpawnPhase::Starting => "Starting agent gateway...",
            SpawnPhase::Finalizing => "Finalizing setup...",
            SpawnPhase::Complete => "Spawn complete",
        }
    }
}

impl fmt::Display for SpawnPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressEstimate {
    /// 0.0..=95.0 while running, 100.0 once confirmed.
    pub percent: f64,
    pub phase: SpawnPhase,
    pub elapsed: Duration,
}

impl ProgressEstimate {
    /// Map elapsed time onto a capped percentage against `ceiling`.
    pub fn estimate(elapsed: Duration, ceiling: Duration) -> Self {
        let percent = if ceiling.is_zero() {
            PROGRESS_CAP_PERCENT
        } else {
            (elapsed.as_secs_f64() / ceiling.as_secs_f64() * 100.0).min(PROGRESS_CAP_PERCENT)
        };
        Self {
            percent,
            phase: SpawnPhase::for_elapsed(elapsed),
            elapsed,
        }
    }

    /// The only estimate allowed to reach 100%.
    pub fn complete(elapsed: Duration) -> Self {
        Self {
            percent: 100.0,
            phase: SpawnPhase::Complete,
            elapsed,
        }
    }
}

/// Handle to a timer task. Dropping it aborts the task.
#[derive(Debug)]
pub struct TimerGuard {
    handle: JoinHandle<()>,
}

impl TimerGuard {
    fn new(handle: JoinHandle<()>) -> Self {
        Self { handle }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Abort the task and wait until it can no longer run.
    pub async fn stop(mut self) {
        self.handle.abort();
        match (&mut self.handle).await {
            Err(e) if e.is_panic() => tracing::warn!("Timer task panicked: {e}"),
            _ => {}
        }
    }
}

impl Drop for TimerGuard {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Publish a [`ConsoleEvent::Progress`] every `tick`, starting immediately.
pub fn start_progress_ticker(
    started_at: std::time::Instant,
    tick: Duration,
    ceiling: Duration,
    events: Option<EventSender>,
) -> TimerGuard {
    let origin = tokio::time::Instant::from_std(started_at);
    TimerGuard::new(tokio::spawn(async move {
        let mut interval = tokio::time::interval(tick);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            let estimate = ProgressEstimate::estimate(origin.elapsed(), ceiling);
            emit(events.as_ref(), ConsoleEvent::Progress(estimate));
        }
    }))
}

/// Cancel `abort` once `timeout` elapses, unless the guard is dropped first.
pub fn start_deadline(timeout: Duration, abort: CancellationToken) -> TimerGuard {
    TimerGuard::new(tokio::spawn(async move {
        tokio::time::sleep(timeout).await;
        tracing::warn!(timeout_secs = timeout.as_secs(), "Spawn hard timeout reached; aborting request");
        abort.cancel();
    }))
}
