//! Spawn coordination: the one-spawn-at-a-time state machine.
//!
//! [`SpawnCoordinator`] drives an owned spawn from submission to resolution
//! and watches spawns discovered already in flight on the bridge. All of its
//! transitions go through the session's [`SharedSpawnState`]:
//!
//! - `submit` enters `Owned`, arms the hard timeout and the progress ticker,
//!   sends the request, classifies the result, then returns to `Idle`.
//! - `observe` enters `Observing` and re-probes health until the bridge no
//!   longer reports the spawn, then returns to `Idle`. Observation has no
//!   timeout of its own; only the submitting client enforces one.
//!
//! Every resolution notifies the operator and, unless the bridge said it was
//! busy, refreshes the agent inventory exactly once.

pub mod outcome;
pub mod progress;
pub mod request;

pub use outcome::{SpawnFailure, SpawnMeta, SpawnOutcome};
pub use progress::{ProgressEstimate, SpawnPhase, TimerGuard};
pub use request::{SpawnRequest, validate_agent_id};

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::bridge::BridgeClient;
use crate::error::TransitionError;
use crate::event::{ConsoleEvent, EventSender, emit};
use crate::health::HealthProber;
use crate::inventory::InventoryLoader;
use crate::notify::{Notice, Notifier};
use crate::session::{SharedSpawnState, SpawnAttempt};
use progress::{start_deadline, start_progress_ticker};

/// Timing knobs for spawn coordination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnTimings {
    /// Client-side limit on an owned spawn request.
    pub hard_timeout: Duration,
    /// Health re-probe cadence while observing.
    pub observe_interval: Duration,
    /// Progress estimate refresh cadence.
    pub progress_tick: Duration,
    /// Assumed spawn duration that maps to 100% (before the cap).
    pub estimate_ceiling: Duration,
}

impl Default for SpawnTimings {
    fn default() -> Self {
        Self {
            hard_timeout: Duration::from_secs(300),
            observe_interval: Duration::from_secs(5),
            progress_tick: Duration::from_millis(500),
            estimate_ceiling: Duration::from_secs(180),
        }
    }
}

#[derive(Clone)]
pub struct SpawnCoordinator {
    bridge: BridgeClient,
    state: SharedSpawnState,
    prober: HealthProber,
    inventory: InventoryLoader,
    notifier: Arc<dyn Notifier>,
    events: Option<EventSender>,
    timings: SpawnTimings,
}

impl SpawnCoordinator {
    pub fn new(
        bridge: BridgeClient,
        state: SharedSpawnState,
        prober: HealthProber,
        inventory: InventoryLoader,
        notifier: Arc<dyn Notifier>,
        events: Option<EventSender>,
        timings: SpawnTimings,
    ) -> Self {
        Self {
            bridge,
            state,
            prober,
            inventory,
            notifier,
            events,
            timings,
        }
    }

    pub fn state(&self) -> &SharedSpawnState {
        &self.state
    }

    pub fn timings(&self) -> SpawnTimings {
        self.timings
    }

    /// Submit a spawn and wait for it to resolve.
    ///
    /// Refused with [`TransitionError`] unless the session is `Idle`; in that
    /// case nothing is sent. Otherwise always resolves to a [`SpawnOutcome`]
    /// with the session back in `Idle`.
    pub async fn submit(&self, request: SpawnRequest) -> Result<SpawnOutcome, TransitionError> {
        let attempt = self.state.begin_owned(&request.agent_id)?;
        let started_at = attempt.started_at();

        tracing::info!(
            agent_id = %request.agent_id,
            role = %request.role,
            attempt = attempt.number(),
            timeout_secs = self.timings.hard_timeout.as_secs(),
            "Spawn submitted"
        );

        let abort = CancellationToken::new();
        let deadline = start_deadline(self.timings.hard_timeout, abort.clone());
        let ticker = start_progress_ticker(
            started_at,
            self.timings.progress_tick,
            self.timings.estimate_ceiling,
            self.events.clone(),
        );

        let response = self.bridge.spawn_agent(&request, &abort).await;

        // Timers go first so no tick can land after the state settles.
        ticker.stop().await;
        deadline.stop().await;

        let elapsed = started_at.elapsed();
        let outcome = match response {
            Ok(raw) => SpawnOutcome::from_response(&raw, &request.agent_id),
            Err(err) => SpawnOutcome::from_transport_error(&err),
        };

        if outcome.is_success() {
            emit(
                self.events.as_ref(),
                ConsoleEvent::Progress(ProgressEstimate::complete(elapsed)),
            );
        }
        attempt.settle();

        tracing::info!(
            agent_id = %request.agent_id,
            outcome = outcome.kind(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Spawn resolved"
        );

        self.notifier.notify(outcome.notice(&request.agent_id, elapsed));
        emit(self.events.as_ref(), ConsoleEvent::SpawnFinished(outcome.clone()));

        if outcome.refreshes_inventory() {
            self.inventory.refresh().await;
        }

        Ok(outcome)
    }

    /// Start watching a spawn the bridge reports as already running.
    ///
    /// The transition to `Observing` happens before this returns, so the
    /// caller can rely on the session no longer being `Idle`. The returned
    /// task finishes once the bridge stops reporting the spawn.
    pub fn observe(&self, agent_id: &str) -> Result<JoinHandle<()>, TransitionError> {
        let attempt = self.state.begin_observing(agent_id)?;
        tracing::info!(agent_id, "Spawn already in progress on the bridge; observing");

        let this = self.clone();
        Ok(tokio::spawn(async move { this.watch_until_clear(attempt).await }))
    }

    async fn watch_until_clear(self, attempt: SpawnAttempt) {
        let agent_id = attempt.agent_id().to_string();

        loop {
            tokio::time::sleep(self.timings.observe_interval).await;

            match self.prober.try_probe().await {
                Ok(snapshot) => {
                    let still_running =
                        snapshot.active_spawn_agent_id.as_deref() == Some(agent_id.as_str());
                    self.prober.publish(snapshot);
                    if !still_running {
                        break;
                    }
                }
                Err(e) => {
                    // One dropped health check must not read as completion.
                    tracing::debug!(%agent_id, "Health probe failed while observing: {e}");
                }
            }
        }

        attempt.settle();
        tracing::info!(%agent_id, "Observed spawn finished");

        self.notifier.notify(Notice::info(
            "Spawn completed",
            format!("Agent \"{agent_id}\" finished spawning."),
        ));
        self.inventory.refresh().await;
    }
}
