//! Bridge liveness probing.
//!
//! [`HealthProber`] asks the bridge whether it is up and whether a spawn is
//! running. A failed probe is not an error to propagate: "offline" is the
//! answer. After each successful probe the prober hands a discovered
//! in-flight spawn to the coordinator, but only while the session is idle.

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::bridge::BridgeClient;
use crate::error::BridgeError;
use crate::event::{ConsoleEvent, EventSender, emit};
use crate::spawn::SpawnCoordinator;

/// Result of one health probe. Recomputed every time, never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthSnapshot {
    pub online: bool,
    pub uptime_seconds: Option<u64>,
    pub active_spawn_agent_id: Option<String>,
}

impl HealthSnapshot {
    pub fn offline() -> Self {
        Self::default()
    }
}

#[derive(Clone)]
pub struct HealthProber {
    bridge: BridgeClient,
    timeout: Duration,
    poll_interval: Duration,
    events: Option<EventSender>,
}

impl HealthProber {
    pub fn new(
        bridge: BridgeClient,
        timeout: Duration,
        poll_interval: Duration,
        events: Option<EventSender>,
    ) -> Self {
        Self {
            bridge,
            timeout,
            poll_interval,
            events,
        }
    }

    /// Probe once, keeping failure distinct from an answer.
    pub async fn try_probe(&self) -> Result<HealthSnapshot, BridgeError> {
        let health = self.bridge.health(self.timeout).await?;
        Ok(HealthSnapshot {
            online: true,
            uptime_seconds: health.uptime_seconds,
            active_spawn_agent_id: health.active_spawn,
        })
    }

    /// Probe once; any failure yields the offline snapshot.
    pub async fn probe(&self) -> HealthSnapshot {
        let snapshot = match self.try_probe().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::debug!("Health probe failed: {e}");
                HealthSnapshot::offline()
            }
        };
        self.publish(snapshot.clone());
        snapshot
    }

    pub(crate) fn publish(&self, snapshot: HealthSnapshot) {
        emit(self.events.as_ref(), ConsoleEvent::Health(snapshot));
    }

    /// Probe, publish, and start observing a discovered spawn if idle.
    pub async fn probe_once(&self, coordinator: &SpawnCoordinator) -> HealthSnapshot {
        let snapshot = self.probe().await;

        if let Some(agent_id) = &snapshot.active_spawn_agent_id {
            if coordinator.state().is_idle() {
                if let Err(e) = coordinator.observe(agent_id) {
                    // Lost a race with a submit or another observer.
                    tracing::debug!(%agent_id, "Not observing discovered spawn: {e}");
                }
            }
        }

        snapshot
    }

    /// Probe immediately, then every poll interval until `cancel` fires.
    pub async fn run(self, coordinator: SpawnCoordinator, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    self.probe_once(&coordinator).await;
                }
            }
        }
        tracing::debug!("Health prober stopped");
    }
}
