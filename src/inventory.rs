//! Agent inventory: the bridge's registry of spawned agents.
//!
//! Each successful load replaces the previous set wholesale. A failed load
//! keeps the last good set in place and stays quiet; the health prober is
//! what tells the operator the bridge is down.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::bridge::BridgeClient;
use crate::bridge::wire::{str_field, value_as_u64};
use crate::event::{ConsoleEvent, EventSender, emit};
use crate::notify::{Notice, Notifier};

/// One agent in the bridge's registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentRecord {
    pub id: String,
    pub role: Option<String>,
    pub description: Option<String>,
    pub port: Option<u16>,
    pub pid: Option<u32>,
}

impl AgentRecord {
    /// Build a record from a raw registry entry. Non-object entries yield a
    /// record with only the id.
    pub fn from_entry(id: &str, entry: &Value) -> Self {
        let Some(map) = entry.as_object() else {
            return Self {
                id: id.to_string(),
                role: None,
                description: None,
                port: None,
                pid: None,
            };
        };

        Self {
            id: id.to_string(),
            role: str_field(map, "role"),
            description: str_field(map, "personality").or_else(|| str_field(map, "description")),
            port: map
                .get("port")
                .and_then(value_as_u64)
                .and_then(|p| u16::try_from(p).ok()),
            pid: map
                .get("pid")
                .and_then(value_as_u64)
                .and_then(|p| u32::try_from(p).ok()),
        }
    }

    /// An agent with a recorded gateway pid counts as active.
    pub fn is_active(&self) -> bool {
        self.pid.is_some()
    }

    pub fn role_label(&self) -> &str {
        self.role.as_deref().unwrap_or("Agent")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InventorySummary {
    pub total: usize,
    pub active: usize,
}

impl InventorySummary {
    pub fn of(agents: &[AgentRecord]) -> Self {
        Self {
            total: agents.len(),
            active: agents.iter().filter(|a| a.is_active()).count(),
        }
    }
}

#[derive(Clone)]
pub struct InventoryLoader {
    bridge: BridgeClient,
    timeout: Duration,
    poll_interval: Duration,
    current: Arc<Mutex<Vec<AgentRecord>>>,
    events: Option<EventSender>,
}

impl InventoryLoader {
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
            current: Arc::new(Mutex::new(Vec::new())),
            events,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<AgentRecord>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The last successfully loaded set (empty before the first load).
    pub fn current(&self) -> Vec<AgentRecord> {
        self.lock().clone()
    }

    pub fn summary(&self) -> InventorySummary {
        InventorySummary::of(&self.lock())
    }

    /// Load the registry, replacing the current set on success.
    ///
    /// Returns the set now in effect: fresh on success, the previous one on
    /// failure.
    pub async fn refresh(&self) -> Vec<AgentRecord> {
        match self.bridge.agents(self.timeout).await {
            Ok(resp) => {
                let agents: Vec<AgentRecord> = resp
                    .agents
                    .iter()
                    .map(|(id, entry)| AgentRecord::from_entry(id, entry))
                    .collect();
                tracing::debug!(count = agents.len(), "Inventory refreshed");

                *self.lock() = agents.clone();
                emit(self.events.as_ref(), ConsoleEvent::Inventory(agents.clone()));
                agents
            }
            Err(e) => {
                tracing::debug!("Inventory refresh failed; keeping previous set: {e}");
                self.current()
            }
        }
    }

    /// Refresh immediately, then every poll interval until `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    self.refresh().await;
                }
            }
        }
        tracing::debug!("Inventory poller stopped");
    }

    /// Ask the bridge to stop an agent's gateway, notify, then refresh once.
    ///
    /// Returns whether the bridge confirmed the stop.
    pub async fn stop_agent(&self, agent_id: &str, notifier: &dyn Notifier) -> bool {
        let (stopped, notice) = match self.bridge.stop_agent(agent_id, self.timeout).await {
            Ok(raw) => {
                let body = raw.json_object();
                let ok = raw.is_success()
                    && body
                        .as_ref()
                        .and_then(|b| b.get("ok"))
                        .and_then(Value::as_bool)
                        .unwrap_or(false);
                if ok {
                    (
                        true,
                        Notice::success("Agent stopped", format!("{agent_id} gateway terminated.")),
                    )
                } else {
                    let detail = body
                        .as_ref()
                        .and_then(|b| str_field(b, "detail"))
                        .unwrap_or_else(|| format!("HTTP {}", raw.status));
                    (false, Notice::error("Stop failed", detail))
                }
            }
            Err(e) => (false, Notice::error("Stop failed", e.to_string())),
        };

        tracing::info!(agent_id, stopped, "Stop requested");
        notifier.notify(notice);
        self.refresh().await;
        stopped
    }
}
