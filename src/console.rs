//! Wiring for one console session.
//!
//! A [`Console`] owns the bridge client and the one [`SharedSpawnState`] of
//! the session, and hands clones of both to the prober, the inventory loader
//! and the coordinator. Headless commands and the dashboard both build
//! exactly one.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::bridge::BridgeClient;
use crate::config::AppConfig;
use crate::error::BridgeError;
use crate::event::EventSender;
use crate::health::HealthProber;
use crate::inventory::InventoryLoader;
use crate::notify::Notifier;
use crate::session::SharedSpawnState;
use crate::spawn::SpawnCoordinator;

#[derive(Clone)]
pub struct Console {
    pub bridge: BridgeClient,
    pub state: SharedSpawnState,
    pub prober: HealthProber,
    pub inventory: InventoryLoader,
    pub coordinator: SpawnCoordinator,
    pub notifier: Arc<dyn Notifier>,
}

impl Console {
    pub fn new(
        config: &AppConfig,
        notifier: Arc<dyn Notifier>,
        events: Option<EventSender>,
    ) -> Result<Self, BridgeError> {
        let bridge = BridgeClient::new(&config.bridge_url, config.token.clone())?;
        let state = SharedSpawnState::new(events.clone());
        let prober = HealthProber::new(
            bridge.clone(),
            config.health_timeout(),
            config.health_poll(),
            events.clone(),
        );
        let inventory = InventoryLoader::new(
            bridge.clone(),
            config.inventory_timeout(),
            config.agent_poll(),
            events.clone(),
        );
        let coordinator = SpawnCoordinator::new(
            bridge.clone(),
            state.clone(),
            prober.clone(),
            inventory.clone(),
            notifier.clone(),
            events,
            config.spawn_timings(),
        );

        tracing::debug!(
            bridge_url = %bridge.base_url(),
            authenticated = config.token.is_some(),
            "Console initialized"
        );

        Ok(Self {
            bridge,
            state,
            prober,
            inventory,
            coordinator,
            notifier,
        })
    }

    /// Start the health prober and inventory poller. Both stop when
    /// `cancel` fires.
    pub fn start_background(&self, cancel: &CancellationToken) -> Vec<JoinHandle<()>> {
        let health = tokio::spawn(
            self.prober
                .clone()
                .run(self.coordinator.clone(), cancel.clone()),
        );
        let inventory = tokio::spawn(self.inventory.clone().run(cancel.clone()));
        vec![health, inventory]
    }
}
