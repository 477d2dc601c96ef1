#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use opbridge::bridge::BridgeClient;
use opbridge::event::ConsoleEvent;
use opbridge::health::HealthProber;
use opbridge::inventory::InventoryLoader;
use opbridge::notify::{Notice, Notifier};
use opbridge::session::SharedSpawnState;
use opbridge::spawn::{SpawnCoordinator, SpawnTimings};
use serde_json::json;
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN: &str = "test-token";

// ─── Recording notifier ───────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn all(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    pub fn titles(&self) -> Vec<String> {
        self.all().into_iter().map(|n| n.title).collect()
    }

    pub fn last(&self) -> Notice {
        self.all().pop().expect("no notice recorded")
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}

// ─── Harness ──────────────────────────────────────────────────────────

/// Millisecond-scale timings so scenarios run quickly.
pub fn fast_timings() -> SpawnTimings {
    SpawnTimings {
        hard_timeout: Duration::from_secs(5),
        observe_interval: Duration::from_millis(50),
        progress_tick: Duration::from_millis(20),
        estimate_ceiling: Duration::from_secs(180),
    }
}

/// Every console component wired to one bridge URL, sharing one session state.
pub struct Harness {
    pub coordinator: SpawnCoordinator,
    pub state: SharedSpawnState,
    pub prober: HealthProber,
    pub inventory: InventoryLoader,
    pub notices: Arc<RecordingNotifier>,
    pub events: UnboundedReceiver<ConsoleEvent>,
}

impl Harness {
    pub fn new(base_url: &str, timings: SpawnTimings) -> Self {
        let (tx, events) = unbounded_channel();
        let bridge = BridgeClient::new(base_url, Some(TOKEN.to_string())).unwrap();
        let state = SharedSpawnState::new(Some(tx.clone()));
        let prober = HealthProber::new(
            bridge.clone(),
            Duration::from_secs(2),
            Duration::from_secs(10),
            Some(tx.clone()),
        );
        let inventory = InventoryLoader::new(
            bridge.clone(),
            Duration::from_secs(2),
            Duration::from_secs(15),
            Some(tx.clone()),
        );
        let notices = Arc::new(RecordingNotifier::default());
        let coordinator = SpawnCoordinator::new(
            bridge,
            state.clone(),
            prober.clone(),
            inventory.clone(),
            notices.clone(),
            Some(tx),
            timings,
        );

        Self {
            coordinator,
            state,
            prober,
            inventory,
            notices,
            events,
        }
    }

    pub fn for_server(server: &MockServer, timings: SpawnTimings) -> Self {
        Self::new(&api_url(server), timings)
    }

    /// Everything published so far, without waiting.
    pub fn drain_events(&mut self) -> Vec<ConsoleEvent> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            out.push(event);
        }
        out
    }
}

pub fn api_url(server: &MockServer) -> String {
    format!("{}/api", server.uri())
}

// ─── Canned bridge responses ──────────────────────────────────────────

pub fn health_body(active_spawn: Option<&str>) -> serde_json::Value {
    json!({
        "ok": true,
        "service": "operator-bridge",
        "uptime_seconds": 3725,
        "active_spawn": active_spawn,
    })
}

pub fn agents_body() -> serde_json::Value {
    json!({
        "agents": {
            "bot1": {"role": "moderator", "description": "keeps order", "port": 8101, "pid": 4521},
            "bot2": {"role": "greeter", "port": 8102}
        }
    })
}

/// Mount `GET /api/agents` expecting exactly `times` calls.
pub async fn mount_agents(server: &MockServer, times: u64) {
    Mock::given(method("GET"))
        .and(path("/api/agents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(agents_body()))
        .expect(times)
        .mount(server)
        .await;
}

/// Poll `cond` every 10ms until it holds or `limit` passes.
pub async fn wait_until(limit: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}
