mod common;

use std::time::Duration;

use common::{Harness, api_url, fast_timings, health_body, mount_agents, wait_until};
use opbridge::error::TransitionError;
use opbridge::event::ConsoleEvent;
use opbridge::session::SpawnMode;
use opbridge::spawn::SpawnRequest;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_health(server: &MockServer, response: ResponseTemplate, times: Option<u64>) {
    let mock = Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(response);
    let mock = match times {
        Some(n) => mock.up_to_n_times(n),
        None => mock,
    };
    mock.mount(server).await;
}

fn health_ok(active: Option<&str>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(health_body(active))
}

async fn health_requests(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == "/api/health")
        .count()
}

// ============================================================
// Probing
// ============================================================

#[tokio::test]
async fn probe_reports_online_with_uptime() {
    let server = MockServer::start().await;
    mount_health(&server, health_ok(None), None).await;

    let mut harness = Harness::for_server(&server, fast_timings());
    let snapshot = harness.prober.probe().await;

    assert!(snapshot.online);
    assert_eq!(snapshot.uptime_seconds, Some(3725));
    assert!(snapshot.active_spawn_agent_id.is_none());
    assert!(
        harness
            .drain_events()
            .iter()
            .any(|e| matches!(e, ConsoleEvent::Health(h) if h.online))
    );
}

#[tokio::test]
async fn non_success_status_is_offline() {
    let server = MockServer::start().await;
    mount_health(&server, ResponseTemplate::new(503), None).await;

    let harness = Harness::for_server(&server, fast_timings());
    let snapshot = harness.prober.probe().await;
    assert!(!snapshot.online);
    assert!(snapshot.uptime_seconds.is_none());
}

#[tokio::test]
async fn unreachable_bridge_is_offline() {
    let harness = Harness::new("http://127.0.0.1:1/api", fast_timings());
    assert!(!harness.prober.probe().await.online);
}

#[tokio::test]
async fn run_probes_immediately_and_stops_on_cancel() {
    let server = MockServer::start().await;
    mount_health(&server, health_ok(None), None).await;

    let harness = Harness::for_server(&server, fast_timings());
    let cancel = CancellationToken::new();
    let task = tokio::spawn(
        harness
            .prober
            .clone()
            .run(harness.coordinator.clone(), cancel.clone()),
    );

    let mut seen = 0;
    for _ in 0..100 {
        seen = health_requests(&server).await;
        if seen > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(seen, 1);

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(2), task)
        .await
        .expect("prober did not stop")
        .unwrap();
}

// ============================================================
// Discovering a spawn started elsewhere
// ============================================================

#[tokio::test]
async fn active_spawn_on_first_probe_enters_observing() {
    let server = MockServer::start().await;
    mount_health(&server, health_ok(Some("bot3")), None).await;
    Mock::given(method("POST"))
        .and(path("/api/spawn-agent"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let harness = Harness::for_server(&server, fast_timings());
    harness.prober.probe_once(&harness.coordinator).await;

    let snapshot = harness.state.snapshot();
    assert_eq!(snapshot.mode(), SpawnMode::Observing);
    assert!(snapshot.active());
    assert_eq!(snapshot.agent_id(), Some("bot3"));

    let refused = harness
        .coordinator
        .submit(SpawnRequest::new("bot4", "r", "d", "t"))
        .await;
    assert!(matches!(
        refused,
        Err(TransitionError::NotIdle {
            mode: SpawnMode::Observing,
            ..
        })
    ));
}

#[tokio::test]
async fn observed_spawn_clearing_returns_to_idle_and_refreshes_once() {
    let server = MockServer::start().await;
    mount_health(&server, health_ok(Some("bot3")), Some(2)).await;
    mount_health(&server, health_ok(None), None).await;
    mount_agents(&server, 1).await;

    let harness = Harness::for_server(&server, fast_timings());
    harness.prober.probe_once(&harness.coordinator).await;
    assert_eq!(harness.state.mode(), SpawnMode::Observing);

    let inventory = harness.inventory.clone();
    assert!(wait_until(Duration::from_secs(3), || inventory.current().len() == 2).await);

    assert!(harness.state.is_idle());
    let notice = harness.notices.last();
    assert_eq!(notice.title, "Spawn completed");
    assert_eq!(notice.detail.as_deref(), Some("Agent \"bot3\" finished spawning."));
    assert_eq!(health_requests(&server).await, 3);
}

#[tokio::test]
async fn transient_probe_failures_do_not_end_observation() {
    let server = MockServer::start().await;
    mount_health(&server, health_ok(Some("bot3")), Some(1)).await;
    mount_health(&server, ResponseTemplate::new(500), Some(3)).await;
    mount_health(&server, health_ok(None), None).await;
    mount_agents(&server, 1).await;

    let harness = Harness::for_server(&server, fast_timings());
    let watcher = harness.coordinator.observe("bot3").unwrap();
    tokio::time::timeout(Duration::from_secs(3), watcher)
        .await
        .expect("observer did not finish")
        .unwrap();

    // One success, three failures, then the clearing probe.
    assert_eq!(health_requests(&server).await, 5);
    assert!(harness.state.is_idle());
    assert_eq!(harness.notices.titles(), vec!["Spawn completed".to_string()]);
}

#[tokio::test]
async fn different_active_agent_ends_observation() {
    let server = MockServer::start().await;
    mount_health(&server, health_ok(Some("bot4")), None).await;
    mount_agents(&server, 1).await;

    let harness = Harness::for_server(&server, fast_timings());
    let watcher = harness.coordinator.observe("bot3").unwrap();
    tokio::time::timeout(Duration::from_secs(3), watcher)
        .await
        .expect("observer did not finish")
        .unwrap();

    assert!(harness.state.is_idle());
    assert_eq!(
        harness.notices.last().detail.as_deref(),
        Some("Agent \"bot3\" finished spawning.")
    );
}

#[tokio::test]
async fn discovery_is_ignored_while_owned() {
    let server = MockServer::start().await;
    mount_health(&server, health_ok(Some("elsewhere")), None).await;

    let harness = Harness::for_server(&server, fast_timings());
    let attempt = harness.state.begin_owned("bot1").unwrap();

    let snapshot = harness.prober.probe_once(&harness.coordinator).await;
    assert_eq!(snapshot.active_spawn_agent_id.as_deref(), Some("elsewhere"));
    assert_eq!(harness.state.mode(), SpawnMode::Owned);
    assert_eq!(harness.state.snapshot().agent_id(), Some("bot1"));

    assert!(attempt.settle());
}

#[tokio::test]
async fn observing_twice_is_refused() {
    let server = MockServer::start().await;
    mount_health(&server, health_ok(Some("bot3")), None).await;

    let harness = Harness::new(&api_url(&server), fast_timings());
    let _watcher = harness.coordinator.observe("bot3").unwrap();
    assert!(harness.coordinator.observe("bot3").is_err());
}
