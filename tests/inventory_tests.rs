mod common;

use common::{Harness, agents_body, fast_timings, mount_agents};
use opbridge::event::ConsoleEvent;
use opbridge::inventory::InventorySummary;
use opbridge::notify::Severity;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================
// Loading the registry
// ============================================================

#[tokio::test]
async fn refresh_replaces_set_sorted_by_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/agents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "agents": {
                "zeta": {"role": "scribe"},
                "alpha": {"role": "moderator", "personality": "stern", "port": "8101", "pid": 11}
            }
        })))
        .mount(&server)
        .await;

    let mut harness = Harness::for_server(&server, fast_timings());
    let agents = harness.inventory.refresh().await;

    let ids: Vec<&str> = agents.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["alpha", "zeta"]);
    assert_eq!(agents[0].description.as_deref(), Some("stern"));
    assert_eq!(agents[0].port, Some(8101));
    assert_eq!(
        harness.inventory.summary(),
        InventorySummary { total: 2, active: 1 }
    );
    assert!(
        harness
            .drain_events()
            .iter()
            .any(|e| matches!(e, ConsoleEvent::Inventory(a) if a.len() == 2))
    );
}

#[tokio::test]
async fn failed_refresh_keeps_previous_set() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/agents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(agents_body()))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/agents"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut harness = Harness::for_server(&server, fast_timings());
    assert_eq!(harness.inventory.refresh().await.len(), 2);
    harness.drain_events();

    let after_failure = harness.inventory.refresh().await;
    assert_eq!(after_failure.len(), 2);
    assert_eq!(harness.inventory.current().len(), 2);
    assert!(harness.notices.all().is_empty());
    assert!(
        !harness
            .drain_events()
            .iter()
            .any(|e| matches!(e, ConsoleEvent::Inventory(_)))
    );
}

#[tokio::test]
async fn null_agents_map_empties_the_set() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/agents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(agents_body()))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/agents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"agents": null})))
        .mount(&server)
        .await;

    let harness = Harness::for_server(&server, fast_timings());
    assert_eq!(harness.inventory.refresh().await.len(), 2);
    assert!(harness.inventory.refresh().await.is_empty());
    assert!(harness.inventory.current().is_empty());
}

#[tokio::test]
async fn garbage_body_is_a_silent_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/agents"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let harness = Harness::for_server(&server, fast_timings());
    assert!(harness.inventory.refresh().await.is_empty());
}

// ============================================================
// Stopping an agent
// ============================================================

#[tokio::test]
async fn stop_notifies_and_refreshes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/stop-agent"))
        .and(body_json(json!({"agent_id": "bot1"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"ok": true, "agent_id": "bot1", "stopped": true})),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_agents(&server, 1).await;

    let harness = Harness::for_server(&server, fast_timings());
    let stopped = harness
        .inventory
        .stop_agent("bot1", &*harness.notices)
        .await;

    assert!(stopped);
    let notice = harness.notices.last();
    assert_eq!(notice.severity, Severity::Success);
    assert_eq!(notice.title, "Agent stopped");
    assert_eq!(notice.detail.as_deref(), Some("bot1 gateway terminated."));
    assert_eq!(harness.inventory.current().len(), 2);
}

#[tokio::test]
async fn stop_of_unknown_agent_shows_bridge_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/stop-agent"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": "not_found",
            "detail": "agent 'ghost' not in registry"
        })))
        .mount(&server)
        .await;
    mount_agents(&server, 1).await;

    let harness = Harness::for_server(&server, fast_timings());
    let stopped = harness
        .inventory
        .stop_agent("ghost", &*harness.notices)
        .await;

    assert!(!stopped);
    let notice = harness.notices.last();
    assert_eq!(notice.severity, Severity::Error);
    assert_eq!(notice.title, "Stop failed");
    assert_eq!(notice.detail.as_deref(), Some("agent 'ghost' not in registry"));
}

#[tokio::test]
async fn stop_without_detail_falls_back_to_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/stop-agent"))
        .respond_with(ResponseTemplate::new(503).set_body_string(""))
        .mount(&server)
        .await;
    mount_agents(&server, 1).await;

    let harness = Harness::for_server(&server, fast_timings());
    harness
        .inventory
        .stop_agent("bot1", &*harness.notices)
        .await;
    assert_eq!(harness.notices.last().detail.as_deref(), Some("HTTP 503"));
}
