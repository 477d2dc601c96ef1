//! JSON shapes exchanged with the operator bridge.
//!
//! Decoding is deliberately lenient: the bridge's registry is a hand-edited
//! JSON file and its spawn metadata is scraped from script stdout, so numbers
//! sometimes arrive as strings and fields come and go.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// `GET /health`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HealthResponse {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub uptime_seconds: Option<u64>,
    #[serde(default, deserialize_with = "non_empty_string")]
    pub active_spawn: Option<String>,
}

/// `GET /agents`: agent id -> registry entry, kept raw for lenient decoding.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgentsResponse {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub agents: BTreeMap<String, Value>,
}

/// `POST /stop-agent` request body.
#[derive(Debug, Serialize)]
pub struct StopPayload<'a> {
    pub agent_id: &'a str,
}

/// Status and body of a response the caller classifies itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse the body as a JSON object, if it is one.
    pub fn json_object(&self) -> Option<serde_json::Map<String, Value>> {
        match serde_json::from_str::<Value>(&self.body).ok()? {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }
}

/// Read a non-negative integer from a number or a numeric string.
pub fn value_as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Read a non-empty string field from a JSON object.
pub fn str_field(map: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    map.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn lenient_u64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(value.as_ref().and_then(value_as_u64))
}

fn null_as_empty<'de, D: Deserializer<'de>>(d: D) -> Result<BTreeMap<String, Value>, D::Error> {
    Ok(Option::<BTreeMap<String, Value>>::deserialize(d)?.unwrap_or_default())
}

fn non_empty_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn health_with_active_spawn() {
        let h: HealthResponse =
            serde_json::from_value(json!({"ok": true, "uptime_seconds": 120, "active_spawn": "bot3"}))
                .unwrap();
        assert_eq!(h.uptime_seconds, Some(120));
        assert_eq!(h.active_spawn.as_deref(), Some("bot3"));
    }

    #[test]
    fn health_null_and_empty_spawn_are_absent() {
        let h: HealthResponse = serde_json::from_value(json!({"active_spawn": null})).unwrap();
        assert!(h.active_spawn.is_none());
        let h: HealthResponse = serde_json::from_value(json!({"active_spawn": ""})).unwrap();
        assert!(h.active_spawn.is_none());
        let h: HealthResponse = serde_json::from_value(json!({})).unwrap();
        assert!(h.uptime_seconds.is_none());
    }

    #[test]
    fn uptime_accepts_string_and_float() {
        let h: HealthResponse = serde_json::from_value(json!({"uptime_seconds": "77"})).unwrap();
        assert_eq!(h.uptime_seconds, Some(77));
        let h: HealthResponse = serde_json::from_value(json!({"uptime_seconds": 12.9})).unwrap();
        assert_eq!(h.uptime_seconds, Some(12));
    }

    #[test]
    fn agents_missing_map_is_empty() {
        let a: AgentsResponse = serde_json::from_value(json!({"ok": true})).unwrap();
        assert!(a.agents.is_empty());
    }

    #[test]
    fn agents_null_map_is_empty() {
        let a: AgentsResponse = serde_json::from_value(json!({"agents": null})).unwrap();
        assert!(a.agents.is_empty());
    }

    #[test]
    fn raw_response_json_object_only() {
        let raw = RawResponse { status: 500, body: "[1,2]".to_string() };
        assert!(raw.json_object().is_none());
        let raw = RawResponse { status: 500, body: "<html>".to_string() };
        assert!(raw.json_object().is_none());
        let raw = RawResponse { status: 200, body: r#"{"ok":true}"#.to_string() };
        assert!(raw.json_object().is_some());
        assert!(raw.is_success());
    }

    #[test]
    fn value_as_u64_rejects_negative_and_garbage() {
        assert_eq!(value_as_u64(&json!(-3)), None);
        assert_eq!(value_as_u64(&json!("port")), None);
        assert_eq!(value_as_u64(&json!(true)), None);
        assert_eq!(value_as_u64(&json!(" 8101 ")), Some(8101));
    }
}
