//! Classification of a spawn attempt's result.
//!
//! [`SpawnOutcome::from_response`] turns whatever the bridge answered into
//! one of the terminal outcomes; [`SpawnOutcome::from_transport_error`]
//! covers the cases where no answer arrived at all. Both are pure so the
//! whole decision table is testable without a network.

use std::time::Duration;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::bridge::wire::{RawResponse, str_field, value_as_u64};
use crate::error::BridgeError;
use crate::format::{fmt_duration, tail_chars};
use crate::notify::Notice;

/// Characters of stderr kept from a failed spawn.
pub const STDERR_TAIL_CHARS: usize = 2000;
/// Characters of stdout kept from a failed spawn.
pub const STDOUT_TAIL_CHARS: usize = 1000;
/// Characters of a non-JSON error body kept as the stderr tail.
pub const RAW_BODY_TAIL_CHARS: usize = 3000;
/// Characters of stderr shown in the failure notice itself.
pub const NOTICE_STDERR_CHARS: usize = 500;

const BUSY_FALLBACK: &str = "Another spawn is in progress.";

/// Metadata of a successfully spawned agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpawnMeta {
    pub agent_id: String,
    pub port: Option<u16>,
    pub pid: Option<u32>,
    pub guild_configured: bool,
}

/// The bridge processed the request and reported a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpawnFailure {
    pub http_status: u16,
    pub exit_code: Option<i32>,
    pub stderr_tail: Option<String>,
    pub stdout_tail: Option<String>,
    /// Whether the bridge answered with a JSON payload.
    pub structured: bool,
}

/// Terminal result of one spawn attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SpawnOutcome {
    Success(SpawnMeta),
    Failure(SpawnFailure),
    /// The bridge is already running a spawn (HTTP 409).
    Busy(String),
    /// The client gave up waiting; the spawn may still finish server-side.
    TimedOut,
    /// No server judgment was obtained.
    ConnectionError(String),
}

impl SpawnOutcome {
    /// Classify a response that arrived. `requested_agent_id` fills in the
    /// agent id when the bridge's metadata omits it.
    pub fn from_response(raw: &RawResponse, requested_agent_id: &str) -> Self {
        let body = raw.json_object();

        if raw.status == 409 {
            let detail = body
                .as_ref()
                .and_then(|b| str_field(b, "detail"))
                .unwrap_or_else(|| BUSY_FALLBACK.to_string());
            return SpawnOutcome::Busy(detail);
        }

        let Some(body) = body else {
            return SpawnOutcome::Failure(SpawnFailure {
                http_status: raw.status,
                exit_code: None,
                stderr_tail: Some(tail_chars(&raw.body, RAW_BODY_TAIL_CHARS))
                    .filter(|s| !s.trim().is_empty()),
                stdout_tail: None,
                structured: false,
            });
        };

        let ok = body.get("ok").and_then(Value::as_bool).unwrap_or(false);
        if raw.is_success() && ok {
            SpawnOutcome::Success(spawn_meta(&body, requested_agent_id))
        } else {
            SpawnOutcome::Failure(failure_from_payload(raw.status, &body))
        }
    }

    /// Classify a request that produced no response.
    ///
    /// An abort is only ever requested by the hard timeout, so it maps to
    /// [`SpawnOutcome::TimedOut`]; everything else is a connection problem.
    pub fn from_transport_error(err: &BridgeError) -> Self {
        match err {
            BridgeError::Aborted => SpawnOutcome::TimedOut,
            other => SpawnOutcome::ConnectionError(other.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SpawnOutcome::Success(_))
    }

    /// Whether resolution should trigger an inventory refresh. A busy
    /// rejection changed nothing; every other outcome may have.
    pub fn refreshes_inventory(&self) -> bool {
        !matches!(self, SpawnOutcome::Busy(_))
    }

    /// Short label for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            SpawnOutcome::Success(_) => "success",
            SpawnOutcome::Failure(_) => "failure",
            SpawnOutcome::Busy(_) => "busy",
            SpawnOutcome::TimedOut => "timed_out",
            SpawnOutcome::ConnectionError(_) => "connection_error",
        }
    }

    /// The notice to show the operator for this outcome.
    pub fn notice(&self, requested_agent_id: &str, elapsed: Duration) -> Notice {
        let elapsed = fmt_duration(elapsed);
        match self {
            SpawnOutcome::Success(meta) => {
                let id = if meta.agent_id.is_empty() {
                    requested_agent_id
                } else {
                    meta.agent_id.as_str()
                };
                Notice::success(
                    format!("Agent \"{id}\" spawned"),
                    format!(
                        "Port {} | PID {} | {elapsed}",
                        display_or_unknown(meta.port),
                        display_or_unknown(meta.pid),
                    ),
                )
            }
            SpawnOutcome::Failure(failure) if failure.structured => {
                let mut detail = format!(
                    "Exit {} after {elapsed}",
                    display_or_unknown(failure.exit_code)
                );
                if let Some(stderr) = &failure.stderr_tail {
                    detail.push('\n');
                    detail.push_str(&tail_chars(stderr, NOTICE_STDERR_CHARS));
                }
                Notice::error("Spawn failed", detail)
            }
            SpawnOutcome::Failure(failure) => Notice::error(
                "Spawn failed",
                format!("HTTP {} after {elapsed}", failure.http_status),
            ),
            SpawnOutcome::Busy(detail) => Notice::info("Spawn busy", detail.clone()),
            SpawnOutcome::TimedOut => Notice::error(
                "Spawn timed out",
                format!("No response after {elapsed}. The agent may still be starting."),
            ),
            SpawnOutcome::ConnectionError(message) => {
                Notice::error("Connection failed", format!("{message} after {elapsed}"))
            }
        }
    }
}

fn display_or_unknown<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "?".to_string(), |v| v.to_string())
}

fn spawn_meta(body: &Map<String, Value>, requested_agent_id: &str) -> SpawnMeta {
    let empty = Map::new();
    let spawn = body.get("spawn").and_then(Value::as_object).unwrap_or(&empty);

    let guild_configured = spawn
        .get("guild_configured")
        .or_else(|| body.get("guild_configured"))
        .and_then(Value::as_bool)
        .unwrap_or(false);

    SpawnMeta {
        agent_id: str_field(spawn, "agent_id").unwrap_or_else(|| requested_agent_id.to_string()),
        port: spawn
            .get("port")
            .and_then(value_as_u64)
            .and_then(|p| u16::try_from(p).ok()),
        pid: spawn
            .get("pid")
            .and_then(value_as_u64)
            .and_then(|p| u32::try_from(p).ok()),
        guild_configured,
    }
}

fn failure_from_payload(status: u16, body: &Map<String, Value>) -> SpawnFailure {
    let stderr_tail = str_field(body, "stderr")
        .or_else(|| str_field(body, "detail"))
        .or_else(|| str_field(body, "error"))
        .map(|s| tail_chars(&s, STDERR_TAIL_CHARS));

    SpawnFailure {
        http_status: status,
        exit_code: body
            .get("exit_code")
            .and_then(Value::as_i64)
            .and_then(|c| i32::try_from(c).ok()),
        stderr_tail,
        stdout_tail: str_field(body, "stdout").map(|s| tail_chars(&s, STDOUT_TAIL_CHARS)),
        structured: true,
    }
}
