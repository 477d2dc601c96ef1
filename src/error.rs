use std::path::PathBuf;

use crate::session::SpawnMode;

/// Errors related to configuration loading and parsing.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config at {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid bridge URL `{url}`: {message}")]
    InvalidUrl { url: String, message: String },
}

/// Transport-level failures talking to the operator bridge.
///
/// These never carry a server judgment: an HTTP response that arrived,
/// whatever its status, is handed back to the caller as data.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("request aborted before a response arrived")]
    Aborted,

    #[error("bridge unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("bridge returned HTTP {status}")]
    Status { status: u16 },

    #[error("unexpected response body: {0}")]
    Decode(String),
}

/// A spawn-state transition that the current mode does not allow.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("a spawn is already {mode} (agent {agent_id})")]
    NotIdle { mode: SpawnMode, agent_id: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_idle_display_names_mode_and_agent() {
        let err = TransitionError::NotIdle {
            mode: SpawnMode::Observing,
            agent_id: "bot3".to_string(),
        };
        let display = err.to_string();
        assert!(display.contains("observing"));
        assert!(display.contains("bot3"));
    }

    #[test]
    fn status_display_includes_code() {
        let err = BridgeError::Status { status: 502 };
        assert_eq!(err.to_string(), "bridge returned HTTP 502");
    }
}
