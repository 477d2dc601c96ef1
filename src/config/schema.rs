use serde::Deserialize;
use std::path::PathBuf;

/// The TOML file structure for opbridge.toml.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub bridge: Option<BridgeSection>,
    pub timing: Option<TimingSection>,
    pub logging: Option<LoggingSection>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BridgeSection {
    pub url: Option<String>,
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimingSection {
    pub health_poll_secs: Option<u64>,
    pub agent_poll_secs: Option<u64>,
    pub health_timeout_secs: Option<u64>,
    pub inventory_timeout_secs: Option<u64>,
    pub spawn_timeout_secs: Option<u64>,
    pub observe_interval_secs: Option<u64>,
    pub progress_ceiling_secs: Option<u64>,
    pub progress_tick_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// JSONL file receiving every notice.
    pub activity_log: Option<String>,
    /// Where tracing output goes while the dashboard owns the terminal.
    pub log_file: Option<String>,
}

/// Fully-resolved runtime configuration. All fields have values.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bridge_url: String,
    pub token: Option<String>,
    pub health_poll_secs: u64,
    pub agent_poll_secs: u64,
    pub health_timeout_secs: u64,
    pub inventory_timeout_secs: u64,
    pub spawn_timeout_secs: u64,
    pub observe_interval_secs: u64,
    pub progress_ceiling_secs: u64,
    pub progress_tick_ms: u64,
    pub activity_log: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
}

/// Partial config used during merge. All fields are Option so that
/// missing fields don't override lower-priority values.
#[derive(Debug, Clone, Default)]
pub struct PartialConfig {
    pub bridge_url: Option<String>,
    pub token: Option<String>,
    pub health_poll_secs: Option<u64>,
    pub agent_poll_secs: Option<u64>,
    pub health_timeout_secs: Option<u64>,
    pub inventory_timeout_secs: Option<u64>,
    pub spawn_timeout_secs: Option<u64>,
    pub observe_interval_secs: Option<u64>,
    pub progress_ceiling_secs: Option<u64>,
    pub progress_tick_ms: Option<u64>,
    pub activity_log: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
}

impl ConfigFile {
    /// Flatten the sectioned file into a mergeable partial config.
    pub fn to_partial(self) -> PartialConfig {
        let bridge = self.bridge;
        let timing = self.timing;
        let logging = self.logging;

        PartialConfig {
            bridge_url: bridge.as_ref().and_then(|b| b.url.clone()),
            token: bridge.and_then(|b| b.token),
            health_poll_secs: timing.as_ref().and_then(|t| t.health_poll_secs),
            agent_poll_secs: timing.as_ref().and_then(|t| t.agent_poll_secs),
            health_timeout_secs: timing.as_ref().and_then(|t| t.health_timeout_secs),
            inventory_timeout_secs: timing.as_ref().and_then(|t| t.inventory_timeout_secs),
            spawn_timeout_secs: timing.as_ref().and_then(|t| t.spawn_timeout_secs),
            observe_interval_secs: timing.as_ref().and_then(|t| t.observe_interval_secs),
            progress_ceiling_secs: timing.as_ref().and_then(|t| t.progress_ceiling_secs),
            progress_tick_ms: timing.as_ref().and_then(|t| t.progress_tick_ms),
            activity_log: logging
                .as_ref()
                .and_then(|l| l.activity_log.as_ref())
                .map(PathBuf::from),
            log_file: logging.and_then(|l| l.log_file).map(PathBuf::from),
        }
    }
}
