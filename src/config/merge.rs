use std::time::Duration;

use super::schema::{AppConfig, PartialConfig};
use crate::error::ConfigError;
use crate::spawn::SpawnTimings;

pub const DEFAULT_BRIDGE_URL: &str = "http://127.0.0.1:8080/api";

impl PartialConfig {
    /// Merge self with a lower-priority fallback.
    /// Self's non-None values take precedence.
    pub fn with_fallback(self, fallback: PartialConfig) -> PartialConfig {
        PartialConfig {
            bridge_url: self.bridge_url.or(fallback.bridge_url),
            token: self.token.or(fallback.token),
            health_poll_secs: self.health_poll_secs.or(fallback.health_poll_secs),
            agent_poll_secs: self.agent_poll_secs.or(fallback.agent_poll_secs),
            health_timeout_secs: self.health_timeout_secs.or(fallback.health_timeout_secs),
            inventory_timeout_secs: self
                .inventory_timeout_secs
                .or(fallback.inventory_timeout_secs),
            spawn_timeout_secs: self.spawn_timeout_secs.or(fallback.spawn_timeout_secs),
            observe_interval_secs: self.observe_interval_secs.or(fallback.observe_interval_secs),
            progress_ceiling_secs: self.progress_ceiling_secs.or(fallback.progress_ceiling_secs),
            progress_tick_ms: self.progress_tick_ms.or(fallback.progress_tick_ms),
            activity_log: self.activity_log.or(fallback.activity_log),
            log_file: self.log_file.or(fallback.log_file),
        }
    }

    /// Convert to AppConfig, filling any remaining gaps with defaults.
    ///
    /// Zero intervals are raised to 1 so no poller can spin.
    pub fn finalize(self) -> Result<AppConfig, ConfigError> {
        let bridge_url = self
            .bridge_url
            .unwrap_or_else(|| DEFAULT_BRIDGE_URL.to_string());

        if let Err(e) = reqwest::Url::parse(&bridge_url) {
            return Err(ConfigError::InvalidUrl {
                url: bridge_url,
                message: e.to_string(),
            });
        }

        Ok(AppConfig {
            bridge_url,
            token: self.token.filter(|t| !t.is_empty()),
            health_poll_secs: self.health_poll_secs.unwrap_or(10).max(1),
            agent_poll_secs: self.agent_poll_secs.unwrap_or(15).max(1),
            health_timeout_secs: self.health_timeout_secs.unwrap_or(5).max(1),
            inventory_timeout_secs: self.inventory_timeout_secs.unwrap_or(10).max(1),
            spawn_timeout_secs: self.spawn_timeout_secs.unwrap_or(300).max(1),
            observe_interval_secs: self.observe_interval_secs.unwrap_or(5).max(1),
            progress_ceiling_secs: self.progress_ceiling_secs.unwrap_or(180).max(1),
            progress_tick_ms: self.progress_tick_ms.unwrap_or(500).max(50),
            activity_log: self.activity_log,
            log_file: self.log_file,
        })
    }
}

impl AppConfig {
    pub fn spawn_timings(&self) -> SpawnTimings {
        SpawnTimings {
            hard_timeout: Duration::from_secs(self.spawn_timeout_secs),
            observe_interval: Duration::from_secs(self.observe_interval_secs),
            progress_tick: Duration::from_millis(self.progress_tick_ms),
            estimate_ceiling: Duration::from_secs(self.progress_ceiling_secs),
        }
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_secs(self.health_timeout_secs)
    }

    pub fn health_poll(&self) -> Duration {
        Duration::from_secs(self.health_poll_secs)
    }

    pub fn inventory_timeout(&self) -> Duration {
        Duration::from_secs(self.inventory_timeout_secs)
    }

    pub fn agent_poll(&self) -> Duration {
        Duration::from_secs(self.agent_poll_secs)
    }
}
