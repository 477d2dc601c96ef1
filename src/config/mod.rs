pub mod merge;
pub mod schema;

pub use merge::DEFAULT_BRIDGE_URL;
pub use schema::*;

use crate::cli::{Cli, Commands};
use crate::error::ConfigError;
use std::path::{Path, PathBuf};

/// Load configuration by merging CLI, file, and default sources.
/// Precedence: CLI/env > config file > defaults.
///
/// The config file is the `--config` path when given, in which case a
/// missing or malformed file is an error. Otherwise the global file is
/// used if present and a broken one is skipped with a warning.
pub fn load_config(cli: &Cli) -> Result<AppConfig, ConfigError> {
    let file = match &cli.config {
        Some(path) => load_toml_file(path)?.unwrap_or_default(),
        None => load_global_config(),
    };

    cli_to_partial(cli).with_fallback(file).finalize()
}

/// Load global config from the platform-specific config directory.
/// Returns empty PartialConfig if file not found or unreadable.
fn load_global_config() -> PartialConfig {
    let Some(path) = global_config_path() else {
        tracing::debug!("Could not determine global config directory");
        return PartialConfig::default();
    };

    match load_toml_file(&path) {
        Ok(partial) => partial.unwrap_or_default(),
        Err(e) => {
            tracing::warn!("Ignoring global config: {e}");
            PartialConfig::default()
        }
    }
}

/// Load and parse a TOML config file into a PartialConfig.
/// Returns Ok(None) when the file does not exist.
pub fn load_toml_file(path: &Path) -> Result<Option<PartialConfig>, ConfigError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(None);
        }
        Err(e) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };

    let config_file =
        toml::from_str::<ConfigFile>(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    tracing::info!("Loaded config from {}", path.display());
    Ok(Some(config_file.to_partial()))
}

/// Resolve the platform-specific global config path.
/// Linux: ~/.config/opbridge/opbridge.toml
/// macOS: ~/Library/Application Support/opbridge/opbridge.toml
pub fn global_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "opbridge")
        .map(|dirs| dirs.config_dir().join("opbridge.toml"))
}

/// Convert CLI arguments to a PartialConfig for merging.
fn cli_to_partial(cli: &Cli) -> PartialConfig {
    let spawn_timeout_secs = match &cli.command {
        Some(Commands::Spawn { timeout, .. }) => *timeout,
        _ => None,
    };

    PartialConfig {
        bridge_url: cli.bridge_url.clone(),
        token: cli.token.clone(),
        spawn_timeout_secs,
        ..Default::default()
    }
}
