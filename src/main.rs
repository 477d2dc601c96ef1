use std::fs::OpenOptions;
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use clap::Parser;

use opbridge::activity_log::ActivityLog;
use opbridge::cli::{Cli, Commands};
use opbridge::config::{self, AppConfig};
use opbridge::notify::Notifier;
use opbridge::spawn::SpawnRequest;
use opbridge::{commands, tui};

fn env_filter() -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into())
}

/// Headless commands log to stderr so stdout stays clean for output.
fn init_stderr_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .init();
}

/// The dashboard owns the terminal: log to a file, or nowhere.
fn init_dashboard_tracing(log_file: Option<&Path>) -> anyhow::Result<()> {
    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(std::io::sink)
                .init();
        }
    }
    Ok(())
}

fn open_activity_log(config: &AppConfig) -> anyhow::Result<Option<Arc<ActivityLog>>> {
    let Some(path) = &config.activity_log else {
        return Ok(None);
    };
    let log = ActivityLog::open(path)
        .with_context(|| format!("Failed to open activity log {}", path.display()))?;
    log.log_session_start(&config.bridge_url)?;
    Ok(Some(Arc::new(log)))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let command = cli.command();
    let config = config::load_config(&cli)?;

    match &command {
        Commands::Dashboard => init_dashboard_tracing(config.log_file.as_deref())?,
        _ => init_stderr_tracing(),
    }
    tracing::info!(
        bridge_url = %config.bridge_url,
        authenticated = config.token.is_some(),
        "opbridge starting"
    );

    let activity = open_activity_log(&config)?;
    let extra = activity.clone().map(|log| log as Arc<dyn Notifier>);

    let result = match command {
        Commands::Dashboard => tui::run_dashboard(&config, extra).await,
        Commands::Status => commands::status(&config).await,
        Commands::Agents => commands::agents(&config).await,
        Commands::Spawn {
            agent_id,
            role,
            description,
            discord_token,
            wait,
            timeout: _,
        } => {
            let request = SpawnRequest::new(agent_id, role, description, discord_token);
            commands::spawn(&config, request, wait, extra).await
        }
        Commands::Stop { agent_id } => commands::stop(&config, &agent_id, extra).await,
    };

    if let Some(log) = activity {
        let reason = if result.is_ok() { "completed" } else { "error" };
        if let Err(e) = log.log_session_end(reason) {
            tracing::warn!("Failed to close activity log: {e:#}");
        }
    }

    result
}
