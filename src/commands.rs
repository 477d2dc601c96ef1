//! Headless commands: one-shot bridge operations printed to the terminal.

use std::sync::Arc;

use anyhow::{Context, bail};
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};

use crate::config::AppConfig;
use crate::console::Console;
use crate::event::ConsoleEvent;
use crate::format::{fmt_duration, fmt_uptime, head_chars};
use crate::inventory::{AgentRecord, InventorySummary};
use crate::notify::{FanoutNotifier, Notice, Notifier, Severity};
use crate::spawn::{ProgressEstimate, SpawnOutcome, SpawnRequest};

/// Prints notices to stdout as they arrive.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrintNotifier;

impl Notifier for PrintNotifier {
    fn notify(&self, notice: Notice) {
        println!("{}", render_notice(&notice));
    }
}

pub fn render_notice(notice: &Notice) -> String {
    let marker = match notice.severity {
        Severity::Success => "ok",
        Severity::Error => "error",
        Severity::Info => "info",
    };
    match &notice.detail {
        Some(detail) if !detail.is_empty() => {
            format!("[{}] {marker}: {}\n  {}", notice.timestamp, notice.title, detail.replace('\n', "\n  "))
        }
        _ => format!("[{}] {marker}: {}", notice.timestamp, notice.title),
    }
}

fn headless_notifier(extra: Option<Arc<dyn Notifier>>) -> Arc<dyn Notifier> {
    let mut fanout = FanoutNotifier::new(vec![Arc::new(PrintNotifier)]);
    if let Some(extra) = extra {
        fanout.push(extra);
    }
    Arc::new(fanout)
}

pub async fn status(config: &AppConfig) -> anyhow::Result<()> {
    let console = Console::new(config, headless_notifier(None), None)?;

    let health = console.prober.probe().await;
    if !health.online {
        bail!("Bridge at {} is offline", console.bridge.base_url());
    }
    let agents = console.inventory.refresh().await;
    let summary = InventorySummary::of(&agents);

    println!("Bridge:        online ({})", console.bridge.base_url());
    println!("Uptime:        {}", fmt_uptime(health.uptime_seconds));
    println!(
        "Active spawn:  {}",
        health.active_spawn_agent_id.as_deref().unwrap_or("none")
    );
    println!("Agents:        {} total, {} active", summary.total, summary.active);
    Ok(())
}

pub async fn agents(config: &AppConfig) -> anyhow::Result<()> {
    let console = Console::new(config, headless_notifier(None), None)?;
    let health = console.prober.probe().await;
    if !health.online {
        bail!("Bridge at {} is offline", console.bridge.base_url());
    }

    let agents = console.inventory.refresh().await;
    if agents.is_empty() {
        println!("No agents registered.");
        return Ok(());
    }
    for line in agent_table(&agents) {
        println!("{line}");
    }
    Ok(())
}

/// Render the inventory as aligned text rows, header first.
pub fn agent_table(agents: &[AgentRecord]) -> Vec<String> {
    let id_width = agents
        .iter()
        .map(|a| a.id.chars().count())
        .max()
        .unwrap_or(0)
        .max(2);
    let role_width = agents
        .iter()
        .map(|a| a.role_label().chars().count())
        .max()
        .unwrap_or(0)
        .max(4);

    let mut lines = vec![format!(
        "{:<id_width$}  {:<role_width$}  {:>5}  {:>7}  DESCRIPTION",
        "ID", "ROLE", "PORT", "PID"
    )];
    for agent in agents {
        lines.push(format!(
            "{:<id_width$}  {:<role_width$}  {:>5}  {:>7}  {}",
            agent.id,
            agent.role_label(),
            agent.port.map_or_else(|| "-".to_string(), |p| p.to_string()),
            agent.pid.map_or_else(|| "-".to_string(), |p| p.to_string()),
            head_chars(agent.description.as_deref().unwrap_or(""), 48),
        ));
    }
    lines
}

pub async fn spawn(
    config: &AppConfig,
    request: SpawnRequest,
    wait: bool,
    extra: Option<Arc<dyn Notifier>>,
) -> anyhow::Result<()> {
    let (tx, rx) = unbounded_channel();
    let console = Console::new(config, headless_notifier(extra), Some(tx))?;
    let printer = tokio::spawn(print_progress(rx));

    let health = console.prober.probe().await;
    if !health.online {
        tracing::warn!(bridge_url = %console.bridge.base_url(), "Bridge did not answer the health probe");
    }

    if let Some(active) = health.active_spawn_agent_id {
        if !wait {
            printer.abort();
            bail!("Spawn already in progress on the bridge: {active} (use --wait to queue behind it)");
        }
        eprintln!("Waiting for in-progress spawn of \"{active}\" to finish...");
        let watcher = console.coordinator.observe(&active)?;
        tokio::select! {
            joined = watcher => joined.context("observer task failed")?,
            _ = tokio::signal::ctrl_c() => {
                printer.abort();
                bail!("Interrupted while waiting for \"{active}\"");
            }
        }
    }

    let agent_id = request.agent_id.clone();
    eprintln!("Spawning \"{agent_id}\" via {}...", console.bridge.base_url());

    let result = tokio::select! {
        outcome = console.coordinator.submit(request) => outcome,
        _ = tokio::signal::ctrl_c() => {
            printer.abort();
            bail!("Interrupted; the bridge may still finish spawning \"{agent_id}\"");
        }
    };
    printer.abort();

    match result? {
        SpawnOutcome::Success(_) | SpawnOutcome::Busy(_) => Ok(()),
        other => bail!("Spawn of \"{agent_id}\" did not succeed ({})", other.kind()),
    }
}

/// Print a progress line whenever the phase changes or the estimate crosses
/// another 10%.
async fn print_progress(mut rx: UnboundedReceiver<ConsoleEvent>) {
    let mut last: Option<(u32, String)> = None;
    while let Some(event) = rx.recv().await {
        if let ConsoleEvent::Progress(estimate) = event {
            let key = progress_key(&estimate);
            if last.as_ref() != Some(&key) {
                eprintln!(
                    "  {:>3.0}%  {}  ({})",
                    estimate.percent,
                    estimate.phase,
                    fmt_duration(estimate.elapsed)
                );
                last = Some(key);
            }
        }
    }
}

fn progress_key(estimate: &ProgressEstimate) -> (u32, String) {
    ((estimate.percent / 10.0) as u32, estimate.phase.label().to_string())
}

pub async fn stop(
    config: &AppConfig,
    agent_id: &str,
    extra: Option<Arc<dyn Notifier>>,
) -> anyhow::Result<()> {
    let console = Console::new(config, headless_notifier(extra), None)?;
    if !console
        .inventory
        .stop_agent(agent_id, console.notifier.as_ref())
        .await
    {
        bail!("Bridge did not stop \"{agent_id}\"");
    }
    Ok(())
}
