//! Dashboard main loop: terminal lifecycle, event multiplexing, and render tick.
//!
//! [`run_dashboard`] is the entry point for dashboard mode. It builds the
//! console with an event channel attached, starts the background pollers,
//! and runs a `tokio::select!` loop that multiplexes console events,
//! keyboard input, and render ticks.

use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{Event, EventStream};
use futures::StreamExt;
use ratatui::DefaultTerminal;
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};
use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;
use crate::console::Console;
use crate::event::ConsoleEvent;
use crate::notify::{ChannelNotifier, FanoutNotifier, Notice, Notifier, TracingNotifier};
use crate::tui::app_state::AppState;
use crate::tui::input::{UserAction, handle_key_event};
use crate::tui::ui::render_ui;

/// Run the operator dashboard until the user quits.
///
/// `extra` receives every notice in addition to the dashboard and the log
/// (the activity log, when configured). The terminal is restored on both
/// normal exit and error; ratatui's panic hook covers panics.
pub async fn run_dashboard(config: &AppConfig, extra: Option<Arc<dyn Notifier>>) -> anyhow::Result<()> {
    let (event_tx, event_rx) = unbounded_channel::<ConsoleEvent>();

    let mut notifier = FanoutNotifier::new(vec![
        Arc::new(TracingNotifier),
        Arc::new(ChannelNotifier::new(event_tx.clone())),
    ]);
    if let Some(extra) = extra {
        notifier.push(extra);
    }

    let console = Console::new(config, Arc::new(notifier), Some(event_tx))?;
    let cancel = CancellationToken::new();
    let background = console.start_background(&cancel);

    // -- Initialize terminal (raw mode + alternate screen + panic hook).
    let mut terminal = ratatui::init();
    let result = event_loop(&mut terminal, &console, event_rx).await;
    ratatui::restore();

    // A poll may be mid-request; don't hold the exit for its timeout.
    cancel.cancel();
    for handle in background {
        handle.abort();
    }
    tracing::info!("Dashboard closed");
    result
}

async fn event_loop(
    terminal: &mut DefaultTerminal,
    console: &Console,
    mut event_rx: UnboundedReceiver<ConsoleEvent>,
) -> anyhow::Result<()> {
    let mut app_state = AppState::new();
    let mut key_stream = EventStream::new();

    let tick_rate = Duration::from_millis(50); // ~20fps
    let mut tick_interval = tokio::time::interval(tick_rate);

    loop {
        tokio::select! {
            // Console events from the background components.
            Some(event) = event_rx.recv() => {
                app_state.apply_event(event);
            }

            // Keyboard events from crossterm.
            Some(Ok(crossterm_event)) = key_stream.next() => {
                if let Event::Key(key) = crossterm_event {
                    match handle_key_event(key, &mut app_state) {
                        Some(UserAction::Quit) => break,
                        Some(action) => dispatch(console, action),
                        None => {}
                    }
                }
                // Resize events are handled automatically by ratatui on next draw.
            }

            // Render tick.
            _ = tick_interval.tick() => {
                terminal.draw(|frame| {
                    render_ui(&app_state, frame);
                })?;
            }
        }
    }

    Ok(())
}

/// Run a user action in the background so the render loop never waits on
/// the bridge.
fn dispatch(console: &Console, action: UserAction) {
    match action {
        UserAction::Quit => {}
        UserAction::Refresh => {
            let console = console.clone();
            tokio::spawn(async move {
                console.prober.probe_once(&console.coordinator).await;
                console.inventory.refresh().await;
            });
        }
        UserAction::Submit(request) => {
            let console = console.clone();
            tokio::spawn(async move {
                if let Err(e) = console.coordinator.submit(request).await {
                    console
                        .notifier
                        .notify(Notice::info("Spawn in progress", e.to_string()));
                }
            });
        }
        UserAction::Stop(agent_id) => {
            let console = console.clone();
            tokio::spawn(async move {
                console
                    .inventory
                    .stop_agent(&agent_id, console.notifier.as_ref())
                    .await;
            });
        }
    }
}
