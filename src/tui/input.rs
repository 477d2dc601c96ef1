//! Keyboard event handler for the dashboard.
//!
//! Maps key events to [`AppState`] mutations and, where the console has to
//! act, a [`UserAction`] for the main loop in [`super::runner`] to carry out.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::app_state::{AppState, Focus};
use crate::spawn::SpawnRequest;

/// Work the main loop performs on the user's behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    Quit,
    /// Probe health and reload the inventory now.
    Refresh,
    Submit(SpawnRequest),
    /// Confirmed stop of the given agent.
    Stop(String),
}

/// Process a keyboard event.
///
/// Only `KeyEventKind::Press` events are processed. This avoids duplicate handling
/// on Windows where key-up events would otherwise trigger actions twice.
pub fn handle_key_event(key: KeyEvent, state: &mut AppState) -> Option<UserAction> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    // Ctrl+C: immediate quit (no confirmation needed).
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(UserAction::Quit);
    }

    if state.quit_pending {
        state.quit_pending = false;
        return match key.code {
            KeyCode::Char('q') | KeyCode::Char('y') => Some(UserAction::Quit),
            _ => None,
        };
    }

    if let Some(agent_id) = state.stop_pending.take() {
        return match key.code {
            KeyCode::Char('y') => Some(UserAction::Stop(agent_id)),
            _ => None,
        };
    }

    match state.focus {
        Focus::Agents => handle_agents_key(key, state),
        Focus::Form => handle_form_key(key, state),
    }
}

fn handle_agents_key(key: KeyEvent, state: &mut AppState) -> Option<UserAction> {
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => state.select_prev(),
        KeyCode::Down | KeyCode::Char('j') => state.select_next(),
        KeyCode::Tab | KeyCode::Char('n') => state.focus = Focus::Form,
        KeyCode::Char('r') => return Some(UserAction::Refresh),
        KeyCode::Char('s') => {
            state.stop_pending = state.selected_agent_id().map(str::to_string);
        }
        KeyCode::Char('q') => state.quit_pending = true,
        _ => {}
    }
    None
}

fn handle_form_key(key: KeyEvent, state: &mut AppState) -> Option<UserAction> {
    match key.code {
        KeyCode::Esc => state.focus = Focus::Agents,
        KeyCode::Tab | KeyCode::Down => state.form.next_field(),
        KeyCode::BackTab | KeyCode::Up => state.form.prev_field(),
        KeyCode::Backspace => state.form.backspace(),
        KeyCode::Enter => {
            if !state.submit_enabled() {
                return None;
            }
            match state.form.to_request() {
                Ok(request) => return Some(UserAction::Submit(request)),
                Err(message) => state.form.error = Some(message),
            }
        }
        KeyCode::Char(c) => state.form.push_char(c),
        _ => {}
    }
    None
}
