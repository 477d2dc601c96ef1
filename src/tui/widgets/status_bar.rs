//! Bottom status bar: spawn mode badge and keybind hints for the focused panel.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Widget};

use crate::session::SpawnMode;
use crate::tui::app_state::{AppState, Focus};

fn mode_style(mode: SpawnMode) -> Style {
    let color = match mode {
        SpawnMode::Idle => Color::DarkGray,
        SpawnMode::Owned => Color::Yellow,
        SpawnMode::Observing => Color::Magenta,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

fn mode_label(mode: SpawnMode) -> &'static str {
    match mode {
        SpawnMode::Idle => "IDLE",
        SpawnMode::Owned => "SPAWNING",
        SpawnMode::Observing => "OBSERVING",
    }
}

/// Render the one-line status bar into the given area.
pub fn render_status_bar(state: &AppState, area: Rect, buf: &mut Buffer) {
    if area.height == 0 || area.width == 0 {
        return;
    }

    let hint_style = Style::default().fg(Color::DarkGray);
    let key_style = Style::default().fg(Color::White);
    let mode = state.spawn.mode();

    let mut spans = vec![
        Span::styled(format!(" {} ", mode_label(mode)), mode_style(mode)),
        Span::styled("| ", hint_style),
    ];

    let hints: &[(&str, &str)] = match state.focus {
        Focus::Agents => &[
            ("\u{2191}\u{2193}", "select"),
            ("n", "new spawn"),
            ("s", "stop"),
            ("r", "refresh"),
            ("q", "quit"),
        ],
        Focus::Form => &[
            ("Tab", "next field"),
            ("Enter", "spawn"),
            ("Esc", "back"),
        ],
    };

    for (i, (key, action)) in hints.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", hint_style));
        }
        spans.push(Span::styled(*key, key_style));
        spans.push(Span::styled(format!(": {action}"), hint_style));
    }

    Paragraph::new(Line::from(spans)).render(area, buf);
}
