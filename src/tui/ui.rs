//! Top-level dashboard render function.
//!
//! [`render_ui`] is the single entry point called each frame by the main loop.
//! It composes the header, agent list, spawn panel, notices and status bar
//! into a complete frame, then draws any pending confirmation on top.

use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, Clear, List, ListItem, ListState, Paragraph, StatefulWidget, Widget, Wrap,
};

use crate::format::{fmt_duration, fmt_uptime, head_chars};
use crate::notify::{Notice, Severity};
use crate::tui::app_state::{AppState, Focus};
use crate::tui::form::FormField;
use crate::tui::widgets::{progress_gauge, status_bar};

/// Render the complete dashboard from the current application state.
///
/// Layout (top to bottom):
/// 1. Header (1 line): bridge health and agent counts
/// 2. Body: agent list on the left; spawn panel over notices on the right
/// 3. Status bar (1 line): spawn mode and keybinds
pub fn render_ui(state: &AppState, frame: &mut Frame) {
    let area = frame.area();

    let chunks = Layout::vertical([
        Constraint::Length(1), // Header
        Constraint::Min(0),    // Body
        Constraint::Length(1), // Status bar
    ])
    .split(area);

    let body = Layout::horizontal([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[1]);
    let right = Layout::vertical([Constraint::Length(9), Constraint::Min(0)]).split(body[1]);

    let buf = frame.buffer_mut();
    render_header(state, chunks[0], buf);
    render_agents(state, body[0], buf);
    render_spawn_panel(state, right[0], buf);
    render_notices(state, right[1], buf);
    status_bar::render_status_bar(state, chunks[2], buf);

    if let Some(agent_id) = &state.stop_pending {
        render_confirm_dialog(&format!("Stop {agent_id}?"), " Stop agent ", area, buf);
    } else if state.quit_pending {
        render_confirm_dialog("Quit?", " Confirm ", area, buf);
    }
}

fn render_header(state: &AppState, area: Rect, buf: &mut Buffer) {
    let sep = Span::styled(" | ", Style::default().fg(Color::DarkGray));
    let (dot_style, status) = if state.health.online {
        (Style::default().fg(Color::Green), "online")
    } else {
        (Style::default().fg(Color::Red), "offline")
    };
    let summary = state.summary();

    let line = Line::from(vec![
        Span::styled(" opbridge", Style::default().add_modifier(Modifier::BOLD)),
        sep.clone(),
        Span::styled("\u{25cf} ", dot_style),
        Span::styled(status, dot_style.add_modifier(Modifier::BOLD)),
        sep.clone(),
        Span::raw(format!("Uptime {}", fmt_uptime(state.health.uptime_seconds))),
        sep,
        Span::raw(format!(
            "Agents {} ({} active)",
            summary.total, summary.active
        )),
    ]);
    Paragraph::new(line).render(area, buf);
}

fn panel_block(title: &str, focused: bool) -> Block<'_> {
    let border = if focused { Color::Cyan } else { Color::DarkGray };
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(title)
}

fn render_agents(state: &AppState, area: Rect, buf: &mut Buffer) {
    let title = format!(" Agents ({}) ", state.agents.len());
    let block = panel_block(&title, state.focus == Focus::Agents);

    if state.agents.is_empty() {
        Paragraph::new(Line::styled(
            "No agents registered yet",
            Style::default().fg(Color::DarkGray),
        ))
        .block(block)
        .render(area, buf);
        return;
    }

    let items: Vec<ListItem<'_>> = state
        .agents
        .iter()
        .map(|agent| {
            let (dot, dot_color) = if agent.is_active() {
                ("\u{25cf}", Color::Green)
            } else {
                ("\u{25cb}", Color::DarkGray)
            };
            let mut header = vec![
                Span::styled(format!("{dot} "), Style::default().fg(dot_color)),
                Span::styled(agent.id.clone(), Style::default().add_modifier(Modifier::BOLD)),
                Span::styled(
                    format!("  {}", agent.role_label()),
                    Style::default().fg(Color::Yellow),
                ),
            ];
            if let Some(port) = agent.port {
                header.push(Span::styled(
                    format!("  :{port}"),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            if let Some(pid) = agent.pid {
                header.push(Span::styled(
                    format!("  pid {pid}"),
                    Style::default().fg(Color::DarkGray),
                ));
            }

            let mut lines = vec![Line::from(header)];
            if let Some(desc) = &agent.description {
                lines.push(Line::styled(
                    format!("    {}", head_chars(desc, 60)),
                    Style::default().fg(Color::Gray),
                ));
            }
            ListItem::new(lines)
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol("\u{25b8}");
    let mut list_state = ListState::default().with_selected(Some(state.selected_agent));
    StatefulWidget::render(list, area, buf, &mut list_state);
}

fn render_spawn_panel(state: &AppState, area: Rect, buf: &mut Buffer) {
    let focused = state.focus == Focus::Form;
    let block = panel_block(" Spawn Agent ", focused);
    let label_style = Style::default().fg(Color::DarkGray);

    let mut lines: Vec<Line<'_>> = FormField::ALL
        .iter()
        .map(|&field| {
            let active = focused && state.form.active == field;
            let marker = if active { "> " } else { "  " };
            let mut value = state.form.display_value(field);
            if active {
                value.push('_');
            }
            let value_style = if state.submit_enabled() {
                Style::default()
            } else {
                Style::default().fg(Color::DarkGray)
            };
            Line::from(vec![
                Span::styled(marker, Style::default().fg(Color::Cyan)),
                Span::styled(format!("{:<14}", field.label()), label_style),
                Span::styled(value, value_style),
            ])
        })
        .collect();

    lines.push(Line::raw(""));

    if let Some(error) = &state.form.error {
        lines.push(Line::styled(
            error.clone(),
            Style::default().fg(Color::Red),
        ));
    } else if let Some(label) = state.spawn_label() {
        lines.push(Line::styled(label, Style::default().fg(Color::Yellow)));
    }

    if let Some(progress) = &state.progress {
        let mut spans = progress_gauge::render_progress_gauge(progress.percent);
        spans.push(Span::raw(format!(
            " {} {}",
            fmt_duration(progress.elapsed),
            progress.phase
        )));
        lines.push(Line::from(spans));
    }

    Paragraph::new(lines).block(block).render(area, buf);
}

fn severity_style(severity: Severity) -> Style {
    let color = match severity {
        Severity::Success => Color::Green,
        Severity::Error => Color::Red,
        Severity::Info => Color::Cyan,
    };
    Style::default().fg(color)
}

fn notice_lines(notice: &Notice) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(vec![
        Span::styled(
            format!("[{}] ", notice.timestamp),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            notice.title.clone(),
            severity_style(notice.severity).add_modifier(Modifier::BOLD),
        ),
    ])];
    if let Some(detail) = &notice.detail {
        for line in detail.lines().filter(|l| !l.trim().is_empty()).take(3) {
            lines.push(Line::styled(
                format!("  {line}"),
                Style::default().fg(Color::Gray),
            ));
        }
    }
    lines
}

fn render_notices(state: &AppState, area: Rect, buf: &mut Buffer) {
    let block = panel_block(" Notices ", false);
    let lines: Vec<Line<'static>> = state.notices.iter().rev().flat_map(notice_lines).collect();

    Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .render(area, buf);
}

/// Render a centered y/n confirmation dialog.
fn render_confirm_dialog(question: &str, title: &str, area: Rect, buf: &mut Buffer) {
    let dialog_width: u16 = (question.chars().count() as u16 + 14).max(24);
    let dialog_height: u16 = 3;

    let x = area.x + area.width.saturating_sub(dialog_width) / 2;
    let y = area.y + area.height.saturating_sub(dialog_height) / 2;

    let dialog_area = Rect::new(x, y, dialog_width.min(area.width), dialog_height.min(area.height));

    Clear.render(dialog_area, buf);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .style(Style::default().fg(Color::Red));

    let inner = block.inner(dialog_area);
    block.render(dialog_area, buf);

    if inner.width > 0 && inner.height > 0 {
        let prompt = Paragraph::new(Line::from(vec![
            Span::raw(format!("  {question} (")),
            Span::styled("y", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
            Span::raw("/"),
            Span::styled("n", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
            Span::raw(")"),
        ]));
        prompt.render(inner, buf);
    }
}
