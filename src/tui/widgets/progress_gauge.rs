//! Spawn progress visualization widget.
//!
//! Renders an inline gauge for the owned spawn's estimated progress as a
//! colored bar with percentage text. The bar stays cyan while the estimate
//! is a guess and turns green only at the confirmed 100%.

use ratatui::style::{Color, Style};
use ratatui::text::Span;

/// Width of the bar portion of the gauge (number of block characters).
const BAR_WIDTH: usize = 20;

/// Filled block character for the bar.
const FILLED: &str = "\u{2588}"; // Full block: "█"

/// Empty block character for the bar.
const EMPTY: &str = "\u{2591}"; // Light shade: "░"

/// Render a progress gauge as a vector of styled spans.
///
/// Returns something like: `[████████░░░░░░░░░░░░] 41%`
///
/// `percent` is on a 0..=100 scale.
pub fn render_progress_gauge(percent: f64) -> Vec<Span<'static>> {
    let pct = percent.clamp(0.0, 100.0);
    let filled_count = ((pct / 100.0 * BAR_WIDTH as f64).round() as usize).min(BAR_WIDTH);
    let empty_count = BAR_WIDTH - filled_count;

    let bar_style = Style::default().fg(gauge_color(pct));
    let dim_style = Style::default().fg(Color::DarkGray);

    vec![
        Span::raw("["),
        Span::styled(FILLED.repeat(filled_count), bar_style),
        Span::styled(EMPTY.repeat(empty_count), dim_style),
        Span::raw(format!("] {pct:.0}%")),
    ]
}

fn gauge_color(pct: f64) -> Color {
    if pct >= 100.0 { Color::Green } else { Color::Cyan }
}
