//! Human-readable formatting for uptimes, elapsed durations, and
//! diagnostic text tails.

use std::time::Duration;

/// Format bridge uptime seconds (e.g. "42s", "17m", "3h 5m", "2h").
///
/// `None` renders as `--` so an offline bridge shows a placeholder.
pub fn fmt_uptime(seconds: Option<u64>) -> String {
    let Some(s) = seconds else {
        return "--".to_string();
    };

    if s < 60 {
        format!("{s}s")
    } else if s < 3600 {
        format!("{}m", s / 60)
    } else {
        let hours = s / 3600;
        let minutes = (s % 3600) / 60;
        if minutes > 0 {
            format!("{hours}h {minutes}m")
        } else {
            format!("{hours}h")
        }
    }
}

/// Format an elapsed duration as "34s" or "2m 5s".
pub fn fmt_duration(d: Duration) -> String {
    let total_secs = d.as_secs();
    if total_secs < 60 {
        format!("{total_secs}s")
    } else {
        format!("{}m {}s", total_secs / 60, total_secs % 60)
    }
}

/// Keep the last `max_chars` characters of `s`.
///
/// Counts characters, not bytes, so multi-byte output from a spawn script
/// never splits a code point.
pub fn tail_chars(s: &str, max_chars: usize) -> String {
    let count = s.chars().count();
    if count <= max_chars {
        return s.to_string();
    }
    s.chars().skip(count - max_chars).collect()
}

/// Keep the first `max_chars` characters of `s`, appending "..." if truncated.
pub fn head_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let head: String = s.chars().take(max_chars).collect();
    format!("{head}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uptime_none_is_placeholder() {
        assert_eq!(fmt_uptime(None), "--");
    }

    #[test]
    fn uptime_seconds() {
        assert_eq!(fmt_uptime(Some(0)), "0s");
        assert_eq!(fmt_uptime(Some(59)), "59s");
    }

    #[test]
    fn uptime_minutes_drop_seconds() {
        assert_eq!(fmt_uptime(Some(60)), "1m");
        assert_eq!(fmt_uptime(Some(3599)), "59m");
    }

    #[test]
    fn uptime_hours() {
        assert_eq!(fmt_uptime(Some(3600)), "1h");
        assert_eq!(fmt_uptime(Some(3600 * 3 + 5 * 60 + 12)), "3h 5m");
    }

    #[test]
    fn duration_seconds_only() {
        assert_eq!(fmt_duration(Duration::from_millis(42_900)), "42s");
    }

    #[test]
    fn duration_minutes() {
        assert_eq!(fmt_duration(Duration::from_secs(125)), "2m 5s");
        assert_eq!(fmt_duration(Duration::from_secs(300)), "5m 0s");
    }

    #[test]
    fn tail_keeps_short_strings() {
        assert_eq!(tail_chars("abc", 10), "abc");
    }

    #[test]
    fn tail_keeps_last_chars() {
        assert_eq!(tail_chars("hello world", 5), "world");
    }

    #[test]
    fn tail_is_char_safe() {
        assert_eq!(tail_chars("ééééé", 2), "éé");
    }

    #[test]
    fn head_truncates_with_ellipsis() {
        assert_eq!(head_chars("hello world", 5), "hello...");
        assert_eq!(head_chars("hi", 5), "hi");
    }
}
