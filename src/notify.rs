//! Transient user-facing notices (the console's "toasts").
//!
//! The coordinator and inventory loader only know the [`Notifier`] trait.
//! Whoever constructs the console decides which surfaces actually show a
//! notice.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use crate::event::{ConsoleEvent, EventSender};

/// How loudly a notice should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Success => write!(f, "success"),
            Severity::Error => write!(f, "error"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// A single notice: a short title and optional diagnostic detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub severity: Severity,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Wall-clock time for display (e.g., "14:32:07").
    pub timestamp: String,
}

impl Notice {
    pub fn new(severity: Severity, title: impl Into<String>, detail: Option<String>) -> Self {
        Self {
            severity,
            title: title.into(),
            detail,
            timestamp: Utc::now().format("%H:%M:%S").to_string(),
        }
    }

    pub fn success(title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(Severity::Success, title, Some(detail.into()))
    }

    pub fn error(title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(Severity::Error, title, Some(detail.into()))
    }

    pub fn info(title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(Severity::Info, title, Some(detail.into()))
    }
}

/// Sink for user-facing notices.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Emits every notice as a structured log line.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        let detail = notice.detail.as_deref().unwrap_or("");
        match notice.severity {
            Severity::Error => tracing::warn!(title = %notice.title, detail, "notice"),
            Severity::Success | Severity::Info => {
                tracing::info!(severity = %notice.severity, title = %notice.title, detail, "notice")
            }
        }
    }
}

/// Forwards notices into the console event channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: EventSender,
}

impl ChannelNotifier {
    pub fn new(tx: EventSender) -> Self {
        Self { tx }
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notice: Notice) {
        let _ = self.tx.send(ConsoleEvent::Notice(notice));
    }
}

/// Delivers each notice to every wrapped notifier, in order.
#[derive(Clone, Default)]
pub struct FanoutNotifier {
    targets: Vec<Arc<dyn Notifier>>,
}

impl FanoutNotifier {
    pub fn new(targets: Vec<Arc<dyn Notifier>>) -> Self {
        Self { targets }
    }

    pub fn push(&mut self, target: Arc<dyn Notifier>) {
        self.targets.push(target);
    }
}

impl Notifier for FanoutNotifier {
    fn notify(&self, notice: Notice) {
        for target in &self.targets {
            target.notify(notice.clone());
        }
    }
}
