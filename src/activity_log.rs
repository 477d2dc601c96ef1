//! JSONL activity log of console notices.
//!
//! Appends one JSON object per line to a file chosen in config, so an
//! operator can review what happened during a dashboard session after the
//! terminal is gone. Each line is tagged with `event_type`.
//!
//! Uses synchronous `std::fs`; writes are small and flushed after each
//! event.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::Utc;
use serde::Serialize;

use crate::notify::{Notice, Notifier, Severity};

/// Returns the current UTC time as an ISO 8601 string with milliseconds.
fn now_iso() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// A structured activity entry serialized as a single JSON line.
#[derive(Debug, Serialize)]
#[serde(tag = "event_type")]
pub enum ActivityEntry {
    #[serde(rename = "session_start")]
    SessionStart { timestamp: String, bridge_url: String },

    #[serde(rename = "notice")]
    Notice {
        timestamp: String,
        severity: Severity,
        title: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },

    #[serde(rename = "session_end")]
    SessionEnd { timestamp: String, reason: String },
}

/// Append-only JSONL writer. Doubles as a [`Notifier`].
pub struct ActivityLog {
    writer: Mutex<BufWriter<fs::File>>,
    path: PathBuf,
}

impl ActivityLog {
    /// Open (or create) the log at `path`, creating parent directories.
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serialize an entry as a single JSON line and flush.
    pub fn append(&self, entry: &ActivityEntry) -> anyhow::Result<()> {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        serde_json::to_writer(&mut *writer, entry)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }

    pub fn log_session_start(&self, bridge_url: &str) -> anyhow::Result<()> {
        self.append(&ActivityEntry::SessionStart {
            timestamp: now_iso(),
            bridge_url: bridge_url.to_string(),
        })
    }

    pub fn log_session_end(&self, reason: &str) -> anyhow::Result<()> {
        self.append(&ActivityEntry::SessionEnd {
            timestamp: now_iso(),
            reason: reason.to_string(),
        })
    }
}

impl Notifier for ActivityLog {
    fn notify(&self, notice: Notice) {
        let entry = ActivityEntry::Notice {
            timestamp: now_iso(),
            severity: notice.severity,
            title: notice.title,
            detail: notice.detail,
        };
        if let Err(e) = self.append(&entry) {
            tracing::warn!(path = %self.path.display(), "Failed to write activity log: {e:#}");
        }
    }
}
