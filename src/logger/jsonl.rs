//! JSONL activity log: append-only line-delimited JSON.
//!
//! Each line is a self-contained JSON object, assembled in memory and written
//! with a single `write_all` so a tailing process never sees a partial line.
//! Fallback chain: configured file → stderr with `[WVD-JSONL]` prefix →
//! silent discard. The appliance must never fail because logging did.

#![allow(missing_docs)]

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Rotate the log once it grows past this size.
const DEFAULT_MAX_BYTES: u64 = 5 * 1024 * 1024;

/// Severity level for log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// Event types matching the appliance activity model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    DaemonStart,
    DaemonStop,
    RecordingStarted,
    RecordingStopped,
    CopyCompleted,
    CopyCancelled,
    Maintenance,
    PanelSkipped,
    Error,
}

/// A single JSONL entry. Optional fields are omitted from the line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// ISO 8601 UTC timestamp.
    pub ts: String,
    pub event: EventType,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl LogEntry {
    #[must_use]
    pub fn new(event: EventType, severity: Severity) -> Self {
        Self {
            ts: Utc::now().to_rfc3339(),
            event,
            severity,
            path: None,
            size: None,
            detail: None,
        }
    }

    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Shared activity logger. Writes are serialized by an internal lock; all
/// callers run off the render cadence.
pub struct ActivityLog {
    path: Option<PathBuf>,
    max_bytes: u64,
    write_lock: Mutex<()>,
}

impl ActivityLog {
    /// Logger appending to `path`; `None` falls through to stderr only.
    #[must_use]
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path,
            max_bytes: DEFAULT_MAX_BYTES,
            write_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Append one entry. Infallible by contract: failures degrade down the
    /// fallback chain and are never surfaced to the caller.
    pub fn log(&self, entry: &LogEntry) {
        let Ok(mut line) = serde_json::to_string(entry) else {
            return;
        };
        line.push('\n');

        let _guard = self.write_lock.lock();
        if let Some(path) = &self.path {
            self.rotate_if_needed(path);
            let appended = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .and_then(|mut file| file.write_all(line.as_bytes()));
            if appended.is_ok() {
                return;
            }
        }
        eprint!("[WVD-JSONL] {line}");
    }

    /// Convenience wrapper for the common event-plus-detail shape.
    pub fn event(&self, event: EventType, severity: Severity, detail: Option<String>) {
        let mut entry = LogEntry::new(event, severity);
        entry.detail = detail;
        self.log(&entry);
    }

    fn rotate_if_needed(&self, path: &PathBuf) {
        let Ok(meta) = fs::metadata(path) else {
            return;
        };
        if meta.len() < self.max_bytes {
            return;
        }
        let mut rotated = path.clone().into_os_string();
        rotated.push(".1");
        // Best effort: a failed rotation just keeps appending to the big file.
        let _ = fs::rename(path, rotated);
    }
}
