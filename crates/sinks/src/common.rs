//! Common types and utilities for sinks
//!
//! Shared functionality across all sink types.

use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};

use eventlog_protocol::EventRecord;
use thiserror::Error;

/// Metrics shared by all sink types
#[derive(Debug, Default)]
pub struct SinkMetrics {
    /// Records successfully written
    pub records_written: AtomicU64,

    /// Total bytes written (text sinks only)
    pub bytes_written: AtomicU64,

    /// Write errors encountered
    pub write_errors: AtomicU64,
}

impl SinkMetrics {
    /// Create new metrics instance
    pub const fn new() -> Self {
        Self {
            records_written: AtomicU64::new(0),
            bytes_written: AtomicU64::new(0),
            write_errors: AtomicU64::new(0),
        }
    }

    /// Record a successfully written record
    #[inline]
    pub fn record_written(&self, bytes: u64) {
        self.records_written.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record a write error
    #[inline]
    pub fn write_error(&self) {
        self.write_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            records_written: self.records_written.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of sink metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub records_written: u64,
    pub bytes_written: u64,
    pub write_errors: u64,
}

/// Common sink errors
#[derive(Debug, Error)]
pub enum SinkError {
    /// Failed to write a record
    #[error("write failed: {0}")]
    Write(String),

    /// Storage is currently unavailable
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Record to update does not exist
    #[error("event {0} not found")]
    NotFound(u64),

    /// Sink implementation panicked
    #[error("sink panicked: {0}")]
    Panicked(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SinkError {
    /// Create a write error
    pub fn write(msg: impl Into<String>) -> Self {
        Self::Write(msg.into())
    }

    /// Create an unavailable error
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Whether retrying later may succeed
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Render a record as one line of text
///
/// ```text
/// [2025-01-15T10:30:45.123Z] [E] site:5 DB/TIMEOUT user=alice machine=web-01 url=/cart | query timed out
/// ```
///
/// Newlines in the description are escaped so every record stays on one line.
pub fn render_line(record: &EventRecord) -> String {
    let mut line = String::with_capacity(128 + record.description.len());

    match record.event_time {
        Some(time) => {
            let _ = write!(line, "[{}] ", time.format("%Y-%m-%dT%H:%M:%S%.3fZ"));
        }
        None => line.push_str("[-] "),
    }
    let _ = write!(
        line,
        "[{}] {} {}/{}",
        record.event_type.code(),
        record.site_id,
        record.source,
        record.event_code
    );
    if record.id != 0 {
        let _ = write!(line, " id={}", record.id);
    }
    if let Some(ref user) = record.user_name {
        let _ = write!(line, " user={}", user);
    }
    if let Some(ref machine) = record.machine_name {
        let _ = write!(line, " machine={}", machine);
    }
    if let Some(ref ip) = record.ip_address {
        let _ = write!(line, " ip={}", ip);
    }
    if let Some(ref url) = record.url {
        let _ = write!(line, " url={}", url);
    }
    if !record.description.is_empty() {
        line.push_str(" | ");
        for c in record.description.chars() {
            match c {
                '\n' => line.push_str("\\n"),
                '\r' => {}
                c => line.push(c),
            }
        }
    }
    line
}

#[cfg(test)]
#[path = "common_test.rs"]
mod common_test;
