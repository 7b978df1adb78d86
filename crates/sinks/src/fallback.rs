//! Last-resort diagnostic writer
//!
//! When the pipeline itself fails (a sink throws at the outermost call, the
//! queue is full, recursion is detected) there is nowhere left to log except
//! the process trace. This writer sends those diagnostics to `tracing` under
//! the `eventlog::fallback` target, limiting repetitive failures to at most
//! one line per interval with a count of the suppressed ones.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use eventlog_sinks::FallbackWriter;
//!
//! let fallback = FallbackWriter::new(Duration::from_secs(10));
//!
//! // Only the first failure within the interval is written
//! for _ in 0..1000 {
//!     fallback.failure("store insert failed", &"connection refused");
//! }
//! assert_eq!(fallback.total(), 1000);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use eventlog_protocol::EventRecord;
use parking_lot::Mutex;

use crate::render_line;

/// Tracing target for last-resort writes
pub const FALLBACK_TARGET: &str = "eventlog::fallback";

/// Default interval between repeated failure lines
pub const DEFAULT_FALLBACK_INTERVAL: Duration = Duration::from_secs(10);

/// Maximum rendered record length included in a fallback line
pub const MAX_RECORD_LOG_LENGTH: usize = 4096;

/// Rate-limited writer to the process trace
///
/// Thread-safe: uses atomic counters and a mutex for the last write time.
pub struct FallbackWriter {
    /// Minimum interval between failure lines
    min_interval: Duration,

    /// Last time a failure line was written
    last_write_time: Mutex<Option<Instant>>,

    /// Failures since the last written line
    pending: AtomicU64,

    /// Every failure and note ever reported
    total: AtomicU64,
}

impl FallbackWriter {
    /// Create a writer with the given interval
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_write_time: Mutex::new(None),
            pending: AtomicU64::new(0),
            total: AtomicU64::new(0),
        }
    }

    /// Report a pipeline failure
    ///
    /// Returns true if a line was written, false if it was suppressed.
    pub fn failure(&self, context: &str, error: &dyn std::fmt::Display) -> bool {
        self.pending.fetch_add(1, Ordering::Relaxed);
        self.total.fetch_add(1, Ordering::Relaxed);

        if !self.should_write() {
            return false;
        }

        let count = self.pending.swap(0, Ordering::Relaxed);
        if count > 1 {
            tracing::error!(
                target: FALLBACK_TARGET,
                context = %context,
                error = %error,
                suppressed_count = count - 1,
                "event log failure (rate-limited)"
            );
        } else {
            tracing::error!(
                target: FALLBACK_TARGET,
                context = %context,
                error = %error,
                "event log failure"
            );
        }
        true
    }

    /// Write a record that could not reach any sink
    ///
    /// Notes are never rate-limited: they carry the record itself (a recursion
    /// note, a dropped queue entry) and would otherwise be lost.
    pub fn note(&self, context: &str, record: &EventRecord) {
        self.total.fetch_add(1, Ordering::Relaxed);

        let mut line = render_line(record);
        if line.len() > MAX_RECORD_LOG_LENGTH {
            let mut end = MAX_RECORD_LOG_LENGTH;
            while !line.is_char_boundary(end) {
                end -= 1;
            }
            line.truncate(end);
            line.push_str("...[truncated]");
        }
        tracing::warn!(target: FALLBACK_TARGET, context = %context, record = %line, "event log note");
    }

    /// Total failures and notes reported
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    /// Failures suppressed since the last written line
    pub fn pending(&self) -> u64 {
        self.pending.load(Ordering::Relaxed)
    }

    fn should_write(&self) -> bool {
        let mut last = self.last_write_time.lock();
        let now = Instant::now();
        match *last {
            Some(at) if now.duration_since(at) < self.min_interval => false,
            _ => {
                *last = Some(now);
                true
            }
        }
    }
}

impl Default for FallbackWriter {
    fn default() -> Self {
        Self::new(DEFAULT_FALLBACK_INTERVAL)
    }
}

impl std::fmt::Debug for FallbackWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackWriter")
            .field("min_interval", &self.min_interval)
            .field("pending", &self.pending())
            .field("total", &self.total())
            .finish()
    }
}
