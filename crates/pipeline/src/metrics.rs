//! Event log counters
//!
//! Process-wide atomic counters for the write path. The warning and error
//! counters are part of the observable behavior (reset only by clearing the
//! log); the rest are operational.
//! All operations use relaxed ordering.

use std::sync::atomic::{AtomicU64, Ordering};

use eventlog_protocol::EventType;

/// Counters for one `EventLog` instance
///
/// # Thread Safety
///
/// All methods are safe to call from multiple threads concurrently.
/// Values may be slightly stale when read.
#[derive(Debug, Default)]
pub struct EventLogCounters {
    /// Dispatched warning events
    warnings: AtomicU64,

    /// Dispatched error events
    errors: AtomicU64,

    /// Records that reached the sinks
    accepted: AtomicU64,

    /// Records refused by the entry gate or the policy gate
    rejected: AtomicU64,

    /// Re-entrant calls converted to recursion notes
    recursion_blocked: AtomicU64,

    /// Individual sink, store or notifier failures
    sink_failures: AtomicU64,

    /// Records handed to a queue worker
    queued: AtomicU64,

    /// Records dropped by the queue (full channel, unavailable storage)
    dropped: AtomicU64,
}

impl EventLogCounters {
    /// Create counters with every value at zero
    #[inline]
    pub const fn new() -> Self {
        Self {
            warnings: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            accepted: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            recursion_blocked: AtomicU64::new(0),
            sink_failures: AtomicU64::new(0),
            queued: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// Count a dispatched record by severity
    #[inline]
    pub fn record_severity(&self, event_type: EventType) {
        match event_type {
            EventType::Warning => {
                self.warnings.fetch_add(1, Ordering::Relaxed);
            }
            EventType::Error => {
                self.errors.fetch_add(1, Ordering::Relaxed);
            }
            EventType::Information => {}
        }
    }

    #[inline]
    pub fn record_accepted(&self) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_recursion_blocked(&self) {
        self.recursion_blocked.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_sink_failure(&self) {
        self.sink_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_queued(&self) {
        self.queued.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Reset the warning and error counters (clear-log only)
    pub fn reset_severity(&self) {
        self.warnings.store(0, Ordering::Relaxed);
        self.errors.store(0, Ordering::Relaxed);
    }

    /// Get a snapshot of all counters
    pub fn snapshot(&self) -> CountersSnapshot {
        CountersSnapshot {
            warnings: self.warnings.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            accepted: self.accepted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            recursion_blocked: self.recursion_blocked.load(Ordering::Relaxed),
            sink_failures: self.sink_failures.load(Ordering::Relaxed),
            queued: self.queued.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of the counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CountersSnapshot {
    pub warnings: u64,
    pub errors: u64,
    pub accepted: u64,
    pub rejected: u64,
    pub recursion_blocked: u64,
    pub sink_failures: u64,
    pub queued: u64,
    pub dropped: u64,
}
