//! Event Log - Pipeline
//!
//! Ingestion and retention pipeline for application event logs: decides
//! whether an event is written, writes it to every enabled sink, and keeps
//! each site's log near its configured size.
//!
//! # Architecture
//!
//! ```text
//! caller ──► EventLog ──► PolicyCache ──► RecursionGuard ──► Enricher
//!               │                                              │
//!               │ queue_event                                  ▼
//!               └──► QueueHandle ══► QueueWorker ──► Dispatcher (counters, store, sinks, notifier)
//!                    (bounded mpsc,   (one consumer,           │
//!                     try_send)        FIFO)                   ▼
//!                                                   RetentionController ──► trim thread
//! ```
//!
//! # Key Design
//!
//! - **Never crash the host**: the outermost logging call swallows sink
//!   failures (and sink panics) into a rate-limited fallback trace
//! - **Recursion-safe**: a logging call that re-enters itself for the same
//!   event key is converted to an error note instead of recursing
//! - **Non-blocking queue**: `queue_event` uses `try_send`; a full queue drops
//! - **Hysteresis**: sites are trimmed only after overshooting their size by
//!   the keep-percent buffer, one trim at a time
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use eventlog_pipeline::EventLog;
//! use eventlog_protocol::{EventRecord, LoggingPolicy};
//! use eventlog_sinks::MemoryStore;
//!
//! let store = Arc::new(MemoryStore::new());
//! let log = EventLog::builder(store.clone()).build().unwrap();
//!
//! let timeout = || {
//!     EventRecord::error("DB", "TIMEOUT", "query timed out")
//!         .with_policy(LoggingPolicy::OncePerPeriod(Duration::from_secs(120)))
//! };
//! for _ in 0..3 {
//!     log.log_event(timeout()).unwrap();
//! }
//!
//! assert_eq!(store.len(), 1);
//! assert_eq!(log.counters().errors, 1);
//! ```

mod clock;
mod context;
mod coordinator;
mod dispatch;
mod enrich;
mod error;
mod metrics;
mod policy_gate;
mod queue;
mod recursion;
mod retention;

pub use clock::{Clock, ManualClock, SystemClock};
pub use context::{DisabledLoggingScope, QueueScope, current_queue, logging_disabled};
pub use coordinator::{
    CLEAR_LOG_EVENT_CODE, CLEAR_LOG_SOURCE, DEFAULT_RECURSION_NOTE_MAX_LEN, EventLog,
    EventLogBuilder,
};
pub use dispatch::{Dispatcher, SinkSlot};
pub use enrich::{ActorContext, Enricher, FixedActor, NoActor, sanitize_user_name};
pub use error::{EventLogError, Result};
pub use metrics::{CountersSnapshot, EventLogCounters};
pub use policy_gate::PolicyCache;
pub use queue::{Delivery, QueueHandle, QueueTarget, QueueWorker};
pub use recursion::{RecursionGuard, ScopeToken};
pub use retention::{
    DEFAULT_KEEP_PERCENT, DEFAULT_LOG_SIZE, DEFAULT_MAX_DELETE_PER_RUN, RetentionController,
    RetentionTrigger, SiteLimits,
};

// Re-export key types from dependencies for convenience
pub use eventlog_protocol::{EventRecord, EventType, LoggingPolicy, SiteId};
pub use eventlog_sinks::SiteFilter;

/// Spawn a queue worker on the current tokio runtime
pub use queue::spawn as spawn_queue;

#[cfg(test)]
mod test_support;
