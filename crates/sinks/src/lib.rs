//! Event Log - Sinks
//!
//! Destinations that durably or visibly record accepted events, plus the
//! collaborator traits the pipeline talks to.
//!
//! # Architecture
//!
//! ```text
//! [EventLog] --&EventRecord--> Store (insert → id)
//!                         ├──> FileSink   (one line per record)
//!                         ├──> TraceSink  (tracing, target eventlog::events)
//!                         └──> NotificationSink (errors only)
//! ```
//!
//! # Available Sinks
//!
//! | Sink | Purpose |
//! |------|---------|
//! | `memory` | In-process `Store` with retention support |
//! | `file` | Human-readable append-only text file |
//! | `trace` | Forwards records to `tracing` at their severity |
//!
//! Sinks are synchronous: the pipeline calls them on the writing thread (direct
//! mode) or on the queue worker (queued mode).

// =============================================================================
// Sink implementations (each in its own submodule)
// =============================================================================

/// In-memory store - reference `Store` implementation
pub mod memory;

/// File sink - human-readable text log
pub mod file;

/// Trace sink - forwards records to `tracing`
pub mod trace;

// =============================================================================
// Shared pieces
// =============================================================================

/// Rate-limited last-resort writer
pub mod fallback;

/// Collaborator traits (store, sink, notifier)
mod traits;

/// Common types shared by all sinks (errors, metrics, rendering)
mod common;

// =============================================================================
// Public re-exports
// =============================================================================

pub use common::{MetricsSnapshot, SinkError, SinkMetrics, render_line};
pub use fallback::FallbackWriter;
pub use traits::{EventSink, NotificationSink, SiteFilter, Store};

pub use file::FileSink;
pub use memory::MemoryStore;
pub use trace::TraceSink;

/// Result type for sink operations
pub type Result<T> = std::result::Result<T, SinkError>;
