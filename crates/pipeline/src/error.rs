//! Event log error types
//!
//! Callers of the top-level write path never see these: failures there are
//! converted to fallback trace writes. They surface only from nested calls
//! (a sink logging from inside a logging call), from administrative
//! operations, and for malformed records.

use eventlog_config::ConfigError;
use eventlog_protocol::{EventRecord, ProtocolError};
use eventlog_sinks::SinkError;
use thiserror::Error;

/// Event log errors
#[derive(Debug, Error)]
pub enum EventLogError {
    /// A logging call re-entered itself for the same event key
    ///
    /// Carries the record converted to an error-typed recursion note.
    #[error("recursive event log call detected for {}", .record.key())]
    RecursionDetected { record: Box<EventRecord> },

    /// A sink failed while writing a record
    #[error("sink '{sink}' failed: {source}")]
    Sink {
        sink: String,
        #[source]
        source: SinkError,
    },

    /// The persistent store failed
    #[error("store error: {0}")]
    Store(#[source] SinkError),

    /// Record failed validation (programmer error)
    #[error("invalid event record: {0}")]
    InvalidRecord(#[from] ProtocolError),

    /// The queue worker has shut down
    #[error("event queue is closed")]
    QueueClosed,

    /// The queue channel is full
    #[error("event queue is full")]
    QueueFull,

    /// Update requested for a record that was never persisted
    #[error("event record has not been persisted")]
    NotPersisted,

    /// Queued mode requested outside a tokio runtime
    #[error("queued mode requires a tokio runtime: {0}")]
    NoRuntime(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl EventLogError {
    /// Wrap a sink failure with the sink's name
    pub fn sink(sink: impl Into<String>, source: SinkError) -> Self {
        Self::Sink {
            sink: sink.into(),
            source,
        }
    }

    /// Whether this is a recursion detection
    pub fn is_recursion(&self) -> bool {
        matches!(self, Self::RecursionDetected { .. })
    }

    /// Whether the store refused the write because it is unavailable
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_unavailable())
    }
}

/// Result type for event log operations
pub type Result<T> = std::result::Result<T, EventLogError>;
