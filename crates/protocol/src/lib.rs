//! Event Log Protocol - Core types for the event log pipeline
//!
//! This crate provides the value types that flow through the pipeline:
//! - `EventRecord` - One log entry: identity, classification, content, actor
//! - `EventType` - Information, Warning, Error
//! - `EventKey` - (type, source, code) signature used for dedup and recursion checks
//! - `LoggingPolicy` - Default, OnlyOnce, OncePerPeriod
//! - `ExceptionInfo` - Captured error chain rendered into the description
//! - `SiteId` - Partition scope for retention limits
//!
//! # Lifecycle
//!
//! ```text
//! constructed ──► enriched (time, user, exception text) ──► [queued] ──► persisted (id != 0)
//! ```

mod error;
mod exception;
mod key;
mod policy;
mod record;
mod site;

pub use error::ProtocolError;
pub use exception::ExceptionInfo;
pub use key::EventKey;
pub use policy::LoggingPolicy;
pub use record::{EventRecord, EventType};
pub use site::SiteId;

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Event code reserved for mail delivery failures
///
/// Error events carrying this code are never forwarded to the notification
/// collaborator, since the notifier itself reports its failures with it.
pub const SEND_EMAIL_EVENT_CODE: &str = "SENDEMAIL";

/// Tracing target under which accepted records are forwarded to the process log
pub const EVENTS_TARGET: &str = "eventlog::events";
