//! Event record types
//!
//! `EventRecord` is the value object for one log entry. Callers construct it
//! (usually through the `information`/`warning`/`error` factories), the
//! pipeline enriches it, and the store assigns its numeric id.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;
use crate::exception::ExceptionInfo;
use crate::key::EventKey;
use crate::policy::LoggingPolicy;
use crate::site::SiteId;

/// Event severity classification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    /// Informational event (default)
    #[default]
    #[serde(alias = "I", alias = "info")]
    Information,

    /// Something unexpected that did not fail the operation
    #[serde(alias = "W", alias = "warn")]
    Warning,

    /// Failed operation
    #[serde(alias = "E")]
    Error,
}

impl EventType {
    /// Single-character code used in persisted rows
    pub fn code(self) -> &'static str {
        match self {
            Self::Information => "I",
            Self::Warning => "W",
            Self::Error => "E",
        }
    }

    /// Lowercase name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Information => "information",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "i" | "info" | "information" => Ok(Self::Information),
            "w" | "warn" | "warning" => Ok(Self::Warning),
            "e" | "error" => Ok(Self::Error),
            other => Err(ProtocolError::InvalidEventType(other.to_string())),
        }
    }
}

/// One event log entry
///
/// Optional context fields stay `None` until set by the caller or by
/// enrichment. `id` is 0 until the store assigns one on insert.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventRecord {
    /// Store-assigned identifier (0 = not yet persisted)
    pub id: u64,

    pub event_type: EventType,

    /// Subsystem that raised the event
    pub source: String,

    /// Action code within the source
    pub event_code: String,

    pub description: String,

    pub url: Option<String>,
    pub url_referrer: Option<String>,
    pub user_agent: Option<String>,
    pub machine_name: Option<String>,
    pub ip_address: Option<String>,

    pub user_id: Option<u64>,
    pub user_name: Option<String>,

    /// Partition for retention (`SiteId::GLOBAL` = no site)
    pub site_id: SiteId,

    /// Optional document correlation, opaque to the pipeline
    pub node_id: Option<u64>,
    pub document_name: Option<String>,

    /// Set once at first enrichment
    pub event_time: Option<DateTime<Utc>>,

    /// Error rendered into `description` during enrichment
    pub exception: Option<ExceptionInfo>,

    pub policy: LoggingPolicy,
}

impl EventRecord {
    /// Create a record with the given classification
    pub fn new(event_type: EventType, source: impl Into<String>, event_code: impl Into<String>) -> Self {
        Self {
            event_type,
            source: source.into(),
            event_code: event_code.into(),
            ..Self::default()
        }
    }

    /// Information event
    pub fn information(
        source: impl Into<String>,
        event_code: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self::new(EventType::Information, source, event_code).with_description(description)
    }

    /// Warning event
    pub fn warning(
        source: impl Into<String>,
        event_code: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self::new(EventType::Warning, source, event_code).with_description(description)
    }

    /// Error event
    pub fn error(
        source: impl Into<String>,
        event_code: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self::new(EventType::Error, source, event_code).with_description(description)
    }

    /// Error event carrying a captured error chain
    pub fn from_error<E: std::error::Error + 'static>(
        source: impl Into<String>,
        event_code: impl Into<String>,
        err: &E,
    ) -> Self {
        Self::new(EventType::Error, source, event_code).with_exception(ExceptionInfo::from_error(err))
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_site(mut self, site_id: SiteId) -> Self {
        self.site_id = site_id;
        self
    }

    #[must_use]
    pub fn with_user(mut self, user_id: u64, user_name: impl Into<String>) -> Self {
        self.user_id = Some(user_id);
        self.user_name = Some(user_name.into());
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: LoggingPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_exception(mut self, exception: ExceptionInfo) -> Self {
        self.exception = Some(exception);
        self
    }

    #[must_use]
    pub fn with_event_time(mut self, event_time: DateTime<Utc>) -> Self {
        self.event_time = Some(event_time);
        self
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    #[must_use]
    pub fn with_document(mut self, node_id: u64, document_name: impl Into<String>) -> Self {
        self.node_id = Some(node_id);
        self.document_name = Some(document_name.into());
        self
    }

    /// Dedup / recursion signature of this record
    #[inline]
    pub fn key(&self) -> EventKey {
        EventKey::of(self)
    }

    /// Whether the store has assigned an id
    #[inline]
    pub fn is_persisted(&self) -> bool {
        self.id != 0
    }

    /// Check the construction contract: source and event code are required
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.source.trim().is_empty() {
            return Err(ProtocolError::MissingField("source"));
        }
        if self.event_code.trim().is_empty() {
            return Err(ProtocolError::MissingField("event_code"));
        }
        Ok(())
    }

    /// Append text to the description, separated by a blank line
    pub fn append_description(&mut self, text: &str) {
        if !self.description.is_empty() {
            self.description.push_str("\n\n");
        }
        self.description.push_str(text);
    }
}
