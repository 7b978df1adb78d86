//! Event signature used for deduplication and recursion detection

use std::fmt;

use crate::record::{EventRecord, EventType};

/// Composite event signature: (type, source, code)
///
/// Description content is not part of the key, so distinct
/// messages sharing type/source/code are treated as the same event.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventKey {
    event_type: EventType,
    source: String,
    event_code: String,
}

impl EventKey {
    /// Create a key from its parts
    pub fn new(
        event_type: EventType,
        source: impl Into<String>,
        event_code: impl Into<String>,
    ) -> Self {
        Self {
            event_type,
            source: source.into(),
            event_code: event_code.into(),
        }
    }

    /// Key of the given record
    pub fn of(record: &EventRecord) -> Self {
        Self::new(record.event_type, &record.source, &record.event_code)
    }

    #[inline]
    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    #[inline]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[inline]
    pub fn event_code(&self) -> &str {
        &self.event_code
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}|{}|{}",
            self.event_type.code(),
            self.source,
            self.event_code
        )
    }
}
