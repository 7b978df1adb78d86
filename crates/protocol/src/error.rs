//! Protocol error types
//!
//! Errors raised while constructing or parsing event records.

use thiserror::Error;

/// Errors that can occur during protocol operations
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Required record field is empty
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Event type code not recognised
    #[error("invalid event type: {0}")]
    InvalidEventType(String),

    /// Logging policy kind not recognised
    #[error("unknown logging policy: {0}")]
    UnknownPolicy(String),

    /// Logging policy period could not be parsed
    #[error("invalid logging policy period '{value}': {message}")]
    InvalidPolicyPeriod { value: String, message: String },
}

impl ProtocolError {
    /// Create an unknown policy error
    #[inline]
    pub fn unknown_policy(kind: impl Into<String>) -> Self {
        Self::UnknownPolicy(kind.into())
    }

    /// Create an invalid policy period error
    #[inline]
    pub fn invalid_period(value: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPolicyPeriod {
            value: value.into(),
            message: message.into(),
        }
    }
}
