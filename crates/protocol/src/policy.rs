//! Logging policies
//!
//! A policy decides whether a repeated event signature is actually written.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Deduplication rule attached to an event record
///
/// String form (config files, JSON input):
///
/// | Form | Policy |
/// |------|--------|
/// | `default` | `Default` |
/// | `only_once` | `OnlyOnce` |
/// | `once_per_period:10m` | `OncePerPeriod(10 minutes)` |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LoggingPolicy {
    /// Every write proceeds
    #[default]
    Default,

    /// At most one accepted write per key for the lifetime of the cache
    OnlyOnce,

    /// At most one accepted write per key within the period
    OncePerPeriod(Duration),
}

impl LoggingPolicy {
    /// Whether this policy needs a dedup cache lookup
    #[inline]
    pub fn is_default(&self) -> bool {
        matches!(self, Self::Default)
    }
}

impl fmt::Display for LoggingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("default"),
            Self::OnlyOnce => f.write_str("only_once"),
            Self::OncePerPeriod(period) => {
                write!(f, "once_per_period:{}", humantime::format_duration(*period))
            }
        }
    }
}

impl FromStr for LoggingPolicy {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (kind, arg) = match s.split_once(':') {
            Some((kind, arg)) => (kind.trim(), Some(arg.trim())),
            None => (s, None),
        };

        match (kind.to_ascii_lowercase().as_str(), arg) {
            ("default", None) => Ok(Self::Default),
            ("only_once", None) => Ok(Self::OnlyOnce),
            ("once_per_period", Some(period)) => {
                let period = humantime::parse_duration(period)
                    .map_err(|e| ProtocolError::invalid_period(period, e.to_string()))?;
                if period.is_zero() {
                    return Err(ProtocolError::invalid_period(
                        s,
                        "period must be greater than zero",
                    ));
                }
                Ok(Self::OncePerPeriod(period))
            }
            ("once_per_period", None) => {
                Err(ProtocolError::invalid_period(s, "missing period"))
            }
            _ => Err(ProtocolError::unknown_policy(s)),
        }
    }
}

impl TryFrom<String> for LoggingPolicy {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LoggingPolicy> for String {
    fn from(policy: LoggingPolicy) -> Self {
        policy.to_string()
    }
}
