//! Logging configuration
//!
//! Controls the internal diagnostics of the pipeline and the verbosity of the
//! trace sink, which writes accepted events under the `eventlog::events`
//! tracing target.

use eventlog_protocol::EVENTS_TARGET;
use serde::Deserialize;

/// Log level
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Convert to tracing level filter string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable console output (default)
    #[default]
    Console,
    /// JSON structured logging
    Json,
}

/// Log output destination
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    /// Write to stdout (default)
    #[default]
    Stdout,
    /// Write to stderr
    Stderr,
    /// Write to a file
    #[serde(untagged)]
    File(String),
}

/// Logging configuration
///
/// # Example
///
/// ```toml
/// [log]
/// level = "info"
/// events_level = "debug"
/// format = "console"
/// output = "stderr"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Level for internal diagnostics
    /// Default: info
    pub level: LogLevel,

    /// Level for the trace sink target; falls back to `level`
    pub events_level: Option<LogLevel>,

    /// Output format (console, json)
    /// Default: console
    pub format: LogFormat,

    /// Output destination (stdout, stderr, or file path)
    /// Default: stdout
    pub output: LogOutput,
}

impl LogConfig {
    /// Build an `EnvFilter`-compatible directive string
    ///
    /// `level_override` (usually from the command line) replaces the
    /// configured base level but leaves `events_level` intact.
    pub fn filter_directive(&self, level_override: Option<&str>) -> String {
        let base = level_override.unwrap_or(self.level.as_str());
        match self.events_level {
            Some(events) => format!("{},{}={}", base, EVENTS_TARGET, events.as_str()),
            None => base.to_string(),
        }
    }
}
