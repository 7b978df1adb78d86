//! Sink toggles
//!
//! Each accepted record is fanned out to the enabled sinks. The database
//! sink is the persistent store; file and trace sinks are secondary copies.

use std::path::PathBuf;

use serde::Deserialize;

/// File sink configuration
///
/// ```toml
/// [sinks.file]
/// enabled = true
/// path = "logs/eventlog.log"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FileSinkConfig {
    /// Default: false
    pub enabled: bool,

    /// File the records are appended to
    /// Default: logs/eventlog.log
    pub path: PathBuf,
}

impl Default for FileSinkConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: PathBuf::from("logs/eventlog.log"),
        }
    }
}

/// Sink toggles
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SinksConfig {
    /// Persist records to the store
    /// Default: true
    pub database: bool,

    /// Write records through `tracing`
    /// Default: false
    pub trace: bool,

    /// Append records to a text file
    pub file: FileSinkConfig,
}

impl Default for SinksConfig {
    fn default() -> Self {
        Self {
            database: true,
            trace: false,
            file: FileSinkConfig::default(),
        }
    }
}
