//! Event Log Configuration
//!
//! TOML-based configuration loading with sensible defaults, plus the
//! `Settings` lookup trait the pipeline reads its switches through.
//! Minimal config should just work - only specify what you need to change.
//!
//! # Parsing
//!
//! Use the `FromStr` trait to parse configuration:
//!
//! ```
//! use eventlog_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[event_log]\nlog_size = 500").unwrap();
//! assert_eq!(config.event_log.log_size, 500);
//! ```
//!
//! # Example Full Config
//!
//! ```toml
//! [global]
//! machine_name = "web-01"
//!
//! [log]
//! level = "info"
//!
//! [event_log]
//! enabled = true
//! log_size = 1000
//! keep_percent = 10
//!
//! [event_log.queue]
//! capacity = 10000
//! unavailable = "retain"
//!
//! [sinks]
//! database = true
//! trace = true
//! file = { enabled = true, path = "logs/eventlog.log" }
//!
//! [[sites]]
//! id = 5
//! name = "shop"
//! log_size = 50
//! ```

mod error;
mod event_log;
mod global;
mod logging;
mod settings;
mod sinks;
mod sites;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use error::{ConfigError, Result};
pub use event_log::{EventLogConfig, FallbackConfig, QueueConfig, UnavailablePolicy};
pub use global::GlobalConfig;
pub use logging::{LogConfig, LogFormat, LogLevel, LogOutput};
pub use settings::{MemorySettings, Settings, keys};
pub use sinks::{FileSinkConfig, SinksConfig};
pub use sites::SiteConfig;

use eventlog_protocol::SiteId;
use serde::Deserialize;

/// Main configuration structure
///
/// All sections are optional with sensible defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Process-wide settings (machine name)
    pub global: GlobalConfig,

    /// Internal diagnostics logging
    pub log: LogConfig,

    /// Event log pipeline behaviour (switches, retention, queue)
    pub event_log: EventLogConfig,

    /// Sink toggles (database, file, trace)
    pub sinks: SinksConfig,

    /// Per-site overrides
    pub sites: Vec<SiteConfig>,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read, contains invalid TOML, or
    /// fails validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string
    ///
    /// Prefer using the `FromStr` trait implementation.
    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }

    /// Override block for a site, if configured
    pub fn site(&self, site: SiteId) -> Option<&SiteConfig> {
        if site.is_global() {
            return None;
        }
        self.sites.iter().find(|s| s.id == site.get())
    }

    /// Effective log size for a site (site override, else global default)
    pub fn log_size(&self, site: SiteId) -> u64 {
        self.site(site)
            .and_then(|s| s.log_size)
            .unwrap_or(self.event_log.log_size)
    }

    /// Effective keep-percent buffer for a site
    pub fn keep_percent(&self, site: SiteId) -> u32 {
        self.site(site)
            .and_then(|s| s.keep_percent)
            .unwrap_or(self.event_log.keep_percent)
    }

    /// Names of the enabled sinks
    pub fn enabled_sinks(&self) -> Vec<&'static str> {
        let mut sinks = Vec::new();
        if self.sinks.database {
            sinks.push("database");
        }
        if self.sinks.file.enabled {
            sinks.push("file");
        }
        if self.sinks.trace {
            sinks.push("trace");
        }
        sinks
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::str::FromStr;
    use std::time::Duration;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_str("").unwrap();
        assert!(config.event_log.enabled);
        assert_eq!(config.event_log.log_size, 1000);
        assert_eq!(config.event_log.keep_percent, 10);
        assert_eq!(config.event_log.max_delete_per_run, 50_000);
        assert!(config.sites.is_empty());
        assert_eq!(config.enabled_sinks(), vec!["database"]);
    }

    #[test]
    fn test_full_config_parse() {
        let toml = r#"
[global]
machine_name = "web-01"

[log]
level = "debug"
format = "json"

[event_log]
enabled = true
log_size = 200
keep_percent = 25
max_delete_per_run = 1000
resolve_safe_user_name = true

[event_log.queue]
capacity = 64
retry_interval = "250ms"
unavailable = "drop"

[event_log.fallback]
interval = "1s"

[sinks]
database = true
trace = true
file = { enabled = true, path = "logs/events.log" }

[[sites]]
id = 5
name = "shop"
log_size = 50

[[sites]]
id = 6
keep_percent = 0
"#;
        let config = Config::from_str(toml).unwrap();

        assert_eq!(config.global.machine_name, "web-01");
        assert_eq!(config.log.level, LogLevel::Debug);
        assert_eq!(config.event_log.log_size, 200);
        assert_eq!(config.event_log.max_delete_per_run, 1000);
        assert!(config.event_log.resolve_safe_user_name);
        assert_eq!(config.event_log.queue.capacity, 64);
        assert_eq!(config.event_log.queue.retry_interval, Duration::from_millis(250));
        assert_eq!(config.event_log.queue.unavailable, UnavailablePolicy::Drop);
        assert_eq!(config.event_log.fallback.interval, Duration::from_secs(1));
        assert_eq!(config.enabled_sinks(), vec!["database", "file", "trace"]);
        assert_eq!(config.sites.len(), 2);

        assert_eq!(config.log_size(SiteId::new(5)), 50);
        assert_eq!(config.log_size(SiteId::new(6)), 200);
        assert_eq!(config.log_size(SiteId::GLOBAL), 200);
        assert_eq!(config.keep_percent(SiteId::new(6)), 0);
        assert_eq!(config.keep_percent(SiteId::new(5)), 25);
    }

    #[test]
    fn test_invalid_toml() {
        let result = Config::from_str("invalid { toml");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_validation_runs_on_parse() {
        let result = Config::from_str("[event_log]\nmax_delete_per_run = 0");
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[event_log]\nlog_size = 42").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.event_log.log_size, 42);
    }

    #[test]
    fn test_from_missing_file() {
        let result = Config::from_file("/nonexistent/eventlog.toml");
        assert!(matches!(result, Err(ConfigError::IoError { .. })));
    }
}
