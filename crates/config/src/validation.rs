//! Configuration validation
//!
//! Validates config consistency:
//! - Retention numbers are usable (`max_delete_per_run > 0`, sane `keep_percent`)
//! - Queue capacity is non-zero
//! - Site ids are non-zero and unique
//! - Enabled file sink has a path

use std::collections::HashSet;

use crate::Config;
use crate::error::{ConfigError, Result};

/// Upper bound for `keep_percent` (overshoot of 10x the log size)
const MAX_KEEP_PERCENT: u32 = 1000;

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_event_log(config)?;
    validate_sinks(config)?;
    validate_sites(config)?;
    Ok(())
}

fn validate_event_log(config: &Config) -> Result<()> {
    let event_log = &config.event_log;

    if event_log.max_delete_per_run == 0 {
        return Err(ConfigError::invalid_value(
            "event_log",
            "event_log",
            "max_delete_per_run",
            "must be greater than zero",
        ));
    }

    if event_log.keep_percent > MAX_KEEP_PERCENT {
        return Err(ConfigError::invalid_value(
            "event_log",
            "event_log",
            "keep_percent",
            format!("must be at most {}", MAX_KEEP_PERCENT),
        ));
    }

    if event_log.queue.capacity == 0 {
        return Err(ConfigError::invalid_value(
            "event_log",
            "queue",
            "capacity",
            "must be greater than zero",
        ));
    }

    if event_log.queue.retry_interval.is_zero() {
        return Err(ConfigError::invalid_value(
            "event_log",
            "queue",
            "retry_interval",
            "must be greater than zero",
        ));
    }

    Ok(())
}

fn validate_sinks(config: &Config) -> Result<()> {
    let file = &config.sinks.file;
    if file.enabled && file.path.as_os_str().is_empty() {
        return Err(ConfigError::missing_field("sink", "file", "path"));
    }
    Ok(())
}

fn validate_sites(config: &Config) -> Result<()> {
    let mut seen = HashSet::new();

    for site in &config.sites {
        if site.id == 0 {
            return Err(ConfigError::invalid_value(
                "site",
                site.name.clone().unwrap_or_default(),
                "id",
                "0 is reserved for global events",
            ));
        }

        if !seen.insert(site.id) {
            return Err(ConfigError::DuplicateSite { id: site.id });
        }

        if let Some(keep) = site.keep_percent
            && keep > MAX_KEEP_PERCENT
        {
            return Err(ConfigError::invalid_value(
                "site",
                site.id.to_string(),
                "keep_percent",
                format!("must be at most {}", MAX_KEEP_PERCENT),
            ));
        }
    }

    Ok(())
}
