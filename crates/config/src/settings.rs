//! Settings lookup
//!
//! The pipeline reads its switches through the `Settings` trait rather than
//! holding a `Config`, so hosts can back it with any key/value store.
//! Site-scoped lookups fall back to the global value when the site has no
//! override.

use std::collections::HashMap;

use eventlog_protocol::SiteId;
use parking_lot::RwLock;

use crate::Config;

/// Well-known setting keys
pub mod keys {
    /// Global logging switch (bool)
    pub const LOGGING_ENABLED: &str = "event_log.enabled";
    /// Persist records to the store (bool)
    pub const LOG_TO_DATABASE: &str = "sinks.database";
    /// Append records to the file sink (bool)
    pub const LOG_TO_FILE: &str = "sinks.file";
    /// Write records through the trace sink (bool)
    pub const LOG_TO_TRACE: &str = "sinks.trace";
    /// Retention ceiling per site (int, 0 disables logging for the site)
    pub const LOG_SIZE: &str = "event_log.log_size";
    /// Allowed overshoot before trimming, in percent (int)
    pub const LOG_KEEP_PERCENT: &str = "event_log.keep_percent";
    /// Cap on rows deleted per trim run (int)
    pub const MAX_DELETE_PER_RUN: &str = "event_log.max_delete_per_run";
    /// Fall back to a sanitized actor name (bool)
    pub const RESOLVE_SAFE_USER_NAME: &str = "event_log.resolve_safe_user_name";
    /// Max length of the description embedded in recursion notes (int)
    pub const RECURSION_NOTE_MAX_LEN: &str = "event_log.recursion_note_max_len";
    /// Display name of a site (string)
    pub const SITE_NAME: &str = "site.name";
    /// Machine name stamped on records (string)
    pub const MACHINE_NAME: &str = "global.machine_name";
}

/// Key/value settings source
pub trait Settings: Send + Sync {
    /// Boolean setting for a site (falls back to global)
    fn get_bool(&self, key: &str, site: SiteId) -> Option<bool>;

    /// Integer setting for a site (falls back to global)
    fn get_int(&self, key: &str, site: SiteId) -> Option<i64>;

    /// String setting for a site (falls back to global)
    fn get_string(&self, key: &str, site: SiteId) -> Option<String>;
}

impl Settings for Config {
    fn get_bool(&self, key: &str, _site: SiteId) -> Option<bool> {
        match key {
            keys::LOGGING_ENABLED => Some(self.event_log.enabled),
            keys::LOG_TO_DATABASE => Some(self.sinks.database),
            keys::LOG_TO_FILE => Some(self.sinks.file.enabled),
            keys::LOG_TO_TRACE => Some(self.sinks.trace),
            keys::RESOLVE_SAFE_USER_NAME => Some(self.event_log.resolve_safe_user_name),
            _ => None,
        }
    }

    fn get_int(&self, key: &str, site: SiteId) -> Option<i64> {
        let value = match key {
            keys::LOG_SIZE => self.log_size(site),
            keys::LOG_KEEP_PERCENT => u64::from(self.keep_percent(site)),
            keys::MAX_DELETE_PER_RUN => self.event_log.max_delete_per_run,
            keys::RECURSION_NOTE_MAX_LEN => self.event_log.recursion_note_max_len as u64,
            _ => return None,
        };
        i64::try_from(value).ok()
    }

    fn get_string(&self, key: &str, site: SiteId) -> Option<String> {
        match key {
            keys::SITE_NAME => self.site(site).and_then(|s| s.name.clone()),
            keys::MACHINE_NAME => Some(self.global.machine_name.clone()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
enum SettingValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

/// In-memory settings that can be changed at runtime
///
/// Values set for `SiteId::GLOBAL` act as the fallback for every site.
#[derive(Debug, Default)]
pub struct MemorySettings {
    values: RwLock<HashMap<(String, SiteId), SettingValue>>,
}

impl MemorySettings {
    /// Create an empty settings store
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from a parsed configuration (global values and site overrides)
    pub fn from_config(config: &Config) -> Self {
        let settings = Self::new();
        for key in [
            keys::LOGGING_ENABLED,
            keys::LOG_TO_DATABASE,
            keys::LOG_TO_FILE,
            keys::LOG_TO_TRACE,
            keys::RESOLVE_SAFE_USER_NAME,
        ] {
            if let Some(value) = config.get_bool(key, SiteId::GLOBAL) {
                settings.set_bool(key, SiteId::GLOBAL, value);
            }
        }
        for key in [
            keys::LOG_SIZE,
            keys::LOG_KEEP_PERCENT,
            keys::MAX_DELETE_PER_RUN,
            keys::RECURSION_NOTE_MAX_LEN,
        ] {
            if let Some(value) = config.get_int(key, SiteId::GLOBAL) {
                settings.set_int(key, SiteId::GLOBAL, value);
            }
        }
        settings.set_string(keys::MACHINE_NAME, SiteId::GLOBAL, &config.global.machine_name);

        for site in &config.sites {
            let id = SiteId::new(site.id);
            if let Some(size) = site.log_size {
                settings.set_int(keys::LOG_SIZE, id, i64::try_from(size).unwrap_or(i64::MAX));
            }
            if let Some(keep) = site.keep_percent {
                settings.set_int(keys::LOG_KEEP_PERCENT, id, i64::from(keep));
            }
            if let Some(ref name) = site.name {
                settings.set_string(keys::SITE_NAME, id, name);
            }
        }
        settings
    }

    pub fn set_bool(&self, key: &str, site: SiteId, value: bool) {
        self.set(key, site, SettingValue::Bool(value));
    }

    pub fn set_int(&self, key: &str, site: SiteId, value: i64) {
        self.set(key, site, SettingValue::Int(value));
    }

    pub fn set_string(&self, key: &str, site: SiteId, value: impl Into<String>) {
        self.set(key, site, SettingValue::Str(value.into()));
    }

    /// Remove a value (site-specific or global)
    pub fn remove(&self, key: &str, site: SiteId) {
        self.values.write().remove(&(key.to_string(), site));
    }

    fn set(&self, key: &str, site: SiteId, value: SettingValue) {
        self.values.write().insert((key.to_string(), site), value);
    }

    fn lookup(&self, key: &str, site: SiteId) -> Option<SettingValue> {
        let values = self.values.read();
        values
            .get(&(key.to_string(), site))
            .or_else(|| values.get(&(key.to_string(), SiteId::GLOBAL)))
            .cloned()
    }
}

impl Settings for MemorySettings {
    fn get_bool(&self, key: &str, site: SiteId) -> Option<bool> {
        match self.lookup(key, site)? {
            SettingValue::Bool(v) => Some(v),
            SettingValue::Int(v) => Some(v != 0),
            SettingValue::Str(v) => v.parse().ok(),
        }
    }

    fn get_int(&self, key: &str, site: SiteId) -> Option<i64> {
        match self.lookup(key, site)? {
            SettingValue::Int(v) => Some(v),
            SettingValue::Bool(v) => Some(i64::from(v)),
            SettingValue::Str(v) => v.trim().parse().ok(),
        }
    }

    fn get_string(&self, key: &str, site: SiteId) -> Option<String> {
        match self.lookup(key, site)? {
            SettingValue::Str(v) => Some(v),
            SettingValue::Int(v) => Some(v.to_string()),
            SettingValue::Bool(v) => Some(v.to_string()),
        }
    }
}
