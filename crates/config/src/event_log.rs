//! Event log pipeline configuration
//!
//! # Defaults
//!
//! - `enabled`: true
//! - `log_size`: 1000 entries per site
//! - `keep_percent`: 10 (trim once the log overshoots its size by 10%)
//! - `max_delete_per_run`: 50000
//! - queue: 10000 slots, retain records while storage is unavailable

use std::time::Duration;

use serde::Deserialize;

/// What the queue worker does with records while storage is unavailable
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UnavailablePolicy {
    /// Hold records in memory and retry on the next interval (default)
    #[default]
    Retain,
    /// Drop records with a fallback trace write
    Drop,
}

/// Queue worker configuration
///
/// ```toml
/// [event_log.queue]
/// capacity = 10000
/// retry_interval = "5s"
/// unavailable = "retain"
/// max_retained = 100000
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Bounded channel size; enqueue never blocks, a full channel drops
    /// Default: 10000
    pub capacity: usize,

    /// How often retained records are retried
    /// Default: 5s
    #[serde(with = "humantime_serde")]
    pub retry_interval: Duration,

    /// Behaviour while storage is unavailable
    /// Default: retain
    pub unavailable: UnavailablePolicy,

    /// Ceiling on retained records; further records are dropped
    /// Default: 100000
    pub max_retained: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: 10_000,
            retry_interval: Duration::from_secs(5),
            unavailable: UnavailablePolicy::Retain,
            max_retained: 100_000,
        }
    }
}

/// Rate limiting for last-resort fallback writes
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    /// Minimum interval between fallback writes
    /// Default: 10s
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
        }
    }
}

/// Event log configuration
///
/// ```toml
/// [event_log]
/// enabled = true
/// log_size = 1000
/// keep_percent = 10
/// max_delete_per_run = 50000
/// resolve_safe_user_name = false
/// recursion_note_max_len = 2000
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EventLogConfig {
    /// Global logging switch
    /// Default: true
    pub enabled: bool,

    /// Maximum entries retained per site; 0 disables logging for the site
    /// Default: 1000
    pub log_size: u64,

    /// Allowed overshoot (percent of `log_size`) before a trim runs
    /// Default: 10
    pub keep_percent: u32,

    /// Cap on rows deleted by a single trim run
    /// Default: 50000
    pub max_delete_per_run: u64,

    /// Fall back to the actor's sanitized name when no user is resolved
    /// Default: false
    pub resolve_safe_user_name: bool,

    /// Maximum length of the original description embedded in a recursion note
    /// Default: 2000
    pub recursion_note_max_len: usize,

    /// Queue worker settings
    pub queue: QueueConfig,

    /// Fallback writer settings
    pub fallback: FallbackConfig,
}

impl Default for EventLogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_size: 1000,
            keep_percent: 10,
            max_delete_per_run: 50_000,
            resolve_safe_user_name: false,
            recursion_note_max_len: 2000,
            queue: QueueConfig::default(),
            fallback: FallbackConfig::default(),
        }
    }
}
