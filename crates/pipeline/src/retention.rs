//! Retention controller - keeps each site's log near its ceiling
//!
//! Tracks an approximate per-site item count and trims the oldest records
//! once the count overshoots the ceiling by the keep-percent buffer:
//!
//! ```text
//! trim when  count > max_size * (100 + keep_percent) / 100
//! ```
//!
//! With `max_size = 100` and `keep_percent = 10` nothing happens at 101..=110;
//! the insert that makes it 111 schedules one trim. Trims run on a background
//! thread and are single-flight per controller: triggers while one is running
//! are no-ops, and the next insert catches any remaining overshoot.
//!
//! `max_size = 0` means unlimited retention.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use dashmap::DashMap;
use eventlog_config::{Settings, keys};
use eventlog_protocol::SiteId;
use eventlog_sinks::{SiteFilter, Store};
use tracing::{debug, warn};

use crate::error::{EventLogError, Result};

/// Default ceiling when the setting is missing
pub const DEFAULT_LOG_SIZE: u64 = 1000;

/// Default overshoot buffer in percent
pub const DEFAULT_KEEP_PERCENT: u64 = 10;

/// Default cap on records deleted by one trim run
pub const DEFAULT_MAX_DELETE_PER_RUN: u64 = 50_000;

/// Resolved limits of one site
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiteLimits {
    /// Retention ceiling (0 = unlimited)
    pub max_size: u64,
    /// Allowed overshoot in percent
    pub keep_percent: u64,
}

impl SiteLimits {
    /// Whether `count` overshoots the ceiling plus buffer
    #[inline]
    pub fn exceeded_by(self, count: u64) -> bool {
        if self.max_size == 0 {
            return false;
        }
        let threshold = u128::from(self.max_size) * u128::from(100 + self.keep_percent);
        u128::from(count) * 100 > threshold
    }
}

/// Outcome of recording an insert
#[derive(Debug)]
pub enum RetentionTrigger {
    /// Below threshold, unlimited, or count unknown
    NotNeeded,
    /// A trim is already running
    AlreadyRunning,
    /// A trim was started on a background thread
    Scheduled(JoinHandle<()>),
}

impl RetentionTrigger {
    pub fn is_scheduled(&self) -> bool {
        matches!(self, Self::Scheduled(_))
    }
}

/// Releases the single-flight flag when the trim thread ends
struct InFlight(Arc<AtomicBool>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Per-site count tracking and trimming
///
/// At most one trim runs per controller. Each `EventLog` owns its own
/// controller, so several logs sharing one store can trim it concurrently.
pub struct RetentionController {
    store: Arc<dyn Store>,
    settings: Arc<dyn Settings>,
    /// Approximate count per site (`None` = unknown, recount on next insert)
    counts: Arc<DashMap<SiteId, Option<u64>>>,
    /// Limits resolved from settings
    limits: DashMap<SiteId, SiteLimits>,
    in_flight: Arc<AtomicBool>,
}

impl RetentionController {
    pub fn new(store: Arc<dyn Store>, settings: Arc<dyn Settings>) -> Self {
        Self {
            store,
            settings,
            counts: Arc::new(DashMap::new()),
            limits: DashMap::new(),
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Limits of a site, resolved from settings on first use
    pub fn limits(&self, site: SiteId) -> SiteLimits {
        if let Some(limits) = self.limits.get(&site) {
            return *limits;
        }
        let limits = SiteLimits {
            max_size: self.setting(keys::LOG_SIZE, site, DEFAULT_LOG_SIZE),
            keep_percent: self.setting(keys::LOG_KEEP_PERCENT, site, DEFAULT_KEEP_PERCENT),
        };
        self.limits.insert(site, limits);
        limits
    }

    /// Cap on records deleted per trim run
    pub fn max_delete_per_run(&self) -> u64 {
        self.setting(keys::MAX_DELETE_PER_RUN, SiteId::GLOBAL, DEFAULT_MAX_DELETE_PER_RUN)
            .max(1)
    }

    /// Cached item count of a site (`None` = unknown)
    pub fn item_count(&self, site: SiteId) -> Option<u64> {
        self.counts.get(&site).and_then(|count| *count)
    }

    /// Whether a trim is running
    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Account for one stored record and trim if needed
    pub fn record_insert(&self, site: SiteId) -> RetentionTrigger {
        let limits = self.limits(site);

        let known = self.counts.get_mut(&site).and_then(|mut slot| {
            let next = (*slot)? + 1;
            *slot = Some(next);
            Some(next)
        });
        let count = match known {
            Some(count) => count,
            None => match self.store.count(site) {
                // The fresh count already includes this insert
                Ok(count) => {
                    self.counts.insert(site, Some(count));
                    count
                }
                Err(e) => {
                    warn!(site = site.get(), error = %e, "event count unavailable");
                    return RetentionTrigger::NotNeeded;
                }
            },
        };

        if !limits.exceeded_by(count) {
            return RetentionTrigger::NotNeeded;
        }
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return RetentionTrigger::AlreadyRunning;
        }

        let cap = self.max_delete_per_run();
        let estimate = count.saturating_sub(cap).max(limits.max_size);
        self.counts.insert(site, Some(estimate));

        let flight = InFlight(Arc::clone(&self.in_flight));
        let store = Arc::clone(&self.store);
        let counts = Arc::clone(&self.counts);
        let max_size = limits.max_size;

        let spawned = std::thread::Builder::new()
            .name("eventlog-retention".into())
            .spawn(move || {
                let _flight = flight;
                match store.delete_oldest(site, max_size, cap) {
                    Ok(deleted) => {
                        debug!(site = site.get(), deleted, max_size, "event log trimmed");
                    }
                    Err(e) => {
                        warn!(site = site.get(), error = %e, "event log trim failed");
                        counts.insert(site, None);
                    }
                }
            });

        match spawned {
            Ok(handle) => {
                debug!(site = site.get(), count, max_size, cap, "event log trim scheduled");
                RetentionTrigger::Scheduled(handle)
            }
            Err(e) => {
                // The closure (and its flag guard) was dropped with the error
                warn!(site = site.get(), error = %e, "failed to start trim thread");
                self.counts.insert(site, None);
                RetentionTrigger::NotNeeded
            }
        }
    }

    /// Synchronous trim sweep over several sites
    ///
    /// Applies the same threshold to a fresh count of each site. Returns
    /// whether any site had records deleted.
    pub fn trim_sites(&self, sites: &[SiteId]) -> Result<bool> {
        let cap = self.max_delete_per_run();
        let mut any = false;

        for &site in sites {
            let limits = self.limits(site);
            if limits.max_size == 0 {
                continue;
            }
            let count = self.store.count(site).map_err(EventLogError::Store)?;
            if !limits.exceeded_by(count) {
                self.counts.insert(site, Some(count));
                continue;
            }

            let deleted = self
                .store
                .delete_oldest(site, limits.max_size, cap)
                .map_err(EventLogError::Store)?;
            self.counts.insert(site, Some(count.saturating_sub(deleted)));
            debug!(site = site.get(), deleted, "event log trimmed by sweep");
            any |= deleted > 0;
        }
        Ok(any)
    }

    /// Forget cached counts after a bulk delete
    pub fn mark_unknown(&self, filter: SiteFilter) {
        match filter {
            SiteFilter::All => self.counts.clear(),
            SiteFilter::Site(site) => {
                self.counts.insert(site, None);
            }
        }
    }

    /// Drop cached limits so changed settings are picked up
    pub fn invalidate(&self) {
        self.limits.clear();
    }

    fn setting(&self, key: &str, site: SiteId, default: u64) -> u64 {
        match self.settings.get_int(key, site) {
            Some(value) => u64::try_from(value).unwrap_or(0),
            None => default,
        }
    }
}

impl std::fmt::Debug for RetentionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetentionController")
            .field("sites", &self.counts.len())
            .field("running", &self.is_running())
            .finish()
    }
}

#[cfg(test)]
#[path = "retention_test.rs"]
mod retention_test;
