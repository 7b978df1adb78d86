//! Policy gate - time-bounded deduplication of repeated events
//!
//! Decides, per `EventKey`, whether a write under the record's
//! `LoggingPolicy` may proceed.
//!
//! | Policy | Accepts when | Marks key until |
//! |--------|--------------|-----------------|
//! | `Default` | always | (never marked) |
//! | `OnlyOnce` | key not marked | forever |
//! | `OncePerPeriod(d)` | key not marked, or mark expired | now + d |
//!
//! Entries are pull-expired: an expired mark is simply replaced the next time
//! its key is accepted. `purge_expired` is available for hosts that want to
//! bound memory on long-running processes.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use eventlog_protocol::{EventKey, EventRecord, LoggingPolicy};

use crate::clock::{Clock, SystemClock};

/// Expiration of a cache entry (`None` = never expires)
type Expiry = Option<DateTime<Utc>>;

/// Dedup cache shared by every writer of one `EventLog`
pub struct PolicyCache {
    entries: DashMap<EventKey, Expiry>,
    clock: Arc<dyn Clock>,
}

impl PolicyCache {
    /// Create a cache reading time from `clock`
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
        }
    }

    /// Try to claim the record's key
    ///
    /// This is the side effect: an accepted call marks the key, so callers
    /// must call it once per logical write attempt.
    pub fn try_mark_as_logged(&self, record: &EventRecord) -> bool {
        let now = self.clock.now();
        let expiry = match record.policy {
            LoggingPolicy::Default => return true,
            LoggingPolicy::OnlyOnce => None,
            // An unrepresentable expiry behaves like OnlyOnce
            LoggingPolicy::OncePerPeriod(period) => TimeDelta::from_std(period)
                .ok()
                .and_then(|delta| now.checked_add_signed(delta)),
        };

        match self.entries.entry(record.key()) {
            Entry::Occupied(mut slot) => {
                if is_live(*slot.get(), now) {
                    return false;
                }
                slot.insert(expiry);
                true
            }
            Entry::Vacant(slot) => {
                slot.insert(expiry);
                true
            }
        }
    }

    /// Read-only check used by the queued write path
    ///
    /// Returns true if a live mark exists for the record's key. Never mutates
    /// the cache; the mark is taken later, when the queue worker dispatches.
    pub fn is_already_logged(&self, record: &EventRecord) -> bool {
        if record.policy.is_default() {
            return false;
        }
        let now = self.clock.now();
        self.entries
            .get(&record.key())
            .is_some_and(|expiry| is_live(*expiry, now))
    }

    /// Give back the mark taken for a write that did not happen
    pub fn release(&self, record: &EventRecord) {
        if !record.policy.is_default() {
            self.entries.remove(&record.key());
        }
    }

    /// Drop every mark (clear-log)
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Remove expired marks, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, expiry| is_live(*expiry, now));
        before.saturating_sub(self.entries.len())
    }

    /// Number of marks currently held (live or expired)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for PolicyCache {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl std::fmt::Debug for PolicyCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyCache")
            .field("entries", &self.entries.len())
            .finish()
    }
}

#[inline]
fn is_live(expiry: Expiry, now: DateTime<Utc>) -> bool {
    match expiry {
        None => true,
        Some(at) => at > now,
    }
}

#[cfg(test)]
#[path = "policy_gate_test.rs"]
mod policy_gate_test;
