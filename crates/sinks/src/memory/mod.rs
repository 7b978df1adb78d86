//! In-memory Store
//!
//! Reference `Store` implementation backed by an ordered map. Ids are assigned
//! monotonically, so the lowest ids of a site are always its oldest records.
//!
//! Useful for tests, for the replay CLI, and for hosts that only need a bounded
//! in-process event history.
//!
//! # Example
//!
//! ```
//! use eventlog_protocol::{EventRecord, SiteId};
//! use eventlog_sinks::{MemoryStore, Store};
//!
//! let store = MemoryStore::new();
//! let id = store.insert(&EventRecord::information("App", "START", "up")).unwrap();
//! assert_eq!(id, 1);
//! assert_eq!(store.count(SiteId::GLOBAL).unwrap(), 1);
//! ```

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use eventlog_protocol::{EventRecord, SiteId};
use parking_lot::Mutex;

use crate::common::SinkMetrics;
use crate::{MetricsSnapshot, Result, SinkError, SiteFilter, Store};

/// Store keeping every record in process memory
#[derive(Debug)]
pub struct MemoryStore {
    records: Mutex<BTreeMap<u64, EventRecord>>,
    next_id: AtomicU64,
    available: AtomicBool,
    deleted: AtomicU64,
    metrics: SinkMetrics,
}

impl MemoryStore {
    /// Create an empty, available store
    pub fn new() -> Self {
        Self {
            records: Mutex::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
            available: AtomicBool::new(true),
            deleted: AtomicU64::new(0),
            metrics: SinkMetrics::new(),
        }
    }

    /// Simulate an outage: while unavailable every write fails with
    /// `SinkError::Unavailable`
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Release);
    }

    /// Look up a persisted record
    pub fn get(&self, id: u64) -> Option<EventRecord> {
        self.records.lock().get(&id).cloned()
    }

    /// All records in insertion order
    pub fn records(&self) -> Vec<EventRecord> {
        self.records.lock().values().cloned().collect()
    }

    /// All records of one site in insertion order
    pub fn site_records(&self, site: SiteId) -> Vec<EventRecord> {
        self.records
            .lock()
            .values()
            .filter(|r| r.site_id == site)
            .cloned()
            .collect()
    }

    /// Total records stored across all sites
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Whether no records are stored
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Records removed by retention and bulk deletes
    pub fn deleted(&self) -> u64 {
        self.deleted.load(Ordering::Relaxed)
    }

    /// Write metrics
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    fn ensure_available(&self) -> Result<()> {
        if self.available.load(Ordering::Acquire) {
            Ok(())
        } else {
            self.metrics.write_error();
            Err(SinkError::unavailable("memory store offline"))
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store for MemoryStore {
    fn insert(&self, record: &EventRecord) -> Result<u64> {
        self.ensure_available()?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut stored = record.clone();
        stored.id = id;
        let bytes = stored.description.len() as u64;
        self.records.lock().insert(id, stored);
        self.metrics.record_written(bytes);
        Ok(id)
    }

    fn update(&self, record: &EventRecord) -> Result<()> {
        self.ensure_available()?;

        let mut records = self.records.lock();
        match records.get_mut(&record.id) {
            Some(slot) => {
                *slot = record.clone();
                Ok(())
            }
            None => Err(SinkError::NotFound(record.id)),
        }
    }

    fn delete_oldest(&self, site: SiteId, max_size: u64, cap: u64) -> Result<u64> {
        self.ensure_available()?;

        let mut records = self.records.lock();
        let site_ids: Vec<u64> = records
            .iter()
            .filter(|(_, r)| r.site_id == site)
            .map(|(id, _)| *id)
            .collect();

        let excess = (site_ids.len() as u64).saturating_sub(max_size);
        let to_remove = excess.min(cap);
        for id in site_ids.iter().take(to_remove as usize) {
            records.remove(id);
        }
        self.deleted.fetch_add(to_remove, Ordering::Relaxed);
        Ok(to_remove)
    }

    fn count(&self, site: SiteId) -> Result<u64> {
        self.ensure_available()?;
        Ok(self.records.lock().values().filter(|r| r.site_id == site).count() as u64)
    }

    fn bulk_delete(&self, filter: SiteFilter) -> Result<u64> {
        self.ensure_available()?;

        let mut records = self.records.lock();
        let before = records.len();
        records.retain(|_, r| !filter.matches(r.site_id));
        let removed = (before - records.len()) as u64;
        self.deleted.fetch_add(removed, Ordering::Relaxed);
        Ok(removed)
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::Acquire)
    }
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod memory_test;
