//! Memory store tests

use eventlog_protocol::{EventRecord, SiteId};

use super::MemoryStore;
use crate::{SinkError, SiteFilter, Store};

fn fill(store: &MemoryStore, site: u32, n: usize) {
    for i in 0..n {
        let record = EventRecord::information("Test", "FILL", format!("event {i}"))
            .with_site(SiteId::new(site));
        store.insert(&record).unwrap();
    }
}

// ============================================================================
// Insert / update
// ============================================================================

#[test]
fn test_insert_assigns_increasing_ids() {
    let store = MemoryStore::new();
    let a = store.insert(&EventRecord::information("A", "X", "")).unwrap();
    let b = store.insert(&EventRecord::information("A", "X", "")).unwrap();

    assert_eq!(a, 1);
    assert_eq!(b, 2);
    assert_eq!(store.get(2).unwrap().id, 2);
    assert_eq!(store.metrics().records_written, 2);
}

#[test]
fn test_update_existing() {
    let store = MemoryStore::new();
    let id = store.insert(&EventRecord::warning("A", "X", "before")).unwrap();

    let mut record = store.get(id).unwrap();
    record.description = "after".into();
    store.update(&record).unwrap();

    assert_eq!(store.get(id).unwrap().description, "after");
}

#[test]
fn test_update_missing() {
    let store = MemoryStore::new();
    let mut record = EventRecord::warning("A", "X", "");
    record.id = 42;

    assert!(matches!(store.update(&record), Err(SinkError::NotFound(42))));
}

#[test]
fn test_unavailable_rejects_writes() {
    let store = MemoryStore::new();
    store.set_available(false);

    assert!(!store.is_available());
    let err = store.insert(&EventRecord::error("A", "X", "")).unwrap_err();
    assert!(err.is_unavailable());
    assert!(store.is_empty());

    store.set_available(true);
    assert!(store.insert(&EventRecord::error("A", "X", "")).is_ok());
}

// ============================================================================
// Retention
// ============================================================================

#[test]
fn test_delete_oldest_keeps_max_size() {
    let store = MemoryStore::new();
    fill(&store, 1, 10);
    fill(&store, 2, 3);

    let removed = store.delete_oldest(SiteId::new(1), 4, 100).unwrap();

    assert_eq!(removed, 6);
    assert_eq!(store.count(SiteId::new(1)).unwrap(), 4);
    assert_eq!(store.count(SiteId::new(2)).unwrap(), 3);

    // The newest records survive
    let kept: Vec<_> = store
        .site_records(SiteId::new(1))
        .into_iter()
        .map(|r| r.description)
        .collect();
    assert_eq!(kept, vec!["event 6", "event 7", "event 8", "event 9"]);
}

#[test]
fn test_delete_oldest_respects_cap() {
    let store = MemoryStore::new();
    fill(&store, 1, 10);

    assert_eq!(store.delete_oldest(SiteId::new(1), 0, 3).unwrap(), 3);
    assert_eq!(store.count(SiteId::new(1)).unwrap(), 7);
    assert_eq!(store.deleted(), 3);
}

#[test]
fn test_delete_oldest_under_limit_is_noop() {
    let store = MemoryStore::new();
    fill(&store, 1, 3);

    assert_eq!(store.delete_oldest(SiteId::new(1), 5, 100).unwrap(), 0);
    assert_eq!(store.len(), 3);
}

#[test]
fn test_bulk_delete_filters() {
    let store = MemoryStore::new();
    fill(&store, 1, 2);
    fill(&store, 2, 5);

    assert_eq!(store.bulk_delete(SiteFilter::Site(SiteId::new(2))).unwrap(), 5);
    assert_eq!(store.len(), 2);

    assert_eq!(store.bulk_delete(SiteFilter::All).unwrap(), 2);
    assert!(store.is_empty());
}
