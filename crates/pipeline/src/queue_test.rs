//! Queue worker tests

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use eventlog_config::{QueueConfig, UnavailablePolicy};
use eventlog_protocol::EventRecord;
use parking_lot::Mutex;

use super::{Delivery, QueueTarget, QueueWorker, spawn};
use crate::error::EventLogError;

/// Records everything the worker delivers
#[derive(Default)]
struct RecordingTarget {
    dispatched: Mutex<Vec<String>>,
    dropped: Mutex<Vec<(String, String)>>,
    unavailable: AtomicBool,
    /// Claims to be available but refuses every dispatch
    refusing: AtomicBool,
}

impl RecordingTarget {
    fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    fn set_refusing(&self, refusing: bool) {
        self.refusing.store(refusing, Ordering::SeqCst);
    }

    fn dispatched(&self) -> Vec<String> {
        self.dispatched.lock().clone()
    }

    fn dropped(&self) -> Vec<(String, String)> {
        self.dropped.lock().clone()
    }
}

impl QueueTarget for RecordingTarget {
    fn dispatch(&self, record: EventRecord) -> Delivery {
        if self.refusing.load(Ordering::SeqCst) {
            return Delivery::Deferred(record);
        }
        self.dispatched.lock().push(record.description);
        Delivery::Done
    }

    fn storage_available(&self) -> bool {
        !self.unavailable.load(Ordering::SeqCst)
    }

    fn dropped(&self, record: &EventRecord, reason: &str) {
        self.dropped
            .lock()
            .push((record.description.clone(), reason.to_string()));
    }
}

fn record(n: usize) -> EventRecord {
    EventRecord::information("Queue", "TEST", format!("R{n}"))
}

fn config() -> QueueConfig {
    QueueConfig {
        capacity: 64,
        retry_interval: Duration::from_secs(3600),
        ..Default::default()
    }
}

// ============================================================================
// Ordering
// ============================================================================

#[tokio::test]
async fn test_fifo_order() {
    let target = Arc::new(RecordingTarget::default());
    let handle = spawn(config(), target.clone()).unwrap();

    for n in 1..=3 {
        handle.enqueue(record(n), true).unwrap();
    }
    handle.flush().await.unwrap();

    assert_eq!(target.dispatched(), vec!["R1", "R2", "R3"]);
}

#[tokio::test]
async fn test_enqueue_never_blocks() {
    let target = Arc::new(RecordingTarget::default());
    let config = QueueConfig {
        capacity: 2,
        ..config()
    };

    // Worker not running: nothing drains the channel
    let (_worker, handle) = QueueWorker::new(config, target);

    handle.enqueue(record(1), true).unwrap();
    handle.enqueue(record(2), true).unwrap();
    let result = handle.enqueue(record(3), true);
    assert!(matches!(result, Err(EventLogError::QueueFull)));
}

// ============================================================================
// Storage availability
// ============================================================================

#[tokio::test]
async fn test_retain_while_unavailable() {
    let target = Arc::new(RecordingTarget::default());
    target.set_available(false);
    let handle = spawn(config(), target.clone()).unwrap();

    handle.enqueue(record(1), false).unwrap();
    handle.enqueue(record(2), false).unwrap();
    handle.flush().await.unwrap();
    assert!(target.dispatched().is_empty());

    // Storage comes back; a new record must still land after the retained ones
    target.set_available(true);
    handle.enqueue(record(3), true).unwrap();
    handle.flush().await.unwrap();

    assert_eq!(target.dispatched(), vec!["R1", "R2", "R3"]);
    assert!(target.dropped().is_empty());
}

#[tokio::test]
async fn test_retry_interval_drains() {
    let target = Arc::new(RecordingTarget::default());
    target.set_available(false);
    let config = QueueConfig {
        retry_interval: Duration::from_millis(10),
        ..config()
    };
    let handle = spawn(config, target.clone()).unwrap();

    handle.enqueue(record(1), false).unwrap();
    handle.flush().await.unwrap();
    target.set_available(true);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(target.dispatched(), vec!["R1"]);
}

#[tokio::test]
async fn test_drop_policy() {
    let target = Arc::new(RecordingTarget::default());
    target.set_available(false);
    let config = QueueConfig {
        unavailable: UnavailablePolicy::Drop,
        ..config()
    };
    let handle = spawn(config, target.clone()).unwrap();

    handle.enqueue(record(1), false).unwrap();
    handle.flush().await.unwrap();

    assert!(target.dispatched().is_empty());
    assert_eq!(
        target.dropped(),
        vec![("R1".to_string(), "storage unavailable".to_string())]
    );
}

#[tokio::test]
async fn test_max_retained() {
    let target = Arc::new(RecordingTarget::default());
    target.set_available(false);
    let config = QueueConfig {
        max_retained: 1,
        ..config()
    };
    let handle = spawn(config, target.clone()).unwrap();

    handle.enqueue(record(1), false).unwrap();
    handle.enqueue(record(2), false).unwrap();
    handle.flush().await.unwrap();

    assert_eq!(target.dropped().len(), 1);
    assert_eq!(target.dropped()[0].0, "R2");
}

#[tokio::test]
async fn test_deferred_record_retained_in_order() {
    let target = Arc::new(RecordingTarget::default());
    target.set_refusing(true);
    let handle = spawn(config(), target.clone()).unwrap();

    handle.enqueue(record(1), true).unwrap();
    handle.enqueue(record(2), true).unwrap();
    handle.flush().await.unwrap();
    assert!(target.dispatched().is_empty());
    assert!(target.dropped().is_empty());

    target.set_refusing(false);
    handle.enqueue(record(3), true).unwrap();
    handle.flush().await.unwrap();

    assert_eq!(target.dispatched(), vec!["R1", "R2", "R3"]);
}

#[tokio::test]
async fn test_deferred_record_dropped_under_drop_policy() {
    let target = Arc::new(RecordingTarget::default());
    target.set_refusing(true);
    let config = QueueConfig {
        unavailable: UnavailablePolicy::Drop,
        ..config()
    };
    let handle = spawn(config, target.clone()).unwrap();

    handle.enqueue(record(1), true).unwrap();
    handle.flush().await.unwrap();

    assert!(target.dispatched().is_empty());
    assert_eq!(
        target.dropped(),
        vec![("R1".to_string(), "storage unavailable".to_string())]
    );
}

// ============================================================================
// Lifecycle
// ============================================================================

#[tokio::test]
async fn test_shutdown_drains_and_closes() {
    let target = Arc::new(RecordingTarget::default());
    let handle = spawn(config(), target.clone()).unwrap();

    handle.enqueue(record(1), true).unwrap();
    handle.enqueue(record(2), true).unwrap();
    handle.shutdown().await.unwrap();

    assert_eq!(target.dispatched(), vec!["R1", "R2"]);
    assert!(matches!(
        handle.enqueue(record(3), true),
        Err(EventLogError::QueueClosed)
    ));
    assert!(handle.flush().await.is_err());
}

#[tokio::test]
async fn test_shutdown_drops_unavailable_retained() {
    let target = Arc::new(RecordingTarget::default());
    target.set_available(false);
    let handle = spawn(config(), target.clone()).unwrap();

    handle.enqueue(record(1), false).unwrap();
    handle.shutdown().await.unwrap();

    assert!(target.dispatched().is_empty());
    assert_eq!(target.dropped().len(), 1);
}

#[test]
fn test_spawn_outside_runtime() {
    let target = Arc::new(RecordingTarget::default());
    let result = spawn(config(), target);
    assert!(matches!(result, Err(EventLogError::NoRuntime(_))));
}
