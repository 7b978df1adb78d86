//! Async queue worker - decouples callers from storage latency
//!
//! Queued writes are handed to a single background task through a bounded
//! channel. Enqueueing uses `try_send` and never waits: a full channel drops
//! the record with a fallback trace. The worker is the only consumer, so
//! records reach the store in enqueue order.
//!
//! # Storage availability
//!
//! Each record travels with the caller's view of storage availability. When
//! storage is down the worker applies `UnavailablePolicy`:
//!
//! - `Retain`: hold the record (up to `max_retained`) and retry every
//!   `retry_interval`. Later records queue behind retained ones, keeping FIFO.
//! - `Drop`: drop it with a fallback note.
//!
//! The availability check is only a hint: a store can still refuse the insert.
//! The target then hands the record back as `Delivery::Deferred` and the same
//! policy applies, with the record going to the front of the retained queue.
//!
//! # Example
//!
//! ```ignore
//! let handle = queue::spawn(QueueConfig::default(), target)?;
//! handle.enqueue(record, true)?;
//! handle.flush().await?;
//! handle.shutdown().await?;
//! ```

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use eventlog_config::{QueueConfig, UnavailablePolicy};
use eventlog_protocol::EventRecord;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace, warn};

use crate::error::{EventLogError, Result};

/// Result of handing one record to a `QueueTarget`
#[derive(Debug)]
pub enum Delivery {
    /// Written, rejected or failed for good; the worker is done with it
    Done,
    /// Storage refused the write; the record comes back untouched
    Deferred(EventRecord),
}

/// Where the worker delivers records
///
/// Implemented by the event log core; a test can plug in its own.
pub trait QueueTarget: Send + Sync + 'static {
    /// Dispatch one record to counters, sinks and retention
    fn dispatch(&self, record: EventRecord) -> Delivery;

    /// Whether storage can take writes right now
    fn storage_available(&self) -> bool;

    /// A record was dropped by the worker
    fn dropped(&self, record: &EventRecord, reason: &str);
}

/// Handle for sending records to a queue worker
///
/// Cheap to clone. `enqueue` never blocks.
#[derive(Clone)]
pub struct QueueHandle {
    tx: mpsc::Sender<QueueCommand>,
}

impl QueueHandle {
    /// Hand a record to the worker (non-blocking)
    ///
    /// Fails with `QueueFull` when the channel is full and `QueueClosed`
    /// after shutdown. Callers should not retry.
    pub fn enqueue(&self, record: EventRecord, storage_available: bool) -> Result<()> {
        self.tx
            .try_send(QueueCommand::Enqueue {
                record: Box::new(record),
                storage_available,
            })
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => EventLogError::QueueFull,
                mpsc::error::TrySendError::Closed(_) => EventLogError::QueueClosed,
            })
    }

    /// Wait until every record enqueued before this call has been dispatched
    /// or retained
    pub async fn flush(&self) -> Result<()> {
        let (done, wait) = oneshot::channel();
        self.tx
            .send(QueueCommand::Flush(done))
            .await
            .map_err(|_| EventLogError::QueueClosed)?;
        wait.await.map_err(|_| EventLogError::QueueClosed)
    }

    /// Drain the queue and stop the worker
    pub async fn shutdown(&self) -> Result<()> {
        let (done, wait) = oneshot::channel();
        self.tx
            .send(QueueCommand::Shutdown(done))
            .await
            .map_err(|_| EventLogError::QueueClosed)?;
        wait.await.map_err(|_| EventLogError::QueueClosed)
    }

    /// Whether the worker has stopped
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Whether two handles feed the same worker
    pub fn same_worker(&self, other: &QueueHandle) -> bool {
        self.tx.same_channel(&other.tx)
    }
}

impl std::fmt::Debug for QueueHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueHandle")
            .field("closed", &self.is_closed())
            .field("capacity", &self.tx.capacity())
            .finish()
    }
}

/// Commands sent to the worker task
enum QueueCommand {
    Enqueue {
        record: Box<EventRecord>,
        storage_available: bool,
    },
    Flush(oneshot::Sender<()>),
    Shutdown(oneshot::Sender<()>),
}

/// Queue worker that runs in a background task
pub struct QueueWorker {
    config: QueueConfig,
    rx: mpsc::Receiver<QueueCommand>,
    target: Arc<dyn QueueTarget>,
    retained: VecDeque<EventRecord>,
}

impl QueueWorker {
    /// Create a worker and its handle
    ///
    /// The worker must be spawned as a task using `run()`.
    pub fn new(config: QueueConfig, target: Arc<dyn QueueTarget>) -> (Self, QueueHandle) {
        let (tx, rx) = mpsc::channel(config.capacity.max(1));
        let worker = Self {
            config,
            rx,
            target,
            retained: VecDeque::new(),
        };
        (worker, QueueHandle { tx })
    }

    /// Run the worker loop until shutdown or until every handle is dropped
    pub async fn run(mut self) {
        debug!(
            capacity = self.config.capacity,
            retry_interval = ?self.config.retry_interval,
            unavailable = ?self.config.unavailable,
            "event queue worker started"
        );

        // interval() panics on zero
        let period = self.config.retry_interval.max(Duration::from_millis(1));
        let mut retry = tokio::time::interval(period);
        retry.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = retry.tick() => {
                    if !self.retained.is_empty() {
                        self.drain_retained();
                    }
                }
                cmd = self.rx.recv() => {
                    match cmd {
                        Some(QueueCommand::Enqueue { record, storage_available }) => {
                            self.accept(*record, storage_available);
                        }
                        Some(QueueCommand::Flush(done)) => {
                            self.drain_retained();
                            let _ = done.send(());
                        }
                        Some(QueueCommand::Shutdown(done)) => {
                            self.stop();
                            let _ = done.send(());
                            break;
                        }
                        None => {
                            self.stop();
                            break;
                        }
                    }
                }
            }
        }

        debug!("event queue worker stopped");
    }

    fn accept(&mut self, record: EventRecord, storage_available: bool) {
        if storage_available && self.retained.is_empty() && self.target.storage_available() {
            trace!(key = %record.key(), "dispatching queued event");
            if let Delivery::Deferred(record) = self.target.dispatch(record) {
                self.defer(record);
            }
            return;
        }

        match self.config.unavailable {
            UnavailablePolicy::Retain => self.retain(record),
            UnavailablePolicy::Drop if self.retained.is_empty() => {
                self.target.dropped(&record, "storage unavailable");
            }
            // Records retained before a policy switch still go first
            UnavailablePolicy::Drop => self.retain(record),
        }

        if self.target.storage_available() {
            self.drain_retained();
        }
    }

    fn retain(&mut self, record: EventRecord) {
        if self.retained.len() >= self.config.max_retained {
            self.target.dropped(&record, "retained queue full");
            return;
        }
        self.retained.push_back(record);
        trace!(retained = self.retained.len(), "event retained while storage unavailable");
    }

    /// A record the store refused at insert time
    ///
    /// It was the oldest pending record, so it goes back to the front.
    fn defer(&mut self, record: EventRecord) {
        match self.config.unavailable {
            UnavailablePolicy::Retain => {
                self.retained.push_front(record);
                trace!(retained = self.retained.len(), "event deferred by store");
            }
            UnavailablePolicy::Drop => self.target.dropped(&record, "storage unavailable"),
        }
    }

    /// Dispatch retained records in order while storage stays available
    fn drain_retained(&mut self) {
        let mut dispatched = 0usize;
        while self.target.storage_available() {
            let Some(record) = self.retained.pop_front() else {
                break;
            };
            if let Delivery::Deferred(record) = self.target.dispatch(record) {
                self.defer(record);
                break;
            }
            dispatched += 1;
        }
        if dispatched > 0 {
            debug!(dispatched, remaining = self.retained.len(), "retained events dispatched");
        }
    }

    /// Deliver what can be delivered, drop the rest
    fn stop(&mut self) {
        self.rx.close();
        while let Ok(cmd) = self.rx.try_recv() {
            match cmd {
                QueueCommand::Enqueue {
                    record,
                    storage_available,
                } => self.accept(*record, storage_available),
                QueueCommand::Flush(done) | QueueCommand::Shutdown(done) => {
                    let _ = done.send(());
                }
            }
        }

        self.drain_retained();
        if !self.retained.is_empty() {
            warn!(
                count = self.retained.len(),
                "dropping retained events at shutdown, storage unavailable"
            );
            for record in self.retained.drain(..) {
                self.target.dropped(&record, "shutdown with storage unavailable");
            }
        }
    }
}

/// Spawn a worker on the current tokio runtime
///
/// Returns a handle for enqueueing. The task runs until shutdown or until
/// every handle is dropped.
pub fn spawn(config: QueueConfig, target: Arc<dyn QueueTarget>) -> Result<QueueHandle> {
    let runtime = tokio::runtime::Handle::try_current()
        .map_err(|e| EventLogError::NoRuntime(e.to_string()))?;
    let (worker, handle) = QueueWorker::new(config, target);
    runtime.spawn(worker.run());
    Ok(handle)
}

#[cfg(test)]
#[path = "queue_test.rs"]
mod queue_test;
