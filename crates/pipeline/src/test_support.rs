//! Shared test doubles

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use eventlog_protocol::{EventRecord, SiteId};
use eventlog_sinks::{EventSink, MemoryStore, NotificationSink, SinkError, SiteFilter, Store};
use parking_lot::{Condvar, Mutex};

use crate::EventLog;
use crate::queue::{Delivery, QueueTarget};

/// How a scripted sink behaves on write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Succeed,
    Fail,
    Panic,
}

/// Sink that records writes and fails on demand
pub struct ScriptedSink {
    name: &'static str,
    behavior: Mutex<Behavior>,
    writes: Mutex<Vec<EventRecord>>,
}

impl ScriptedSink {
    pub fn new(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            behavior: Mutex::new(Behavior::Succeed),
            writes: Mutex::new(Vec::new()),
        })
    }

    pub fn set_behavior(&self, behavior: Behavior) {
        *self.behavior.lock() = behavior;
    }

    pub fn writes(&self) -> Vec<EventRecord> {
        self.writes.lock().clone()
    }

    pub fn write_count(&self) -> usize {
        self.writes.lock().len()
    }
}

impl EventSink for ScriptedSink {
    fn name(&self) -> &str {
        self.name
    }

    fn write(&self, record: &EventRecord) -> eventlog_sinks::Result<()> {
        self.writes.lock().push(record.clone());
        let behavior = *self.behavior.lock();
        match behavior {
            Behavior::Succeed => Ok(()),
            Behavior::Fail => Err(SinkError::write(format!("{} refused", self.name))),
            Behavior::Panic => panic!("{} panicked", self.name),
        }
    }
}

/// Notifier that records what it was asked to send
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, Option<String>)>>,
}

impl NotificationSink for RecordingNotifier {
    fn notify_error(&self, record: &EventRecord, site_name: Option<&str>) -> eventlog_sinks::Result<()> {
        self.sent
            .lock()
            .push((record.event_code.clone(), site_name.map(str::to_string)));
        Ok(())
    }
}

/// Sink that logs back into the event log while writing
///
/// When asked to write a record with `trigger_code`, it logs a new error with
/// the same key through the owning event log, like a failing sink whose error
/// handler reports its own failure.
pub struct ReentrantSink {
    pub log: Mutex<Weak<EventLog>>,
    pub trigger_code: &'static str,
    pub writes: AtomicUsize,
    pub inner_results: Mutex<Vec<crate::Result<Option<EventRecord>>>>,
}

impl ReentrantSink {
    pub fn new(trigger_code: &'static str) -> Arc<Self> {
        Arc::new(Self {
            log: Mutex::new(Weak::new()),
            trigger_code,
            writes: AtomicUsize::new(0),
            inner_results: Mutex::new(Vec::new()),
        })
    }

    pub fn attach(&self, log: &Arc<EventLog>) {
        *self.log.lock() = Arc::downgrade(log);
    }
}

impl EventSink for ReentrantSink {
    fn name(&self) -> &str {
        "reentrant"
    }

    fn write(&self, record: &EventRecord) -> eventlog_sinks::Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if record.event_code != self.trigger_code {
            return Ok(());
        }

        let log = self.log.lock().upgrade();
        if let Some(log) = log {
            let again = EventRecord::new(record.event_type, &record.source, &record.event_code)
                .with_description("sink failed while writing");
            let result = log.log_event(again);
            self.inner_results.lock().push(result);
        }
        Err(SinkError::write("reentrant sink failed"))
    }
}

type Hook = Box<dyn Fn(&EventLog, &EventRecord) -> eventlog_sinks::Result<()> + Send + Sync>;

/// Sink that runs a closure against the owning event log on every write
pub struct HookSink {
    log: Mutex<Weak<EventLog>>,
    hook: Hook,
}

impl HookSink {
    pub fn new(
        hook: impl Fn(&EventLog, &EventRecord) -> eventlog_sinks::Result<()> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            log: Mutex::new(Weak::new()),
            hook: Box::new(hook),
        })
    }

    pub fn attach(&self, log: &Arc<EventLog>) {
        *self.log.lock() = Arc::downgrade(log);
    }
}

impl EventSink for HookSink {
    fn name(&self) -> &str {
        "hook"
    }

    fn write(&self, record: &EventRecord) -> eventlog_sinks::Result<()> {
        let log = self.log.lock().upgrade();
        match log {
            Some(log) => (self.hook)(&log, record),
            None => Ok(()),
        }
    }
}

/// Store that refuses inserts while down but never says so up front
///
/// Leaves `Store::is_available` at its default, like a remote database whose
/// outage is only seen on write.
pub struct FlakyStore {
    pub inner: MemoryStore,
    down: AtomicBool,
}

impl FlakyStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryStore::new(),
            down: AtomicBool::new(false),
        })
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }
}

impl Store for FlakyStore {
    fn insert(&self, record: &EventRecord) -> eventlog_sinks::Result<u64> {
        if self.down.load(Ordering::SeqCst) {
            return Err(SinkError::unavailable("connection refused"));
        }
        self.inner.insert(record)
    }

    fn update(&self, record: &EventRecord) -> eventlog_sinks::Result<()> {
        self.inner.update(record)
    }

    fn delete_oldest(&self, site: SiteId, max_size: u64, cap: u64) -> eventlog_sinks::Result<u64> {
        self.inner.delete_oldest(site, max_size, cap)
    }

    fn count(&self, site: SiteId) -> eventlog_sinks::Result<u64> {
        self.inner.count(site)
    }

    fn bulk_delete(&self, filter: SiteFilter) -> eventlog_sinks::Result<u64> {
        self.inner.bulk_delete(filter)
    }
}

/// Store whose `delete_oldest` blocks until released
pub struct GatedStore {
    pub inner: MemoryStore,
    released: Mutex<bool>,
    cond: Condvar,
    pub delete_calls: AtomicU64,
}

impl GatedStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryStore::new(),
            released: Mutex::new(false),
            cond: Condvar::new(),
            delete_calls: AtomicU64::new(0),
        })
    }

    pub fn release(&self) {
        *self.released.lock() = true;
        self.cond.notify_all();
    }
}

impl Store for GatedStore {
    fn insert(&self, record: &EventRecord) -> eventlog_sinks::Result<u64> {
        self.inner.insert(record)
    }

    fn update(&self, record: &EventRecord) -> eventlog_sinks::Result<()> {
        self.inner.update(record)
    }

    fn delete_oldest(&self, site: SiteId, max_size: u64, cap: u64) -> eventlog_sinks::Result<u64> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        let mut released = self.released.lock();
        while !*released {
            self.cond.wait(&mut released);
        }
        drop(released);
        self.inner.delete_oldest(site, max_size, cap)
    }

    fn count(&self, site: SiteId) -> eventlog_sinks::Result<u64> {
        self.inner.count(site)
    }

    fn bulk_delete(&self, filter: SiteFilter) -> eventlog_sinks::Result<u64> {
        self.inner.bulk_delete(filter)
    }
}

/// Queue target that discards everything
pub struct NullTarget;

impl QueueTarget for NullTarget {
    fn dispatch(&self, _record: EventRecord) -> Delivery {
        Delivery::Done
    }

    fn storage_available(&self) -> bool {
        true
    }

    fn dropped(&self, _record: &EventRecord, _reason: &str) {}
}
