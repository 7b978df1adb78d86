//! Log write coordinator - the `EventLog`
//!
//! # Write path
//!
//! ```text
//! log_event ──► validate ──► entry gate ──► policy gate ──► recursion guard
//!                             (enabled,      (try_mark)        │
//!                              log_size>0)                     ▼
//!                                                  enrich ──► dispatch ──► retention
//!
//! queue_event ──► validate ──► entry gate ──► is_already_logged ──► enrich ──► QueueHandle
//!                                     worker: try_mark ──► recursion guard ──► dispatch ──► retention
//! ```
//!
//! # Failure policy
//!
//! A call made while another logging call is in progress on the same thread
//! is nested: its failures are returned so the outer call sees them. The
//! outermost call never fails because of a sink; failures go to the fallback
//! writer. Only malformed records are reported at the top level.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use eventlog_config::{Config, MemorySettings, QueueConfig, Settings, keys};
use eventlog_protocol::{EventKey, EventRecord, EventType, SiteId};
use eventlog_sinks::{
    EventSink, FallbackWriter, FileSink, NotificationSink, SiteFilter, Store, TraceSink,
};
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::context::{current_queue, logging_disabled};
use crate::dispatch::{Dispatcher, SinkSlot};
use crate::enrich::{ActorContext, Enricher, NoActor};
use crate::error::{EventLogError, Result};
use crate::metrics::{CountersSnapshot, EventLogCounters};
use crate::policy_gate::PolicyCache;
use crate::queue::{self, Delivery, QueueHandle, QueueTarget};
use crate::recursion::RecursionGuard;
use crate::retention::{RetentionController, RetentionTrigger};

/// Source of the clear-log audit event
pub const CLEAR_LOG_SOURCE: &str = "EventLog";

/// Event code of the clear-log audit event
pub const CLEAR_LOG_EVENT_CODE: &str = "CLEARLOG";

/// Default length of the original description kept in a recursion note
pub const DEFAULT_RECURSION_NOTE_MAX_LEN: usize = 2000;

static GLOBAL: OnceLock<Arc<EventLog>> = OnceLock::new();

/// Event log: entry point of the pipeline
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use eventlog_pipeline::EventLog;
/// use eventlog_protocol::EventRecord;
/// use eventlog_sinks::MemoryStore;
///
/// let store = Arc::new(MemoryStore::new());
/// let log = EventLog::builder(store.clone()).build().unwrap();
///
/// let stored = log
///     .log_event(EventRecord::warning("Cart", "SLOW", "checkout took 4s"))
///     .unwrap()
///     .unwrap();
/// assert_eq!(stored.id, 1);
/// assert_eq!(log.counters().warnings, 1);
/// ```
pub struct EventLog {
    core: Arc<EventLogCore>,
    queue: Option<QueueHandle>,
}

/// State shared with the queue worker
struct EventLogCore {
    settings: Arc<dyn Settings>,
    store: Arc<dyn Store>,
    policy: PolicyCache,
    dispatcher: Dispatcher,
    retention: RetentionController,
    enricher: Enricher,
    actor: Arc<dyn ActorContext>,
    clock: Arc<dyn Clock>,
    counters: Arc<EventLogCounters>,
    fallback: Arc<FallbackWriter>,
    recursion_note_max_len: usize,
}

impl EventLog {
    /// Start building an event log over `store`
    pub fn builder(store: Arc<dyn Store>) -> EventLogBuilder {
        EventLogBuilder::new(store)
    }

    /// Build from a parsed configuration
    ///
    /// Registers the file sink when enabled and the trace sink (toggled by
    /// `sinks.trace`). Queued mode is not started; use the builder for that.
    pub fn from_config(config: Arc<Config>, store: Arc<dyn Store>) -> Result<Self> {
        EventLogBuilder::from_config(config, store)?.build()
    }

    /// Install the process-wide default instance
    ///
    /// Returns the instance back if one was already installed.
    pub fn install_global(log: Arc<EventLog>) -> std::result::Result<(), Arc<EventLog>> {
        GLOBAL.set(log)
    }

    /// Process-wide default instance, if installed
    pub fn global() -> Option<&'static Arc<EventLog>> {
        GLOBAL.get()
    }

    // =========================================================================
    // Write path
    // =========================================================================

    /// Log a record synchronously
    ///
    /// Returns `Ok(None)` when the record is rejected (logging disabled, site
    /// log size 0, or blocked by its policy), and the enriched record
    /// otherwise. A record whose id is 0 was not stored.
    ///
    /// Errors are returned only for malformed records and from nested calls.
    pub fn log_event(&self, mut record: EventRecord) -> Result<Option<EventRecord>> {
        record.validate()?;

        if !self.core.admits(&record) || !self.core.policy.try_mark_as_logged(&record) {
            self.core.counters.record_rejected();
            return Ok(None);
        }

        let nested = RecursionGuard::is_nested();
        match self.core.write(&mut record, nested, Origin::Direct) {
            Ok(()) => Ok(Some(record)),
            Err(e) if nested => Err(e),
            Err(EventLogError::RecursionDetected { record }) => Ok(Some(*record)),
            Err(e) => {
                self.core.fallback.failure("event log write failed", &e);
                Ok(None)
            }
        }
    }

    /// Log a record through the queue worker
    ///
    /// Returns once the record is enqueued; dispatch happens on the worker.
    /// Uses the thread's `QueueScope` override when present. Without any
    /// queue, the record is written directly.
    ///
    /// Returns `Ok(true)` when enqueued (or written), `Ok(false)` when
    /// rejected or dropped.
    pub fn queue_event(&self, mut record: EventRecord) -> Result<bool> {
        record.validate()?;

        if !self.core.admits(&record) || self.core.policy.is_already_logged(&record) {
            self.core.counters.record_rejected();
            return Ok(false);
        }

        let Some(handle) = current_queue().or_else(|| self.queue.clone()) else {
            return Ok(self.log_event(record)?.is_some());
        };

        self.core.enrich(&mut record);
        let available = self.core.store.is_available();
        let key = record.key();
        match handle.enqueue(record, available) {
            Ok(()) => {
                self.core.counters.record_queued();
                Ok(true)
            }
            Err(e) => {
                self.core.counters.record_dropped();
                if RecursionGuard::is_nested() {
                    return Err(e);
                }
                self.core.fallback.failure(&format!("event {key} not queued"), &e);
                Ok(false)
            }
        }
    }

    /// Log an information event
    pub fn log_information(
        &self,
        source: &str,
        event_code: &str,
        description: &str,
    ) -> Result<Option<EventRecord>> {
        self.log_event(EventRecord::information(source, event_code, description))
    }

    /// Log a warning event
    pub fn log_warning(
        &self,
        source: &str,
        event_code: &str,
        description: &str,
    ) -> Result<Option<EventRecord>> {
        self.log_event(EventRecord::warning(source, event_code, description))
    }

    /// Log an error event
    pub fn log_error(
        &self,
        source: &str,
        event_code: &str,
        description: &str,
    ) -> Result<Option<EventRecord>> {
        self.log_event(EventRecord::error(source, event_code, description))
    }

    /// Log an error event carrying an error chain
    pub fn log_exception<E: std::error::Error + 'static>(
        &self,
        source: &str,
        event_code: &str,
        error: &E,
    ) -> Result<Option<EventRecord>> {
        self.log_event(EventRecord::from_error(source, event_code, error))
    }

    // =========================================================================
    // Administration
    // =========================================================================

    /// Delete stored events and reset the pipeline's caches
    ///
    /// Resets the warning/error counters, marks the affected sites' counts
    /// unknown, clears the policy cache, and records a `CLEARLOG` event.
    /// Returns the number of events deleted.
    pub fn clear_log(&self, filter: SiteFilter) -> Result<u64> {
        let deleted = self
            .core
            .store
            .bulk_delete(filter)
            .map_err(EventLogError::Store)?;

        self.core.counters.reset_severity();
        self.core.retention.mark_unknown(filter);
        self.core.policy.clear();

        let who = self
            .core
            .actor
            .current_user()
            .map_or_else(|| "system".to_string(), |(_, name)| name);
        let (scope, site) = match filter {
            SiteFilter::All => ("all sites".to_string(), SiteId::GLOBAL),
            SiteFilter::Site(site) => (site.to_string(), site),
        };
        info!(deleted, scope = %scope, user = %who, "event log cleared");

        let audit = EventRecord::information(
            CLEAR_LOG_SOURCE,
            CLEAR_LOG_EVENT_CODE,
            format!("Event log cleared by {who}: {deleted} events deleted ({scope})."),
        )
        .with_site(site);
        self.log_event(audit)?;
        Ok(deleted)
    }

    /// Persist changes to an already stored record
    ///
    /// The record is written as given: no enrichment, no policy check.
    pub fn update_event(&self, record: &EventRecord) -> Result<()> {
        if !record.is_persisted() {
            return Err(EventLogError::NotPersisted);
        }
        record.validate()?;
        self.core.dispatcher.update(record)
    }

    /// Drop cached site limits so changed settings take effect
    pub fn invalidate_settings(&self) {
        self.core.retention.invalidate();
        debug!("event log settings invalidated");
    }

    /// Synchronous retention sweep; returns whether anything was deleted
    pub fn trim_sites(&self, sites: &[SiteId]) -> Result<bool> {
        self.core.retention.trim_sites(sites)
    }

    /// Counter snapshot
    pub fn counters(&self) -> CountersSnapshot {
        self.core.counters.snapshot()
    }

    /// Cached item count of a site (`None` = unknown)
    pub fn item_count(&self, site: SiteId) -> Option<u64> {
        self.core.retention.item_count(site)
    }

    /// Dedup cache
    pub fn policy_cache(&self) -> &PolicyCache {
        &self.core.policy
    }

    // =========================================================================
    // Queue lifecycle
    // =========================================================================

    /// Handle of this instance's queue worker
    pub fn queue_handle(&self) -> Option<&QueueHandle> {
        self.queue.as_ref()
    }

    /// Wait until every record queued so far has been dispatched or retained
    pub async fn flush(&self) -> Result<()> {
        match self.queue {
            Some(ref handle) => handle.flush().await,
            None => Ok(()),
        }
    }

    /// Drain and stop the queue worker
    pub async fn shutdown(&self) -> Result<()> {
        match self.queue {
            Some(ref handle) => handle.shutdown().await,
            None => Ok(()),
        }
    }

    /// Spawn an extra worker dispatching into this event log
    ///
    /// Useful with `QueueScope` to isolate a unit of work.
    pub fn spawn_queue(&self, config: QueueConfig) -> Result<QueueHandle> {
        queue::spawn(config, self.core.clone())
    }
}

impl std::fmt::Debug for EventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLog")
            .field("dispatcher", &self.core.dispatcher)
            .field("retention", &self.core.retention)
            .field("queued", &self.queue.is_some())
            .finish()
    }
}

// =============================================================================
// Core
// =============================================================================

impl EventLogCore {
    /// Entry gate minus the policy check
    fn admits(&self, record: &EventRecord) -> bool {
        let site = record.site_id;
        self.settings.get_bool(keys::LOGGING_ENABLED, site).unwrap_or(true)
            && !logging_disabled()
            && self.retention.limits(site).max_size > 0
    }

    fn enrich(&self, record: &mut EventRecord) {
        self.enricher
            .enrich(record, self.actor.as_ref(), self.clock.now());
    }

    /// Guarded write of an admitted record
    ///
    /// Queued records were enriched at enqueue and may be deferred by an
    /// unavailable store; in that case the record is left untouched.
    fn write(&self, record: &mut EventRecord, nested: bool, origin: Origin) -> Result<()> {
        let Some(_scope) = RecursionGuard::enter(record.key()) else {
            let note = self.recursion_note(record.clone());
            self.counters.record_recursion_blocked();
            self.fallback.note("recursive event log call", &note);
            return Err(EventLogError::RecursionDetected {
                record: Box::new(note),
            });
        };

        let dispatched = match origin {
            Origin::Direct => {
                self.enrich(record);
                self.dispatcher.dispatch(record, nested)
            }
            Origin::Queued => self.dispatcher.dispatch_or_defer(record, nested),
        };

        // A stored row is accounted for even when a later sink failed
        if dispatched.is_ok() || record.is_persisted() {
            self.counters.record_accepted();
        }
        if record.is_persisted()
            && let RetentionTrigger::Scheduled(_) = self.retention.record_insert(record.site_id)
        {
            debug!(site = record.site_id.get(), "retention trim started");
        }
        dispatched
    }

    /// Convert a re-entrant record into an error note
    fn recursion_note(&self, mut record: EventRecord) -> EventRecord {
        let original_type = record.event_type;
        let key = EventKey::of(&record);
        let original = truncate(&record.description, self.recursion_note_max_len);

        record.event_type = EventType::Error;
        record.description = format!(
            "Recursive event log call detected for {key}; the event was not written. \
             Original event type: {}. Original description:\n{original}",
            original_type.as_str()
        );
        record
    }
}

impl QueueTarget for EventLogCore {
    fn dispatch(&self, mut record: EventRecord) -> Delivery {
        if !self.policy.try_mark_as_logged(&record) {
            self.counters.record_rejected();
            return Delivery::Done;
        }
        let nested = RecursionGuard::is_nested();
        match self.write(&mut record, nested, Origin::Queued) {
            Ok(()) => Delivery::Done,
            Err(e) if e.is_store_unavailable() => {
                // Not written: the retry has to claim the key again
                self.policy.release(&record);
                Delivery::Deferred(record)
            }
            Err(e) => {
                if !e.is_recursion() {
                    self.fallback.failure("queued event write failed", &e);
                }
                Delivery::Done
            }
        }
    }

    fn storage_available(&self) -> bool {
        self.store.is_available()
    }

    fn dropped(&self, record: &EventRecord, reason: &str) {
        self.counters.record_dropped();
        self.fallback.note(reason, record);
    }
}

/// Where a write came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    /// `log_event` on the caller's thread: enrich, then dispatch
    Direct,
    /// Queue worker: already enriched, store outages defer the record
    Queued,
}

/// Truncate at a char boundary, marking the cut
fn truncate(text: &str, max_len: usize) -> String {
    if text.len() <= max_len {
        return text.to_string();
    }
    let mut end = max_len;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for `EventLog`
pub struct EventLogBuilder {
    store: Arc<dyn Store>,
    settings: Arc<dyn Settings>,
    sinks: Vec<SinkSlot>,
    notifier: Option<Arc<dyn NotificationSink>>,
    actor: Arc<dyn ActorContext>,
    clock: Arc<dyn Clock>,
    fallback_interval: Duration,
    queue: Option<QueueConfig>,
}

impl EventLogBuilder {
    fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            settings: Arc::new(MemorySettings::new()),
            sinks: Vec::new(),
            notifier: None,
            actor: Arc::new(NoActor),
            clock: Arc::new(SystemClock),
            fallback_interval: eventlog_sinks::fallback::DEFAULT_FALLBACK_INTERVAL,
            queue: None,
        }
    }

    /// Builder seeded from configuration (settings, file and trace sinks,
    /// fallback interval)
    ///
    /// Settings are a `MemorySettings` snapshot of `config`, site overrides
    /// included.
    pub fn from_config(config: Arc<Config>, store: Arc<dyn Store>) -> Result<Self> {
        let mut builder = Self::new(store).fallback_interval(config.event_log.fallback.interval);

        if config.sinks.file.enabled {
            let file = FileSink::open(&config.sinks.file.path)
                .map_err(|e| EventLogError::sink("file", e))?;
            builder = builder.file_sink(Arc::new(file));
        }
        builder = builder.trace_sink(Arc::new(TraceSink::new()));

        Ok(builder.settings(Arc::new(MemorySettings::from_config(&config))))
    }

    #[must_use]
    pub fn settings(mut self, settings: Arc<dyn Settings>) -> Self {
        self.settings = settings;
        self
    }

    /// Register the file sink (toggled by `sinks.file`)
    #[must_use]
    pub fn file_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(SinkSlot {
            sink,
            toggle: Some(keys::LOG_TO_FILE),
        });
        self
    }

    /// Register the trace sink (toggled by `sinks.trace`)
    #[must_use]
    pub fn trace_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(SinkSlot {
            sink,
            toggle: Some(keys::LOG_TO_TRACE),
        });
        self
    }

    /// Register an always-on sink
    #[must_use]
    pub fn sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(SinkSlot { sink, toggle: None });
        self
    }

    #[must_use]
    pub fn notifier(mut self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    #[must_use]
    pub fn actor(mut self, actor: Arc<dyn ActorContext>) -> Self {
        self.actor = actor;
        self
    }

    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn fallback_interval(mut self, interval: Duration) -> Self {
        self.fallback_interval = interval;
        self
    }

    /// Start a queue worker for `queue_event` (requires a tokio runtime)
    #[must_use]
    pub fn queue(mut self, config: QueueConfig) -> Self {
        self.queue = Some(config);
        self
    }

    pub fn build(self) -> Result<EventLog> {
        let settings = self.settings;
        let counters = Arc::new(EventLogCounters::new());
        let fallback = Arc::new(FallbackWriter::new(self.fallback_interval));

        let enricher = Enricher {
            machine_name: settings.get_string(keys::MACHINE_NAME, SiteId::GLOBAL),
            resolve_safe_user_name: settings
                .get_bool(keys::RESOLVE_SAFE_USER_NAME, SiteId::GLOBAL)
                .unwrap_or(false),
        };
        let recursion_note_max_len = settings
            .get_int(keys::RECURSION_NOTE_MAX_LEN, SiteId::GLOBAL)
            .and_then(|len| usize::try_from(len).ok())
            .unwrap_or(DEFAULT_RECURSION_NOTE_MAX_LEN);

        let dispatcher = Dispatcher::new(
            Arc::clone(&self.store),
            self.sinks,
            self.notifier,
            Arc::clone(&settings),
            Arc::clone(&counters),
            Arc::clone(&fallback),
        );
        let retention = RetentionController::new(Arc::clone(&self.store), Arc::clone(&settings));

        let core = Arc::new(EventLogCore {
            policy: PolicyCache::new(Arc::clone(&self.clock)),
            settings,
            store: self.store,
            dispatcher,
            retention,
            enricher,
            actor: self.actor,
            clock: self.clock,
            counters,
            fallback,
            recursion_note_max_len,
        });

        let queue = match self.queue {
            Some(config) => Some(queue::spawn(config, core.clone())?),
            None => None,
        };

        debug!(
            dispatcher = ?core.dispatcher,
            queued = queue.is_some(),
            "event log ready"
        );
        Ok(EventLog { core, queue })
    }
}

#[cfg(test)]
#[path = "coordinator_test.rs"]
mod coordinator_test;
