//! Counters and sinks - fan-out of an accepted record
//!
//! # Order
//!
//! ```text
//! store (assigns id) → severity counters → file / trace / custom sinks → notifier (errors only)
//! ```
//!
//! Every target is called even if an earlier one failed. Failures (errors or
//! panics) are counted; at the outermost logging call they go to the fallback
//! writer, in a nested call the first one is returned once all targets ran.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use eventlog_config::{Settings, keys};
use eventlog_protocol::{EventRecord, EventType, SEND_EMAIL_EVENT_CODE, SiteId};
use eventlog_sinks::{EventSink, FallbackWriter, NotificationSink, SinkError, Store};
use tracing::trace;

use crate::error::{EventLogError, Result};
use crate::metrics::EventLogCounters;

/// A sink plus the setting that switches it on (None = always on)
pub struct SinkSlot {
    pub sink: Arc<dyn EventSink>,
    pub toggle: Option<&'static str>,
}

/// Fan-out of accepted records to counters and sinks
pub struct Dispatcher {
    store: Arc<dyn Store>,
    sinks: Vec<SinkSlot>,
    notifier: Option<Arc<dyn NotificationSink>>,
    settings: Arc<dyn Settings>,
    counters: Arc<EventLogCounters>,
    fallback: Arc<FallbackWriter>,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn Store>,
        sinks: Vec<SinkSlot>,
        notifier: Option<Arc<dyn NotificationSink>>,
        settings: Arc<dyn Settings>,
        counters: Arc<EventLogCounters>,
        fallback: Arc<FallbackWriter>,
    ) -> Self {
        Self {
            store,
            sinks,
            notifier,
            settings,
            counters,
            fallback,
        }
    }

    /// Fan the record out
    ///
    /// On a successful store insert the record's id is set. Returns the first
    /// failure only when `nested`.
    pub fn dispatch(&self, record: &mut EventRecord, nested: bool) -> Result<()> {
        self.fan_out(record, nested, false)
    }

    /// Fan the record out, unless the store reports itself unavailable
    ///
    /// An unavailable store aborts before any counter or sink is touched and
    /// returns `EventLogError::Store`, so the caller can retry the record
    /// later without duplicating side effects.
    pub fn dispatch_or_defer(&self, record: &mut EventRecord, nested: bool) -> Result<()> {
        self.fan_out(record, nested, true)
    }

    fn fan_out(&self, record: &mut EventRecord, nested: bool, defer: bool) -> Result<()> {
        let site = record.site_id;
        let mut first_failure: Option<EventLogError> = None;
        let mut store_failure = None;

        // A fresh write gets a fresh id
        record.id = 0;
        if self.enabled(keys::LOG_TO_DATABASE, site) {
            match guarded(|| self.store.insert(record)) {
                Ok(id) => {
                    record.id = id;
                    trace!(id, site = site.get(), "event stored");
                }
                Err(e) if defer && e.is_unavailable() => {
                    trace!(site = site.get(), error = %e, "store unavailable, deferring event");
                    return Err(EventLogError::Store(e));
                }
                Err(e) => store_failure = Some(EventLogError::Store(e)),
            }
        }

        self.counters.record_severity(record.event_type);
        if let Some(e) = store_failure {
            self.fail(&mut first_failure, e, nested);
        }

        for slot in &self.sinks {
            if let Some(key) = slot.toggle
                && !self.enabled(key, site)
            {
                continue;
            }
            if let Err(e) = guarded(|| slot.sink.write(record)) {
                self.fail(
                    &mut first_failure,
                    EventLogError::sink(slot.sink.name(), e),
                    nested,
                );
            }
        }

        if let Some(ref notifier) = self.notifier
            && record.event_type == EventType::Error
            && !record.event_code.eq_ignore_ascii_case(SEND_EMAIL_EVENT_CODE)
        {
            let site_name = self.settings.get_string(keys::SITE_NAME, site);
            if let Err(e) = guarded(|| notifier.notify_error(record, site_name.as_deref())) {
                self.fail(&mut first_failure, EventLogError::sink("notification", e), nested);
            }
        }

        match first_failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Persist an edited record
    pub fn update(&self, record: &EventRecord) -> Result<()> {
        guarded(|| self.store.update(record)).map_err(EventLogError::Store)
    }

    fn enabled(&self, key: &str, site: SiteId) -> bool {
        self.settings.get_bool(key, site).unwrap_or(true)
    }

    fn fail(&self, first: &mut Option<EventLogError>, error: EventLogError, nested: bool) {
        self.counters.record_sink_failure();
        if nested {
            if first.is_none() {
                *first = Some(error);
            }
        } else {
            self.fallback.failure("event sink failed", &error);
        }
    }
}

/// Run a sink call, turning a panic into `SinkError::Panicked`
fn guarded<T>(f: impl FnOnce() -> eventlog_sinks::Result<T>) -> eventlog_sinks::Result<T> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(SinkError::Panicked(message))
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field(
                "sinks",
                &self.sinks.iter().map(|s| s.sink.name().to_string()).collect::<Vec<_>>(),
            )
            .field("notifier", &self.notifier.is_some())
            .finish()
    }
}

#[cfg(test)]
#[path = "dispatch_test.rs"]
mod dispatch_test;
