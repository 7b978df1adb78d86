//! Trace Sink - forwards records to `tracing`
//!
//! Each record becomes one event under the `eventlog::events` target, at the
//! level matching its type. Whether it is shown is up to the subscriber's
//! filter, so the process log configuration controls verbosity.

use eventlog_protocol::{EVENTS_TARGET, EventRecord, EventType};

use crate::common::SinkMetrics;
use crate::{EventSink, MetricsSnapshot, Result};

/// Sink writing to the process trace
#[derive(Debug, Default)]
pub struct TraceSink {
    metrics: SinkMetrics,
}

impl TraceSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write metrics
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

impl EventSink for TraceSink {
    fn name(&self) -> &str {
        "trace"
    }

    fn write(&self, record: &EventRecord) -> Result<()> {
        let site = record.site_id.get();
        let user = record.user_name.as_deref().unwrap_or("");

        match record.event_type {
            EventType::Information => tracing::info!(
                target: EVENTS_TARGET,
                id = record.id,
                site,
                source = %record.source,
                code = %record.event_code,
                user,
                "{}",
                record.description
            ),
            EventType::Warning => tracing::warn!(
                target: EVENTS_TARGET,
                id = record.id,
                site,
                source = %record.source,
                code = %record.event_code,
                user,
                "{}",
                record.description
            ),
            EventType::Error => tracing::error!(
                target: EVENTS_TARGET,
                id = record.id,
                site,
                source = %record.source,
                code = %record.event_code,
                user,
                "{}",
                record.description
            ),
        }

        self.metrics.record_written(record.description.len() as u64);
        Ok(())
    }
}
