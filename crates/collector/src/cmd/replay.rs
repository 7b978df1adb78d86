//! Replay command - run a JSON-lines event file through the pipeline
//!
//! Each non-empty line is one `EventRecord` in JSON. Fields left out take
//! their defaults, so a minimal line is:
//!
//! ```json
//! {"event_type": "error", "source": "DB", "event_code": "TIMEOUT", "description": "query timed out"}
//! ```
//!
//! Records go to an in-memory store plus whatever file/trace sinks the
//! configuration enables. A summary of what was accepted, rejected and
//! retained is printed at the end.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use eventlog_config::Config;
use eventlog_pipeline::{CountersSnapshot, EventLog, EventLogBuilder};
use eventlog_protocol::{EventRecord, SiteId};
use eventlog_sinks::MemoryStore;
use tracing::{info, warn};

/// Replay command arguments
#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// JSON-lines file of events
    pub file: PathBuf,

    /// Write through the queue worker instead of synchronously
    #[arg(long)]
    pub queued: bool,
}

/// Run the replay command
pub async fn run(config: Config, args: ReplayArgs) -> Result<()> {
    let file = File::open(&args.file)
        .with_context(|| format!("failed to open {}", args.file.display()))?;
    let parsed = parse_events(BufReader::new(file))?;
    for (line, error) in &parsed.invalid {
        warn!(line, error = %error, "skipping malformed event");
    }

    info!(
        file = %args.file.display(),
        events = parsed.events.len(),
        queued = args.queued,
        "replaying events"
    );

    let config = Arc::new(config);
    let store = Arc::new(MemoryStore::new());
    let mut builder = EventLogBuilder::from_config(Arc::clone(&config), store.clone())?;
    if args.queued {
        builder = builder.queue(config.event_log.queue.clone());
    }
    let log = builder.build()?;

    let summary = replay(&log, &store, parsed, args.queued).await?;
    println!("{summary}");
    Ok(())
}

/// Events read from a file, with the lines that failed to parse
#[derive(Debug, Default)]
pub struct ParsedEvents {
    pub events: Vec<EventRecord>,
    pub invalid: Vec<(usize, String)>,
}

/// Parse JSON-lines input (1-based line numbers in `invalid`)
pub fn parse_events(reader: impl BufRead) -> Result<ParsedEvents> {
    let mut parsed = ParsedEvents::default();
    for (index, line) in reader.lines().enumerate() {
        let line = line.context("failed to read event file")?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        match serde_json::from_str::<EventRecord>(trimmed) {
            Ok(record) => parsed.events.push(record),
            Err(e) => parsed.invalid.push((index + 1, e.to_string())),
        }
    }
    Ok(parsed)
}

/// Feed parsed events through the event log
pub async fn replay(
    log: &EventLog,
    store: &MemoryStore,
    parsed: ParsedEvents,
    queued: bool,
) -> Result<ReplaySummary> {
    let mut invalid = parsed.invalid.len();

    for record in parsed.events {
        let result = if queued {
            log.queue_event(record).map(|_| ())
        } else {
            log.log_event(record).map(|_| ())
        };
        if let Err(e) = result {
            warn!(error = %e, "event refused");
            invalid += 1;
        }
    }

    if queued {
        log.flush().await?;
        log.shutdown().await?;
    }

    let mut sites = BTreeMap::new();
    for record in store.records() {
        *sites.entry(record.site_id).or_insert(0u64) += 1;
    }

    Ok(ReplaySummary {
        counters: log.counters(),
        invalid,
        stored: store.len(),
        sites,
    })
}

/// Outcome of a replay
#[derive(Debug)]
pub struct ReplaySummary {
    pub counters: CountersSnapshot,
    pub invalid: usize,
    pub stored: usize,
    pub sites: BTreeMap<SiteId, u64>,
}

impl fmt::Display for ReplaySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = &self.counters;
        writeln!(f, "accepted:          {}", c.accepted)?;
        writeln!(f, "rejected:          {}", c.rejected)?;
        writeln!(f, "invalid:           {}", self.invalid)?;
        writeln!(f, "warnings:          {}", c.warnings)?;
        writeln!(f, "errors:            {}", c.errors)?;
        writeln!(f, "recursion blocked: {}", c.recursion_blocked)?;
        writeln!(f, "sink failures:     {}", c.sink_failures)?;
        writeln!(f, "queued:            {}", c.queued)?;
        writeln!(f, "dropped:           {}", c.dropped)?;
        write!(f, "stored:            {}", self.stored)?;
        for (site, count) in &self.sites {
            write!(f, "\n  {site}: {count}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    const INPUT: &str = r#"
{"event_type": "error", "source": "DB", "event_code": "TIMEOUT", "policy": "once_per_period:2m"}
{"event_type": "error", "source": "DB", "event_code": "TIMEOUT", "policy": "once_per_period:2m"}
# comment lines are skipped
{"event_type": "warning", "source": "Cart", "event_code": "SLOW", "site_id": 5}
not json
{"event_type": "information", "source": "", "event_code": "EMPTY"}
"#;

    #[test]
    fn test_parse_events() {
        let parsed = parse_events(Cursor::new(INPUT)).unwrap();

        assert_eq!(parsed.events.len(), 4);
        assert_eq!(parsed.invalid.len(), 1);
        assert_eq!(parsed.invalid[0].0, 6);
        assert_eq!(parsed.events[2].site_id, SiteId::new(5));
    }

    #[tokio::test]
    async fn test_replay_direct() {
        let parsed = parse_events(Cursor::new(INPUT)).unwrap();
        let store = Arc::new(MemoryStore::new());
        let log = EventLog::builder(store.clone()).build().unwrap();

        let summary = replay(&log, &store, parsed, false).await.unwrap();

        assert_eq!(summary.stored, 2);
        assert_eq!(summary.counters.accepted, 2);
        assert_eq!(summary.counters.rejected, 1);
        // One unparseable line, one record without a source
        assert_eq!(summary.invalid, 2);
        assert_eq!(summary.sites.get(&SiteId::new(5)), Some(&1));

        let text = summary.to_string();
        assert!(text.contains("stored:            2"));
        assert!(text.contains("site:5: 1"));
    }

    #[tokio::test]
    async fn test_replay_queued() {
        let parsed = parse_events(Cursor::new(INPUT)).unwrap();
        let store = Arc::new(MemoryStore::new());
        let log = EventLog::builder(store.clone())
            .queue(Default::default())
            .build()
            .unwrap();

        let summary = replay(&log, &store, parsed, true).await.unwrap();

        assert_eq!(summary.stored, 2);
        assert_eq!(summary.counters.queued, 3);
    }
}
