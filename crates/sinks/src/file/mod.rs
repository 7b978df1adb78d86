//! File Sink - Human-readable event log
//!
//! Appends one line per accepted record to a text file. Parent directories are
//! created on open, and every write is flushed so the file can be tailed.
//!
//! # Output Format
//!
//! ```text
//! [2025-01-15T10:30:45.123Z] [W] site:3 Checkout/SLOW id=812 user=alice machine=web-01 | payment took 4.2s
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use eventlog_protocol::EventRecord;
use parking_lot::Mutex;

use crate::common::SinkMetrics;
use crate::{EventSink, MetricsSnapshot, Result, render_line};

/// Text file sink
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
    metrics: SinkMetrics,
}

impl FileSink {
    /// Open (or create) the file in append mode
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            path,
            writer: Mutex::new(BufWriter::new(file)),
            metrics: SinkMetrics::new(),
        })
    }

    /// Path being written
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write metrics
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

impl EventSink for FileSink {
    fn name(&self) -> &str {
        "file"
    }

    fn write(&self, record: &EventRecord) -> Result<()> {
        let mut line = render_line(record);
        line.push('\n');

        let mut writer = self.writer.lock();
        let result = writer
            .write_all(line.as_bytes())
            .and_then(|()| writer.flush());

        match result {
            Ok(()) => {
                self.metrics.record_written(line.len() as u64);
                Ok(())
            }
            Err(e) => {
                self.metrics.write_error();
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
#[path = "file_test.rs"]
mod file_test;
