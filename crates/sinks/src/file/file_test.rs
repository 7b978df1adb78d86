//! File sink tests

use eventlog_protocol::{EventRecord, SiteId};
use tempfile::TempDir;

use super::FileSink;
use crate::EventSink;

#[test]
fn test_creates_parent_dirs() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested/deeper/events.log");

    let sink = FileSink::open(&path).unwrap();

    assert!(path.exists());
    assert_eq!(sink.path(), path.as_path());
    assert_eq!(sink.name(), "file");
}

#[test]
fn test_one_line_per_record() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("events.log");
    let sink = FileSink::open(&path).unwrap();

    sink.write(&EventRecord::information("App", "START", "booting")).unwrap();
    sink.write(
        &EventRecord::error("DB", "TIMEOUT", "line one\nline two").with_site(SiteId::new(7)),
    )
    .unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<_> = contents.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("[I] site:0 App/START | booting"));
    assert!(lines[1].contains("[E] site:7 DB/TIMEOUT | line one\\nline two"));

    let metrics = sink.metrics();
    assert_eq!(metrics.records_written, 2);
    assert_eq!(metrics.bytes_written, contents.len() as u64);
}

#[test]
fn test_appends_across_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("events.log");

    FileSink::open(&path)
        .unwrap()
        .write(&EventRecord::warning("A", "ONE", ""))
        .unwrap();
    FileSink::open(&path)
        .unwrap()
        .write(&EventRecord::warning("A", "TWO", ""))
        .unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(contents.lines().count(), 2);
}
