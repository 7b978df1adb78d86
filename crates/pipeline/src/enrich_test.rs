//! Enrichment tests

use chrono::{TimeZone, Utc};
use eventlog_protocol::{EventRecord, ExceptionInfo};

use super::{Enricher, FixedActor, NoActor, sanitize_user_name};

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
}

// ============================================================================
// Event time
// ============================================================================

#[test]
fn test_sets_time_once() {
    let enricher = Enricher::default();
    let mut record = EventRecord::information("App", "START", "");

    enricher.enrich(&mut record, &NoActor, now());
    let later = now() + chrono::TimeDelta::hours(1);
    enricher.enrich(&mut record, &NoActor, later);

    assert_eq!(record.event_time, Some(now()));
}

// ============================================================================
// Exception text
// ============================================================================

#[test]
fn test_exception_appended_once() {
    let enricher = Enricher::default();
    let exception = ExceptionInfo::new("std::io::Error", "connection reset")
        .with_stack_trace("at db::query\nat app::main")
        .with_inner(ExceptionInfo::new("TimeoutError", "deadline exceeded"));
    let rendered = exception.render();

    let mut record = EventRecord::error("DB", "QUERY", "query failed").with_exception(exception);
    enricher.enrich(&mut record, &NoActor, now());
    let once = record.description.clone();
    enricher.enrich(&mut record, &NoActor, now());

    assert_eq!(record.description, once);
    assert_eq!(once, format!("query failed\n\n{rendered}"));
    assert_eq!(once.matches("connection reset").count(), 1);
    assert!(once.contains("Inner exception"));
}

#[test]
fn test_exception_with_empty_description() {
    let enricher = Enricher::default();
    let exception = ExceptionInfo::new("ParseError", "bad input");
    let rendered = exception.render();

    let mut record = EventRecord::error("Import", "PARSE", "").with_exception(exception);
    enricher.enrich(&mut record, &NoActor, now());

    assert_eq!(record.description, rendered);
}

// ============================================================================
// User resolution
// ============================================================================

#[test]
fn test_resolves_current_user() {
    let enricher = Enricher::default();
    let mut record = EventRecord::warning("Cart", "EMPTY", "");

    enricher.enrich(&mut record, &FixedActor::user(7, "alice"), now());

    assert_eq!(record.user_id, Some(7));
    assert_eq!(record.user_name.as_deref(), Some("alice"));
}

#[test]
fn test_explicit_user_kept() {
    let enricher = Enricher::default();
    let mut record = EventRecord::warning("Cart", "EMPTY", "").with_user(3, "bob");

    enricher.enrich(&mut record, &FixedActor::user(7, "alice"), now());

    assert_eq!(record.user_id, Some(3));
    assert_eq!(record.user_name.as_deref(), Some("bob"));
}

#[test]
fn test_impersonation_suffix_once() {
    let enricher = Enricher::default();
    let actor = FixedActor::user(7, "alice").impersonated_by("admin");
    let mut record = EventRecord::information("Users", "EDIT", "");

    enricher.enrich(&mut record, &actor, now());
    enricher.enrich(&mut record, &actor, now());

    assert_eq!(record.user_name.as_deref(), Some("alice (admin)"));
}

#[test]
fn test_impersonation_same_name_skipped() {
    let enricher = Enricher::default();
    let actor = FixedActor::user(1, "admin").impersonated_by("admin");
    let mut record = EventRecord::information("Users", "EDIT", "");

    enricher.enrich(&mut record, &actor, now());

    assert_eq!(record.user_name.as_deref(), Some("admin"));
}

#[test]
fn test_safe_user_name_fallback() {
    let actor = FixedActor {
        fallback: Some("CORP\\j smith".into()),
        ..FixedActor::default()
    };

    let mut record = EventRecord::information("Auth", "LOGIN", "");
    Enricher::default().enrich(&mut record, &actor, now());
    assert!(record.user_name.is_none());

    let enricher = Enricher {
        resolve_safe_user_name: true,
        ..Enricher::default()
    };
    enricher.enrich(&mut record, &actor, now());
    assert_eq!(record.user_name.as_deref(), Some("CORP_j_smith"));
    assert!(record.user_id.is_none());
}

#[test]
fn test_sanitize_user_name() {
    assert_eq!(sanitize_user_name("jane.doe@example.com"), "jane.doe@example.com");
    assert_eq!(sanitize_user_name("<script>"), "_script_");
    assert_eq!(sanitize_user_name("   "), "");
}

// ============================================================================
// Machine name
// ============================================================================

#[test]
fn test_machine_name() {
    let enricher = Enricher {
        machine_name: Some("web-01".into()),
        ..Enricher::default()
    };

    let mut record = EventRecord::information("App", "START", "");
    enricher.enrich(&mut record, &NoActor, now());
    assert_eq!(record.machine_name.as_deref(), Some("web-01"));

    let mut record = EventRecord::information("App", "START", "");
    record.machine_name = Some("worker-3".into());
    enricher.enrich(&mut record, &NoActor, now());
    assert_eq!(record.machine_name.as_deref(), Some("worker-3"));
}
