//! Report builder tests: summary counts, detailed grouping, event log export.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use casewatch_core::report::{
    build_detailed, build_summary, render_detailed, render_summary, EventLog,
};
use casewatch_core::{
    summarize, ChangeDetector, ChangeEvent, ChangeKind, FieldName, RecordId, Section, SectionId,
    Snapshot,
};
use casewatch_core_types::RunId;
use chrono::{TimeZone, Utc};

fn rid(id: &str) -> RecordId {
    RecordId::new(id).unwrap()
}

/// Two records: one new, one with a judge change and an added section.
fn run_events() -> Vec<ChangeEvent> {
    let detector = ChangeDetector::default();
    let day1 = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
    let day2 = Utc.with_ymd_and_hms(2024, 3, 2, 9, 0, 0).unwrap();

    let mut events = detector.detect(
        &rid("case-b"),
        None,
        &Snapshot::new(day2).with_field(FieldName::Judge, "C. Sidorov"),
    );

    let prev = summarize(
        &rid("case-a"),
        &Snapshot::new(day1).with_field(FieldName::Judge, "A. Ivanov"),
    );
    let cur = Snapshot::new(day2)
        .with_field(FieldName::Judge, "B. Petrov")
        .with_section(SectionId::from_index(1), Section::text("Иск принят"));
    events.extend(detector.detect(&rid("case-a"), Some(&prev), &cur));
    events
}

#[test]
fn test_summary_counts_by_kind() {
    let summary = build_summary(&run_events());

    assert_eq!(summary.total_events, 4);
    assert_eq!(summary.records_with_events, 2);
    assert_eq!(summary.count(ChangeKind::NewRecord), 1);
    assert_eq!(summary.count(ChangeKind::FieldChanged), 1);
    assert_eq!(summary.count(ChangeKind::ContentChanged), 1);
    assert_eq!(summary.count(ChangeKind::SectionAdded), 1);
    assert_eq!(summary.count(ChangeKind::SectionRemoved), 0);

    let rendered = render_summary(&summary);
    assert!(rendered.contains("| `field_changed` | 1 |"));
    assert!(!rendered.contains("section_removed"));
}

#[test]
fn test_detailed_keeps_processing_order() {
    let report = build_detailed(&run_events());
    let order: Vec<&str> = report.records.iter().map(|r| r.record_id.as_str()).collect();
    assert_eq!(order, vec!["case-b", "case-a"]);

    let rendered = render_detailed(&report);
    let b = rendered.find("### case-b").unwrap();
    let a = rendered.find("### case-a").unwrap();
    assert!(b < a);
    assert!(rendered.contains("  - A. Ivanov"));
    assert!(rendered.contains("  + B. Petrov"));
    assert!(rendered.contains("  + Иск принят"));
}

#[test]
fn test_reports_rebuild_from_persisted_log() {
    let events = run_events();
    let log = EventLog::new(
        RunId::from_string("run-1".to_string()),
        Utc.with_ymd_and_hms(2024, 3, 2, 10, 0, 0).unwrap(),
        events.clone(),
    );

    let json = log.to_json_pretty().unwrap();
    let loaded = EventLog::from_json(&json).unwrap();

    assert_eq!(loaded, log);
    assert_eq!(
        render_summary(&build_summary(&loaded.events)),
        render_summary(&build_summary(&events))
    );
    assert_eq!(
        render_detailed(&build_detailed(&loaded.events)),
        render_detailed(&build_detailed(&events))
    );
}

#[test]
fn test_event_json_has_stable_field_names() {
    let events = run_events();
    let value = serde_json::to_value(&events[1]).unwrap();

    assert_eq!(value["kind"], "field_changed");
    assert_eq!(value["record_id"], "case-a");
    assert_eq!(value["field"], "judge");
    assert_eq!(value["old"], "A. Ivanov");
    assert_eq!(value["new"], "B. Petrov");
    assert_eq!(value["change"], "replaced");
    assert_eq!(value["occurred_at"], "2024-03-02T09:00:00Z");
    assert!(value["details"].as_array().is_some_and(|d| !d.is_empty()));
}

#[test]
fn test_empty_run_renders_placeholders() {
    assert!(render_summary(&build_summary(&[])).contains("_No changes detected._"));
    assert!(render_detailed(&build_detailed(&[])).contains("_No changes detected._"));
}
