//! Property tests for the change detector laws.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use casewatch_core::{
    summarize, ChangeDetector, ChangeKind, ChangePayload, FieldName, RecordId, Section, SectionId,
    Snapshot,
};
use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

fn rid() -> RecordId {
    RecordId::new("case-law").unwrap()
}

fn field_strategy() -> impl Strategy<Value = BTreeMap<usize, String>> {
    prop::collection::btree_map(0..FieldName::ALL.len(), "[a-zA-Z0-9 .]{1,12}", 0..6)
}

fn section_strategy() -> impl Strategy<Value = BTreeMap<u8, String>> {
    prop::collection::btree_map(0u8..8, "[a-z ]{0,20}(\n[a-z ]{0,20}){0,3}", 0..5)
}

fn snapshot(day: u32, fields: &BTreeMap<usize, String>, sections: &BTreeMap<u8, String>) -> Snapshot {
    let mut snap = Snapshot::new(Utc.with_ymd_and_hms(2024, 3, day, 9, 0, 0).unwrap());
    for (idx, value) in fields {
        snap = snap.with_field(FieldName::ALL[*idx], value.clone());
    }
    for (id, text) in sections {
        snap = snap.with_section(SectionId::from_index(*id as usize), Section::text(text.clone()));
    }
    snap
}

proptest! {
    #[test]
    fn prop_new_record_law(fields in field_strategy(), sections in section_strategy()) {
        let cur = snapshot(2, &fields, &sections);
        let events = ChangeDetector::default().detect(&rid(), None, &cur);
        prop_assert_eq!(events.len(), 1);
        prop_assert_eq!(events[0].kind(), ChangeKind::NewRecord);
    }

    #[test]
    fn prop_no_change_law(fields in field_strategy(), sections in section_strategy()) {
        let snap = snapshot(1, &fields, &sections);
        let prev = summarize(&rid(), &snap);
        prop_assert!(ChangeDetector::default().detect(&rid(), Some(&prev), &snap).is_empty());
    }

    #[test]
    fn prop_determinism(
        f1 in field_strategy(), s1 in section_strategy(),
        f2 in field_strategy(), s2 in section_strategy(),
    ) {
        let prev = summarize(&rid(), &snapshot(1, &f1, &s1));
        let cur = snapshot(2, &f2, &s2);
        let detector = ChangeDetector::default();
        let a = detector.detect(&rid(), Some(&prev), &cur);
        let b = detector.detect(&rid(), Some(&prev), &cur);
        prop_assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn prop_field_union_law(f1 in field_strategy(), f2 in field_strategy()) {
        let empty = BTreeMap::new();
        let prev = summarize(&rid(), &snapshot(1, &f1, &empty));
        let cur = snapshot(2, &f2, &empty);
        let events = ChangeDetector::default().detect(&rid(), Some(&prev), &cur);

        let reported: Vec<FieldName> = events
            .iter()
            .filter_map(|e| match e.payload() {
                ChangePayload::FieldChanged { field, .. } => Some(*field),
                _ => None,
            })
            .collect();

        let expected: Vec<FieldName> = f1
            .keys()
            .chain(f2.keys())
            .copied()
            .collect::<BTreeSet<usize>>()
            .into_iter()
            .filter(|idx| f1.get(idx) != f2.get(idx))
            .map(|idx| FieldName::ALL[idx])
            .collect();

        prop_assert_eq!(reported, expected);
    }

    #[test]
    fn prop_section_symmetric_difference_law(s1 in section_strategy(), s2 in section_strategy()) {
        let empty = BTreeMap::new();
        let prev = summarize(&rid(), &snapshot(1, &empty, &s1));
        let cur = snapshot(2, &empty, &s2);
        let events = ChangeDetector::default().detect(&rid(), Some(&prev), &cur);

        let mut added = BTreeSet::new();
        let mut removed = BTreeSet::new();
        for event in &events {
            match event.payload() {
                ChangePayload::SectionAdded { section } => prop_assert!(added.insert(section.clone())),
                ChangePayload::SectionRemoved { section } => prop_assert!(removed.insert(section.clone())),
                _ => {}
            }
        }

        let old: BTreeSet<u8> = s1.keys().copied().collect();
        let new: BTreeSet<u8> = s2.keys().copied().collect();
        let expected_added: BTreeSet<SectionId> = new
            .difference(&old)
            .map(|i| SectionId::from_index(*i as usize))
            .collect();
        let expected_removed: BTreeSet<SectionId> = old
            .difference(&new)
            .map(|i| SectionId::from_index(*i as usize))
            .collect();

        prop_assert_eq!(added, expected_added);
        prop_assert_eq!(removed, expected_removed);
    }
}
