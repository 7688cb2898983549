//! Change detection between a stored summary and a fresh snapshot.
//!
//! [`ChangeDetector::detect`] runs five steps in a fixed order:
//!
//! 1. new record (no previous summary): one `new_record` event, stop
//! 2. identity number (`case_number`) changed
//! 3. field-level diff over the union of field names
//! 4. whole-snapshot fingerprint
//! 5. section-level diff: added, removed, then changed, each sorted by id
//!
//! Detection is pure. `occurred_at` of every event is the current snapshot's
//! `captured_at`, so the same inputs give byte-identical output.

use crate::diff::text::{compare_section, diff_text, render_line};
use crate::digest::{fingerprint_section, fingerprint_snapshot};
use crate::model::{
    ChangeEvent, ChangePayload, Details, FieldChange, FieldName, LineChange, RecordId, Section,
    SectionId, Snapshot, SnapshotSummary,
};
use crate::sink::{Notice, ReportSink, TracingSink};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Detail line used when only markup changed inside a section.
pub const NO_VISIBLE_DIFFERENCE: &str = "no visible text difference (markup changed)";

/// Prefix of the single detail line of a degraded `section_changed` event.
pub const COMPARISON_INCOMPLETE: &str = "comparison could not be completed";

pub struct ChangeDetector {
    sink: Arc<dyn ReportSink>,
}

impl Default for ChangeDetector {
    fn default() -> Self {
        Self::new(Arc::new(TracingSink))
    }
}

impl ChangeDetector {
    pub fn new(sink: Arc<dyn ReportSink>) -> Self {
        Self { sink }
    }

    /// Compare `current` against the stored `previous` summary.
    ///
    /// Never fails: a section that cannot be compared yields a degraded
    /// `section_changed` event and detection moves on.
    pub fn detect(
        &self,
        record_id: &RecordId,
        previous: Option<&SnapshotSummary>,
        current: &Snapshot,
    ) -> Vec<ChangeEvent> {
        let mut out = Emitter::new(record_id, current.captured_at);

        let Some(previous) = previous else {
            out.emit(
                "new record observed",
                Details::one(format!(
                    "first observation with {} sections",
                    current.sections.len()
                )),
                ChangePayload::NewRecord,
            );
            return out.finish();
        };

        self.check_identity_number(&mut out, previous, current);
        self.diff_fields(&mut out, previous, current);
        self.check_fingerprint(&mut out, previous, current);
        self.diff_sections(&mut out, previous, current);

        let events = out.finish();
        tracing::debug!(
            record_id = %record_id,
            event_count = events.len(),
            "detection complete"
        );
        events
    }

    fn check_identity_number(
        &self,
        out: &mut Emitter<'_>,
        previous: &SnapshotSummary,
        current: &Snapshot,
    ) {
        let field = FieldName::IDENTITY;
        if !previous.tracks(field) {
            return;
        }
        if let (Some(old), Some(new)) = (
            previous.core_fields.get(field),
            current.core_fields.get(field),
        ) {
            if old != new {
                out.emit(
                    format!("case number changed from '{}' to '{}'", old, new),
                    Details::from_lines(format!("- {}", old), [format!("+ {}", new)]),
                    ChangePayload::IdentityNumberChanged {
                        old: old.to_string(),
                        new: new.to_string(),
                    },
                );
            }
        }
    }

    fn diff_fields(&self, out: &mut Emitter<'_>, previous: &SnapshotSummary, current: &Snapshot) {
        let names: BTreeSet<FieldName> = previous
            .core_fields
            .names()
            .chain(current.core_fields.names())
            .filter(|f| previous.tracks(*f))
            .collect();

        for field in names {
            let old = previous.core_fields.get(field);
            let new = current.core_fields.get(field);
            let (message, details, change) = match (old, new) {
                (None, None) => continue,
                (Some(o), Some(n)) if o == n => continue,
                (None, Some(n)) => (
                    format!("{} added: '{}'", field, n),
                    Details::one(format!("+ {}", n)),
                    FieldChange::Added,
                ),
                (Some(o), None) => (
                    format!("{} removed (was '{}')", field, o),
                    Details::one(format!("- {}", o)),
                    FieldChange::Removed,
                ),
                (Some(o), Some(n)) => (
                    format!("{} changed from '{}' to '{}'", field, o, n),
                    Details::from_lines(format!("- {}", o), [format!("+ {}", n)]),
                    FieldChange::Replaced,
                ),
            };
            out.emit(
                message,
                details,
                ChangePayload::FieldChanged {
                    field,
                    old: old.map(str::to_string),
                    new: new.map(str::to_string),
                    change,
                },
            );
        }
    }

    fn check_fingerprint(
        &self,
        out: &mut Emitter<'_>,
        previous: &SnapshotSummary,
        current: &Snapshot,
    ) {
        let new_fingerprint = fingerprint_snapshot(current);
        if new_fingerprint != previous.fingerprint {
            out.emit(
                "content fingerprint changed",
                Details::one(format!(
                    "{} -> {}",
                    previous.fingerprint.short(),
                    new_fingerprint.short()
                )),
                ChangePayload::ContentChanged {
                    old_fingerprint: previous.fingerprint.clone(),
                    new_fingerprint,
                },
            );
        }
    }

    fn diff_sections(&self, out: &mut Emitter<'_>, previous: &SnapshotSummary, current: &Snapshot) {
        let old_ids: BTreeSet<&SectionId> = previous.section_fingerprints.keys().collect();
        let new_ids: BTreeSet<&SectionId> = current.sections.ids().collect();

        for id in new_ids.difference(&old_ids) {
            let text = current
                .sections
                .get(id)
                .map(|s| s.raw_text.as_str())
                .unwrap_or_default();
            let lines = diff_text("", text);
            out.emit(
                format!("section {} added", id),
                details_or(&lines, "section has no visible text"),
                ChangePayload::SectionAdded {
                    section: (*id).clone(),
                },
            );
        }

        for id in old_ids.difference(&new_ids) {
            let lines = previous
                .section_texts
                .get(*id)
                .map(|text| diff_text(text, ""))
                .unwrap_or_default();
            out.emit(
                format!("section {} removed", id),
                details_or(&lines, "previous text not stored"),
                ChangePayload::SectionRemoved {
                    section: (*id).clone(),
                },
            );
        }

        for id in old_ids.intersection(&new_ids) {
            let Some(section) = current.sections.get(id) else {
                continue;
            };
            if previous.section_fingerprints.get(*id) == Some(&fingerprint_section(section)) {
                continue;
            }
            self.section_changed(out, previous, id, section);
        }
    }

    fn section_changed(
        &self,
        out: &mut Emitter<'_>,
        previous: &SnapshotSummary,
        id: &SectionId,
        section: &Section,
    ) {
        let previous_text = previous.section_texts.get(id).map(String::as_str);
        match compare_section(previous_text, section) {
            Ok(lines) => {
                let details = details_or(&lines, NO_VISIBLE_DIFFERENCE);
                out.emit(
                    format!("section {} changed", id),
                    details,
                    ChangePayload::SectionChanged {
                        section: id.clone(),
                        lines,
                        degraded: false,
                    },
                );
            }
            Err(err) => {
                let err = err
                    .with_record_id(out.record_id.as_str())
                    .with_section(id.as_str());
                tracing::warn!(
                    record_id = %out.record_id,
                    section_id = %id,
                    err.code = err.code(),
                    "section comparison degraded"
                );
                self.sink.on_notice(&Notice::warn(
                    Some(out.record_id),
                    format!("section {}: {}", id, err),
                ));
                out.emit(
                    format!("section {} changed", id),
                    Details::one(format!("{}: {}", COMPARISON_INCOMPLETE, err.message())),
                    ChangePayload::SectionChanged {
                        section: id.clone(),
                        lines: Vec::new(),
                        degraded: true,
                    },
                );
            }
        }
    }
}

fn details_or(lines: &[LineChange], placeholder: &str) -> Details {
    let mut rendered = lines.iter().map(render_line);
    match rendered.next() {
        Some(first) => Details::from_lines(first, rendered),
        None => Details::one(placeholder),
    }
}

/// Accumulates events that share one record and timestamp.
struct Emitter<'a> {
    record_id: &'a RecordId,
    occurred_at: DateTime<Utc>,
    events: Vec<ChangeEvent>,
}

impl<'a> Emitter<'a> {
    fn new(record_id: &'a RecordId, occurred_at: DateTime<Utc>) -> Self {
        Self {
            record_id,
            occurred_at,
            events: Vec::new(),
        }
    }

    fn emit(&mut self, message: impl Into<String>, details: Details, payload: ChangePayload) {
        self.events.push(ChangeEvent::new(
            self.record_id.clone(),
            self.occurred_at,
            message,
            details,
            payload,
        ));
    }

    fn finish(self) -> Vec<ChangeEvent> {
        self.events
    }
}
