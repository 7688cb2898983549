//! Events grouped per record, in first-appearance order.

use crate::model::{ChangeEvent, RecordId};

/// All events of one record, in emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSection {
    pub record_id: RecordId,
    pub events: Vec<ChangeEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DetailedReport {
    pub records: Vec<RecordSection>,
}

impl DetailedReport {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Group `events` by record. Records appear in the order of their first
/// event; events keep their relative order.
pub fn build_detailed(events: &[ChangeEvent]) -> DetailedReport {
    let mut records: Vec<RecordSection> = Vec::new();
    for event in events {
        match records
            .iter_mut()
            .find(|r| &r.record_id == event.record_id())
        {
            Some(section) => section.events.push(event.clone()),
            None => records.push(RecordSection {
                record_id: event.record_id().clone(),
                events: vec![event.clone()],
            }),
        }
    }
    DetailedReport { records }
}

/// Render Markdown: one heading per record, one bullet per event, detail
/// lines indented in a code block.
pub fn render_detailed(report: &DetailedReport) -> String {
    let mut out = String::new();
    out.push_str("## Change Details\n\n");

    if report.is_empty() {
        out.push_str("_No changes detected._\n");
        return out;
    }

    for section in &report.records {
        out.push_str(&format!("### {}\n\n", section.record_id));
        for event in &section.events {
            out.push_str(&format!("- **{}**: {}\n", event.kind(), event.message()));
            out.push_str("  ```\n");
            for line in event.details() {
                out.push_str(&format!("  {}\n", line));
            }
            out.push_str("  ```\n");
        }
        out.push('\n');
    }
    out
}
