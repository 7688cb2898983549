//! Event counts grouped by kind.

use crate::model::{ChangeEvent, ChangeKind, RecordId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Every kind in schema order, zero counts included
    pub counts: BTreeMap<ChangeKind, usize>,
    pub total_events: usize,
    /// Records with at least one event
    pub records_with_events: usize,
}

impl Summary {
    pub fn count(&self, kind: ChangeKind) -> usize {
        self.counts.get(&kind).copied().unwrap_or(0)
    }
}

pub fn build_summary(events: &[ChangeEvent]) -> Summary {
    let mut counts: BTreeMap<ChangeKind, usize> =
        ChangeKind::ALL.iter().map(|k| (*k, 0)).collect();
    let mut records: BTreeSet<&RecordId> = BTreeSet::new();

    for event in events {
        *counts.entry(event.kind()).or_insert(0) += 1;
        records.insert(event.record_id());
    }

    Summary {
        counts,
        total_events: events.len(),
        records_with_events: records.len(),
    }
}

/// Render a Markdown summary block.
pub fn render_summary(summary: &Summary) -> String {
    let mut out = String::new();
    out.push_str("## Change Summary\n\n");

    if summary.total_events == 0 {
        out.push_str("_No changes detected._\n");
        return out;
    }

    out.push_str(&format!(
        "**Events**: {}  \n**Records with changes**: {}\n\n",
        summary.total_events, summary.records_with_events
    ));
    out.push_str("| Kind | Count |\n|---|---|\n");
    for (kind, count) in &summary.counts {
        if *count > 0 {
            out.push_str(&format!("| `{}` | {} |\n", kind, count));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_summary_has_all_kinds() {
        let summary = build_summary(&[]);
        assert_eq!(summary.counts.len(), ChangeKind::ALL.len());
        assert_eq!(summary.total_events, 0);
        assert!(render_summary(&summary).contains("_No changes detected._"));
    }
}
