//! CLI command implementations

pub mod forget;
pub mod report;
pub mod run;
pub mod show;

use casewatch_core::report::{build_detailed, build_summary, render_detailed, render_summary};
use casewatch_core::ChangeEvent;

/// Summary table followed by per-record details.
pub(crate) fn render_markdown(events: &[ChangeEvent]) -> String {
    let mut out = render_summary(&build_summary(events));
    let detailed = build_detailed(events);
    if !detailed.is_empty() {
        out.push('\n');
        out.push_str(&render_detailed(&detailed));
    }
    out
}
