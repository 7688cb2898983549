//! Record-list loader.
//!
//! Two formats are accepted:
//! - plain text: one identity per line, blank lines and `#` comments skipped
//! - YAML (`.yaml` / `.yml`): a sequence of strings
//!
//! Duplicates are dropped keeping the first occurrence.

use crate::errors::{io_error, record_list_error, Result};
use casewatch_core::RecordId;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Load record identities from `path`, choosing the format by extension.
pub fn load_record_list(path: &Path) -> Result<Vec<RecordId>> {
    let content = fs::read_to_string(path).map_err(|e| io_error("load_record_list", e))?;
    let is_yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));

    let ids = if is_yaml {
        parse_record_yaml(&content)?
    } else {
        parse_record_lines(&content)
    };
    tracing::debug!(path = %path.display(), record_count = ids.len(), "record list loaded");
    Ok(ids)
}

/// Parse the plain-text format.
pub fn parse_record_lines(content: &str) -> Vec<RecordId> {
    dedup(
        content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .filter_map(|l| RecordId::new(l).ok()),
    )
}

/// Parse the YAML format.
pub fn parse_record_yaml(content: &str) -> Result<Vec<RecordId>> {
    let raw: Option<Vec<String>> = serde_yaml::from_str(content)
        .map_err(|e| record_list_error(&format!("YAML parse error: {}", e)))?;

    let mut ids = Vec::new();
    for (index, entry) in raw.unwrap_or_default().into_iter().enumerate() {
        let id = RecordId::new(entry).map_err(|_| {
            record_list_error(&format!("entry {} is an empty record identity", index))
        })?;
        ids.push(id);
    }
    Ok(dedup(ids))
}

fn dedup(ids: impl IntoIterator<Item = RecordId>) -> Vec<RecordId> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}
