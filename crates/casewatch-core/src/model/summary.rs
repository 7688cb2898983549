//! Persisted, comparison-sufficient projection of a snapshot.
//!
//! ## Storage trade-off
//!
//! The summary keeps each section's raw text next to its fingerprint so that
//! the next run can produce a line diff without fetching the previous
//! version again. This costs state-file size proportional to the tracked
//! content. The alternative (fingerprints only, re-fetch on change) would
//! need the source to serve historical versions, which it does not.

use crate::digest::{fingerprint_section, fingerprint_snapshot};
use crate::errors::{CaseWatchError, Result};
use crate::model::fields::{deserialize_tracked, CoreFields, FieldName};
use crate::model::record::RecordId;
use crate::model::snapshot::{SectionId, Snapshot};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Hex-encoded SHA-256 digest used for cheap equality checks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 characters, for display.
    pub fn short(&self) -> &str {
        let end = self.0.len().min(12);
        &self.0[..end]
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the state store keeps for one record between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotSummary {
    pub record_id: RecordId,
    pub captured_at: DateTime<Utc>,
    /// Whole-snapshot fingerprint (excludes `captured_at`)
    pub fingerprint: Fingerprint,
    pub section_fingerprints: BTreeMap<SectionId, Fingerprint>,
    /// Raw section text, needed to line-diff on the next run
    #[serde(default)]
    pub section_texts: BTreeMap<SectionId, String>,
    #[serde(default)]
    pub core_fields: CoreFields,
    /// Recognized field set at the time this summary was written.
    ///
    /// Fields outside this set have no baseline and are never reported as
    /// changed against this summary.
    #[serde(default, deserialize_with = "deserialize_tracked")]
    pub tracked_fields: BTreeSet<FieldName>,
}

impl SnapshotSummary {
    /// Check the no-orphan-keys invariant between the two section maps.
    ///
    /// A fingerprint without text is allowed (hash-only legacy state); text
    /// without a fingerprint is not.
    ///
    /// # Errors
    ///
    /// Returns `CaseWatchError::SectionKeyMismatch` listing the orphan keys.
    pub fn validate(&self) -> Result<()> {
        let orphans: Vec<String> = self
            .section_texts
            .keys()
            .filter(|k| !self.section_fingerprints.contains_key(*k))
            .map(|k| k.to_string())
            .collect();
        if orphans.is_empty() {
            Ok(())
        } else {
            Err(CaseWatchError::SectionKeyMismatch {
                record_id: self.record_id.to_string(),
                keys: orphans,
            })
        }
    }

    /// Drop section texts that have no fingerprint. Returns how many were dropped.
    pub fn repair(&mut self) -> usize {
        let before = self.section_texts.len();
        let fingerprints = &self.section_fingerprints;
        self.section_texts.retain(|k, _| fingerprints.contains_key(k));
        before - self.section_texts.len()
    }

    pub fn tracks(&self, field: FieldName) -> bool {
        self.tracked_fields.contains(&field)
    }
}

/// Project a snapshot onto its persisted summary.
///
/// Section maps are keyed by exactly the ids present in `snapshot.sections`.
pub fn summarize(record_id: &RecordId, snapshot: &Snapshot) -> SnapshotSummary {
    let mut section_fingerprints = BTreeMap::new();
    let mut section_texts = BTreeMap::new();
    for (id, section) in snapshot.sections.iter() {
        section_fingerprints.insert(id.clone(), fingerprint_section(section));
        section_texts.insert(id.clone(), section.raw_text.clone());
    }

    SnapshotSummary {
        record_id: record_id.clone(),
        captured_at: snapshot.captured_at,
        fingerprint: fingerprint_snapshot(snapshot),
        section_fingerprints,
        section_texts,
        core_fields: snapshot.core_fields.clone(),
        tracked_fields: FieldName::all_tracked(),
    }
}
