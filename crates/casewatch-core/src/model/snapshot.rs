//! Point-in-time snapshot of a record.
//!
//! A snapshot is built fresh on every run by the extraction collaborator and
//! lives only for the duration of one comparison. Only its summary
//! ([`crate::model::summary::SnapshotSummary`]) is persisted.

use crate::errors::{CaseWatchError, Result};
use crate::model::fields::{CoreFields, FieldName};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::str::FromStr;

/// Identifier of a section (tab) of a record, e.g. `"1"`, `"2"`.
///
/// Ordering is numeric when both identifiers are integers, so `"2"` sorts
/// before `"10"`; other identifiers sort lexicographically after them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SectionId(String);

impl SectionId {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(CaseWatchError::EmptySectionId);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Section id for the 1-based tab index `n`.
    pub fn from_index(n: usize) -> Self {
        Self(n.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn numeric(&self) -> Option<u64> {
        self.0.parse().ok()
    }
}

impl Ord for SectionId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric(), other.numeric()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for SectionId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl TryFrom<String> for SectionId {
    type Error = CaseWatchError;

    fn try_from(value: String) -> Result<Self> {
        SectionId::new(value)
    }
}

impl From<SectionId> for String {
    fn from(id: SectionId) -> Self {
        id.0
    }
}

impl FromStr for SectionId {
    type Err = CaseWatchError;

    fn from_str(s: &str) -> Result<Self> {
        SectionId::new(s)
    }
}

impl std::fmt::Display for SectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Content of one section: raw (possibly marked-up) text plus optional
/// individually extracted fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub raw_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, Option<String>>>,
}

impl Section {
    pub fn text(raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
            fields: None,
        }
    }

    pub fn with_fields(mut self, fields: BTreeMap<String, Option<String>>) -> Self {
        self.fields = Some(fields);
        self
    }
}

/// One `(id, section)` pair as serialized in a [`Sections`] list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionEntry {
    pub id: SectionId,
    #[serde(flatten)]
    pub section: Section,
}

/// Order-preserving mapping of section id → section.
///
/// Keeps the order the source presented the sections in (which feeds the
/// whole-snapshot fingerprint), while lookups are by id. Inserting an
/// existing id replaces its content in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<SectionEntry>", into = "Vec<SectionEntry>")]
pub struct Sections(Vec<SectionEntry>);

impl Sections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: SectionId, section: Section) {
        match self.0.iter_mut().find(|e| e.id == id) {
            Some(existing) => existing.section = section,
            None => self.0.push(SectionEntry { id, section }),
        }
    }

    pub fn get(&self, id: &SectionId) -> Option<&Section> {
        self.0.iter().find(|e| &e.id == id).map(|e| &e.section)
    }

    pub fn contains(&self, id: &SectionId) -> bool {
        self.get(id).is_some()
    }

    /// Entries in source order.
    pub fn iter(&self) -> impl Iterator<Item = (&SectionId, &Section)> + '_ {
        self.0.iter().map(|e| (&e.id, &e.section))
    }

    /// Identifiers in source order.
    pub fn ids(&self) -> impl Iterator<Item = &SectionId> + '_ {
        self.0.iter().map(|e| &e.id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<SectionEntry>> for Sections {
    fn from(entries: Vec<SectionEntry>) -> Self {
        let mut sections = Sections::new();
        for entry in entries {
            sections.insert(entry.id, entry.section);
        }
        sections
    }
}

impl From<Sections> for Vec<SectionEntry> {
    fn from(sections: Sections) -> Self {
        sections.0
    }
}

/// Normalized representation of a record at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub core_fields: CoreFields,
    pub sections: Sections,
    pub captured_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(captured_at: DateTime<Utc>) -> Self {
        Self {
            core_fields: CoreFields::new(),
            sections: Sections::new(),
            captured_at,
        }
    }

    pub fn with_field(mut self, field: FieldName, value: impl Into<String>) -> Self {
        self.core_fields.set(field, Some(value.into()));
        self
    }

    pub fn with_section(mut self, id: SectionId, section: Section) -> Self {
        self.sections.insert(id, section);
        self
    }
}
