//! Change events.
//!
//! Events are immutable once built: fields are private and exposed through
//! getters only. `details` is non-empty by construction ([`Details`]), so an
//! event without a human-readable line cannot exist, not even after
//! deserializing a hand-edited log.

use crate::errors::CaseWatchError;
use crate::model::fields::FieldName;
use crate::model::record::RecordId;
use crate::model::snapshot::SectionId;
use crate::model::summary::Fingerprint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Schema-stable change taxonomy. Declaration order is report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    NewRecord,
    IdentityNumberChanged,
    FieldChanged,
    ContentChanged,
    SectionAdded,
    SectionRemoved,
    SectionChanged,
}

impl ChangeKind {
    pub const ALL: [ChangeKind; 7] = [
        ChangeKind::NewRecord,
        ChangeKind::IdentityNumberChanged,
        ChangeKind::FieldChanged,
        ChangeKind::ContentChanged,
        ChangeKind::SectionAdded,
        ChangeKind::SectionRemoved,
        ChangeKind::SectionChanged,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::NewRecord => "new_record",
            ChangeKind::IdentityNumberChanged => "identity_number_changed",
            ChangeKind::FieldChanged => "field_changed",
            ChangeKind::ContentChanged => "content_changed",
            ChangeKind::SectionAdded => "section_added",
            ChangeKind::SectionRemoved => "section_removed",
            ChangeKind::SectionChanged => "section_changed",
        }
    }
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a field value changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldChange {
    /// No previous value
    Added,
    /// No current value
    Removed,
    /// Both present, different
    Replaced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineTag {
    Added,
    Removed,
}

/// One line reported by the text differ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineChange {
    pub tag: LineTag,
    pub line: String,
}

impl LineChange {
    pub fn added(line: impl Into<String>) -> Self {
        Self {
            tag: LineTag::Added,
            line: line.into(),
        }
    }

    pub fn removed(line: impl Into<String>) -> Self {
        Self {
            tag: LineTag::Removed,
            line: line.into(),
        }
    }
}

/// Kind-specific payload. Serialized flat into the event, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangePayload {
    NewRecord,
    IdentityNumberChanged {
        old: String,
        new: String,
    },
    FieldChanged {
        field: FieldName,
        old: Option<String>,
        new: Option<String>,
        change: FieldChange,
    },
    ContentChanged {
        old_fingerprint: Fingerprint,
        new_fingerprint: Fingerprint,
    },
    SectionAdded {
        section: SectionId,
    },
    SectionRemoved {
        section: SectionId,
    },
    SectionChanged {
        section: SectionId,
        lines: Vec<LineChange>,
        /// The comparison could not be completed; `details` says why
        degraded: bool,
    },
}

impl ChangePayload {
    pub fn kind(&self) -> ChangeKind {
        match self {
            ChangePayload::NewRecord => ChangeKind::NewRecord,
            ChangePayload::IdentityNumberChanged { .. } => ChangeKind::IdentityNumberChanged,
            ChangePayload::FieldChanged { .. } => ChangeKind::FieldChanged,
            ChangePayload::ContentChanged { .. } => ChangeKind::ContentChanged,
            ChangePayload::SectionAdded { .. } => ChangeKind::SectionAdded,
            ChangePayload::SectionRemoved { .. } => ChangeKind::SectionRemoved,
            ChangePayload::SectionChanged { .. } => ChangeKind::SectionChanged,
        }
    }
}

/// Non-empty sequence of human-readable detail lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Details(Vec<String>);

impl Details {
    pub fn one(line: impl Into<String>) -> Self {
        Self(vec![line.into()])
    }

    /// `first` guarantees non-emptiness; `rest` may be empty.
    pub fn from_lines(first: impl Into<String>, rest: impl IntoIterator<Item = String>) -> Self {
        let mut lines = vec![first.into()];
        lines.extend(rest);
        Self(lines)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<Vec<String>> for Details {
    type Error = CaseWatchError;

    fn try_from(lines: Vec<String>) -> Result<Self, Self::Error> {
        if lines.is_empty() {
            return Err(CaseWatchError::EmptyDetails {
                record_id: String::new(),
            });
        }
        Ok(Self(lines))
    }
}

impl From<Details> for Vec<String> {
    fn from(details: Details) -> Self {
        details.0
    }
}

/// One atomic, typed notification that something differs between two snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    record_id: RecordId,
    occurred_at: DateTime<Utc>,
    message: String,
    details: Details,
    #[serde(flatten)]
    payload: ChangePayload,
}

impl ChangeEvent {
    pub fn new(
        record_id: RecordId,
        occurred_at: DateTime<Utc>,
        message: impl Into<String>,
        details: Details,
        payload: ChangePayload,
    ) -> Self {
        Self {
            record_id,
            occurred_at,
            message: message.into(),
            details,
            payload,
        }
    }

    pub fn kind(&self) -> ChangeKind {
        self.payload.kind()
    }

    pub fn record_id(&self) -> &RecordId {
        &self.record_id
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> &[String] {
        self.details.as_slice()
    }

    pub fn payload(&self) -> &ChangePayload {
        &self.payload
    }
}
