//! Record identity.

use crate::errors::{CaseWatchError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Stable, externally supplied key of a tracked record (usually its canonical URL).
///
/// Primary key of the state store. Surrounding whitespace is trimmed and an
/// empty identity is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(CaseWatchError::EmptyRecordId);
        }
        if trimmed.len() == id.len() {
            Ok(Self(id))
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RecordId {
    type Error = CaseWatchError;

    fn try_from(value: String) -> Result<Self> {
        RecordId::new(value)
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

impl FromStr for RecordId {
    type Err = CaseWatchError;

    fn from_str(s: &str) -> Result<Self> {
        RecordId::new(s)
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
