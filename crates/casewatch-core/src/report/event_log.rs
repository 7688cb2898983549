//! Machine-readable export of one run's change events.

use crate::errors::{CaseWatchError, Result};
use crate::model::ChangeEvent;
use casewatch_core_types::RunId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const LOG_SCHEMA_VERSION: u32 = 1;

/// The persisted event log document.
///
/// ```json
/// { "log_schema_version": 1, "run_id": "...", "generated_at": "...", "events": [ ... ] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLog {
    pub log_schema_version: u32,
    pub run_id: RunId,
    pub generated_at: DateTime<Utc>,
    pub events: Vec<ChangeEvent>,
}

impl EventLog {
    pub fn new(run_id: RunId, generated_at: DateTime<Utc>, events: Vec<ChangeEvent>) -> Self {
        Self {
            log_schema_version: LOG_SCHEMA_VERSION,
            run_id,
            generated_at,
            events,
        }
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a log document.
    ///
    /// # Errors
    ///
    /// Returns `CaseWatchError::Serialization` for malformed JSON, an event
    /// with empty `details`, or an unsupported schema version.
    pub fn from_json(text: &str) -> Result<Self> {
        let log: EventLog = serde_json::from_str(text)?;
        if log.log_schema_version != LOG_SCHEMA_VERSION {
            return Err(CaseWatchError::Serialization {
                message: format!(
                    "unsupported log_schema_version {} (expected {})",
                    log.log_schema_version, LOG_SCHEMA_VERSION
                ),
            });
        }
        Ok(log)
    }
}
