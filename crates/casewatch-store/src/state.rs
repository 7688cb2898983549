//! Durable per-record summaries.
//!
//! The whole state lives in one JSON document that is replaced atomically on
//! every save:
//!
//! ```json
//! { "state_schema_version": 1, "records": { "<record id>": { ...summary... } } }
//! ```

use crate::atomic::atomic_write;
use crate::errors::{io_error, persistence_error, serialization_error, state_corrupt, Result};
use casewatch_core::errors::ExErrorKind;
use casewatch_core::{RecordId, SnapshotSummary};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const STATE_SCHEMA_VERSION: u32 = 1;

/// Mapping of record identity to its latest summary.
pub type StateMap = BTreeMap<RecordId, SnapshotSummary>;

/// Persistence contract for record summaries.
pub trait StateStore: Send + Sync {
    /// Summary for one record; `None` for an unseen record or unreadable state.
    fn load(&self, record_id: &RecordId) -> Option<SnapshotSummary> {
        self.load_all().remove(record_id)
    }

    /// Bulk load. Never fails: an unreadable state degrades to empty.
    fn load_all(&self) -> StateMap {
        match self.try_load_all() {
            Ok(state) => state,
            Err(err) => {
                tracing::warn!(error = %err, "state unreadable, starting from empty state");
                StateMap::new()
            }
        }
    }

    /// Bulk load that reports why the state could not be read.
    /// A missing state is not an error.
    fn try_load_all(&self) -> Result<StateMap>;

    /// Replace the entire persisted state in one atomic write.
    fn save_all(&self, state: &StateMap) -> Result<()>;

    /// Stop tracking one record. Returns whether it was tracked.
    fn forget(&self, record_id: &RecordId) -> Result<bool> {
        let mut state = self.try_load_all()?;
        let existed = state.remove(record_id).is_some();
        if existed {
            self.save_all(&state)?;
        }
        Ok(existed)
    }
}

#[derive(Debug, Deserialize)]
struct StateFile {
    state_schema_version: u32,
    records: StateMap,
}

#[derive(Serialize)]
struct StateFileRef<'a> {
    state_schema_version: u32,
    records: &'a StateMap,
}

/// JSON file backed state store.
#[derive(Debug, Clone)]
pub struct JsonStateStore {
    path: PathBuf,
}

impl JsonStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn decode(&self, text: &str) -> Result<StateMap> {
        let file: StateFile =
            serde_json::from_str(text).map_err(|e| state_corrupt(&self.path, e))?;
        if file.state_schema_version != STATE_SCHEMA_VERSION {
            return Err(state_corrupt(
                &self.path,
                format!(
                    "unsupported state_schema_version {} (expected {})",
                    file.state_schema_version, STATE_SCHEMA_VERSION
                ),
            ));
        }

        let mut records = file.records;
        for (id, summary) in records.iter_mut() {
            if &summary.record_id != id {
                tracing::warn!(
                    record_id = %id,
                    stored = %summary.record_id,
                    "summary keyed under a different identity, using key"
                );
                summary.record_id = id.clone();
            }
            let dropped = summary.repair();
            if dropped > 0 {
                tracing::warn!(record_id = %id, dropped, "dropped orphan section texts");
            }
        }
        Ok(records)
    }
}

impl StateStore for JsonStateStore {
    fn try_load_all(&self) -> Result<StateMap> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) => {
                let err = io_error("load_state", e);
                if err.kind() == ExErrorKind::NotFound {
                    tracing::debug!(path = %self.path.display(), "no state file yet");
                    return Ok(StateMap::new());
                }
                return Err(err);
            }
        };
        let state = self.decode(&text)?;
        tracing::debug!(path = %self.path.display(), record_count = state.len(), "state loaded");
        Ok(state)
    }

    fn save_all(&self, state: &StateMap) -> Result<()> {
        let file = StateFileRef {
            state_schema_version: STATE_SCHEMA_VERSION,
            records: state,
        };
        let json = serde_json::to_vec_pretty(&file).map_err(|e| serialization_error("save_all", e))?;
        atomic_write(&self.path, &json).map_err(|e| persistence_error("save_all", e))?;
        tracing::debug!(path = %self.path.display(), record_count = state.len(), "state saved");
        Ok(())
    }
}
