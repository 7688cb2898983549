//! Persisted machine-readable change log.

use crate::atomic::atomic_write;
use crate::errors::{io_error, persistence_error, serialization_error, Result};
use casewatch_core::errors::ExError;
use casewatch_core::EventLog;
use std::fs;
use std::path::Path;

/// Replace the event log at `path` with `log`.
pub fn write_event_log(path: &Path, log: &EventLog) -> Result<()> {
    let json = log
        .to_json_pretty()
        .map_err(|e| ExError::from(e).with_op("write_event_log"))?;
    atomic_write(path, json.as_bytes()).map_err(|e| persistence_error("write_event_log", e))?;
    tracing::debug!(
        path = %path.display(),
        event_count = log.events.len(),
        "event log written"
    );
    Ok(())
}

/// Load the event log at `path`.
///
/// # Errors
///
/// - `NotFound` when no log has been written yet
/// - `Serialization` for a malformed document
pub fn read_event_log(path: &Path) -> Result<EventLog> {
    let text = fs::read_to_string(path).map_err(|e| io_error("read_event_log", e))?;
    EventLog::from_json(&text).map_err(|e| serialization_error("read_event_log", e))
}
