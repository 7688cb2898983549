//! Error handling for casewatch-store
//!
//! Wraps casewatch-core ExError with store-specific helpers

use casewatch_core::errors::{ExError, ExErrorKind};
use std::path::Path;

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create an IO error
pub fn io_error(operation: &str, err: std::io::Error) -> ExError {
    let kind = if err.kind() == std::io::ErrorKind::NotFound {
        ExErrorKind::NotFound
    } else {
        ExErrorKind::Io
    };
    ExError::new(kind)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}

/// Create a state-corruption error for a file that exists but cannot be decoded
pub fn state_corrupt(path: &Path, reason: impl std::fmt::Display) -> ExError {
    ExError::new(ExErrorKind::StateCorrupt)
        .with_op("load_state")
        .with_message(format!("{}: {}", path.display(), reason))
}

/// Create a persistence error for a failed state or log write
pub fn persistence_error(operation: &str, source: ExError) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op(operation.to_string())
        .with_message("write did not complete; previous file left untouched")
        .with_source(source)
}

/// Create a serialization error
pub fn serialization_error(operation: &str, err: impl std::fmt::Display) -> ExError {
    ExError::new(ExErrorKind::Serialization)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}

/// Create a record-list validation error
pub fn record_list_error(reason: &str) -> ExError {
    ExError::new(ExErrorKind::InvalidInput)
        .with_op("load_record_list")
        .with_message(reason.to_string())
}
