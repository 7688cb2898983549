//! CaseWatch Core - change detection for tracked court-case records
//!
//! This crate is pure (no network, no disk) and provides:
//! - The snapshot model: records, core fields, sections, persisted summaries
//! - Content fingerprints for cheap "did anything change" checks
//! - A line differ over visible text
//! - The change detector producing typed change events
//! - Summary and detailed reports built from events alone
//! - The error and logging facilities shared by the other crates

pub mod diff;
pub mod digest;
pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod report;
pub mod sink;

// Used by the logging macros.
pub use casewatch_core_types;

// Re-export commonly used types
pub use diff::ChangeDetector;
pub use errors::{CaseWatchError, ExError, ExErrorKind, Result};
pub use model::{
    summarize, ChangeEvent, ChangeKind, ChangePayload, CoreFields, Details, FieldName,
    Fingerprint, RecordId, Section, SectionId, Snapshot, SnapshotSummary,
};
pub use report::{EventLog, Summary};
pub use sink::{MemorySink, Notice, NoticeLevel, ReportSink, TracingSink};
