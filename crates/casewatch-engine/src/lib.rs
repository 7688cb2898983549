//! CaseWatch Engine - Orchestration layer
//!
//! Coordinates the pure change detector with its collaborators: snapshot
//! sources (HTTP, local files), the state store, and the event log.

pub mod config;
pub mod run;
pub mod source;

pub use config::{HttpSettings, Settings};
pub use run::{run_records, RecordOutcome, RunOptions, RunReport};
pub use source::{FileSource, HttpSource, RoutingSource, SnapshotSource};
