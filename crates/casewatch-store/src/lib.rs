//! CaseWatch Store - persistence for record summaries and change logs
//!
//! Provides:
//! - The `StateStore` contract and its JSON file implementation
//! - Atomic temp→rename writes so a crash never leaves a partial file
//! - The persisted event log used to rebuild reports
//! - The record-list loader

pub mod atomic;
pub mod errors;
pub mod event_log;
pub mod record_list;
pub mod state;

// Re-export key types
pub use errors::Result;
pub use event_log::{read_event_log, write_event_log};
pub use record_list::load_record_list;
pub use state::{JsonStateStore, StateMap, StateStore};
