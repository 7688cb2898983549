//! Reports derived from a sequence of change events.
//!
//! Every builder here is a pure function of the events, so a report can be
//! rebuilt at any time from the persisted [`EventLog`].

pub mod detailed;
pub mod event_log;
pub mod summary;

pub use detailed::{build_detailed, render_detailed, DetailedReport, RecordSection};
pub use event_log::{EventLog, LOG_SCHEMA_VERSION};
pub use summary::{build_summary, render_summary, Summary};
