//! Snapshot model
//!
//! Data definitions only: records, snapshots, persisted summaries and the
//! change events emitted when two of them differ.

pub mod event;
pub mod fields;
pub mod record;
pub mod snapshot;
pub mod summary;

pub use event::{ChangeEvent, ChangeKind, ChangePayload, Details, FieldChange, LineChange, LineTag};
pub use fields::{CoreFields, FieldName};
pub use record::RecordId;
pub use snapshot::{Section, SectionEntry, SectionId, Sections, Snapshot};
pub use summary::{summarize, Fingerprint, SnapshotSummary};
