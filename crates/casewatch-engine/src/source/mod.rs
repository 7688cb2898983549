//! Snapshot sources: where a record's current content comes from.
//!
//! A source turns a record identity into a parsed [`Snapshot`]. Failures are
//! per record; the run loop skips detection for that record and leaves its
//! stored summary alone.

pub mod extract;
pub mod file;
pub mod http;

use async_trait::async_trait;
use casewatch_core::errors::ExError;
use casewatch_core::{RecordId, Snapshot};

pub use extract::extract_case_page;
pub use file::FileSource;
pub use http::HttpSource;

#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Fetch and extract the current snapshot of `record_id`.
    ///
    /// # Errors
    ///
    /// - `Fetch` / `Timeout` when retrieval fails
    /// - `Extraction` when the document lacks the expected structure
    async fn fetch(&self, record_id: &RecordId) -> Result<Snapshot, ExError>;
}

/// Routes local identities (paths, `file://` URLs) to the file source and
/// everything else to HTTP.
pub struct RoutingSource {
    http: HttpSource,
    file: FileSource,
}

impl RoutingSource {
    pub fn new(http: HttpSource, file: FileSource) -> Self {
        Self { http, file }
    }
}

#[async_trait]
impl SnapshotSource for RoutingSource {
    async fn fetch(&self, record_id: &RecordId) -> Result<Snapshot, ExError> {
        if FileSource::accepts(record_id) {
            self.file.fetch(record_id).await
        } else {
            self.http.fetch(record_id).await
        }
    }
}
