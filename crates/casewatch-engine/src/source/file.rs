//! Local documents as a snapshot source (offline mode and tests).

use super::extract::extract_case_page;
use super::SnapshotSource;
use async_trait::async_trait;
use casewatch_core::errors::{ExError, ExErrorKind};
use casewatch_core::{RecordId, Snapshot};
use chrono::Utc;
use std::path::PathBuf;

/// Reads records whose identity is a filesystem path or a `file://` URL.
#[derive(Debug, Clone, Default)]
pub struct FileSource {
    /// Base directory for relative paths
    root: Option<PathBuf>,
}

impl FileSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    /// Whether `record_id` names a local document.
    pub fn accepts(record_id: &RecordId) -> bool {
        let id = record_id.as_str();
        id.starts_with("file://") || !id.contains("://")
    }

    fn path_for(&self, record_id: &RecordId) -> PathBuf {
        let id = record_id.as_str();
        let path = PathBuf::from(id.strip_prefix("file://").unwrap_or(id));
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path,
        }
    }
}

#[async_trait]
impl SnapshotSource for FileSource {
    async fn fetch(&self, record_id: &RecordId) -> Result<Snapshot, ExError> {
        if !Self::accepts(record_id) {
            return Err(ExError::new(ExErrorKind::InvalidInput)
                .with_op("file_fetch")
                .with_record_id(record_id.as_str())
                .with_message("not a local path or file:// URL"));
        }

        let path = self.path_for(record_id);
        let html = tokio::fs::read_to_string(&path).await.map_err(|e| {
            ExError::new(ExErrorKind::Fetch)
                .with_op("file_fetch")
                .with_record_id(record_id.as_str())
                .with_message(format!("{}: {}", path.display(), e))
        })?;

        extract_case_page(&html, record_id.as_str(), Utc::now())
            .map_err(|e| e.with_record_id(record_id.as_str()))
    }
}
