//! Per-run reporting sink.
//!
//! A sink is created for one run and handed explicitly to the detector and
//! the run loop. It receives every emitted change event plus operator-facing
//! notices (degraded comparisons, skipped records).

use crate::model::{ChangeEvent, RecordId};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warn,
}

/// An operator-facing message tied to a record (or to the run as a whole).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub record_id: Option<RecordId>,
    pub message: String,
}

impl Notice {
    pub fn info(record_id: Option<&RecordId>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            record_id: record_id.cloned(),
            message: message.into(),
        }
    }

    pub fn warn(record_id: Option<&RecordId>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warn,
            record_id: record_id.cloned(),
            message: message.into(),
        }
    }
}

/// Receiver for change events and notices during one run.
pub trait ReportSink: Send + Sync {
    fn on_event(&self, event: &ChangeEvent);

    fn on_notice(&self, notice: &Notice);
}

/// Forwards everything to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ReportSink for TracingSink {
    fn on_event(&self, event: &ChangeEvent) {
        tracing::info!(
            record_id = %event.record_id(),
            change_kind = event.kind().as_str(),
            "{}",
            event.message()
        );
    }

    fn on_notice(&self, notice: &Notice) {
        let record_id = notice
            .record_id
            .as_ref()
            .map(|r| r.as_str())
            .unwrap_or("-");
        match notice.level {
            NoticeLevel::Info => tracing::info!(record_id, "{}", notice.message),
            NoticeLevel::Warn => tracing::warn!(record_id, "{}", notice.message),
        }
    }
}

/// Collects events and notices in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<ChangeEvent>>,
    notices: Mutex<Vec<Notice>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ChangeEvent> {
        lock(&self.events).clone()
    }

    pub fn notices(&self) -> Vec<Notice> {
        lock(&self.notices).clone()
    }
}

impl ReportSink for MemorySink {
    fn on_event(&self, event: &ChangeEvent) {
        lock(&self.events).push(event.clone());
    }

    fn on_notice(&self, notice: &Notice) {
        lock(&self.notices).push(notice.clone());
    }
}

// A panicking writer cannot leave a Vec half-pushed, so poisoning is ignored.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
