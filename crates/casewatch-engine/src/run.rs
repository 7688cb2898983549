//! Run orchestration.
//!
//! ## Pipeline
//! 1. Bulk-load the previous state (unreadable state degrades to empty)
//! 2. Process records on a bounded pool: fetch, detect, summarize
//! 3. Collect per-record results into one shared, index-keyed map
//! 4. Merge completed summaries into the state and `save_all` once
//! 5. Write the event log
//!
//! Cancellation stops new records from starting. In-flight records finish
//! and step 4 still runs with whatever completed.
//!
//! ## Logging
//! `run_records` owns boundary logging (`log_op_start!` / `log_op_end!` /
//! `log_op_error!`). Per-record diagnostics run inside a `record` span
//! carrying `run_id` and `record_id`.

use crate::source::SnapshotSource;
use casewatch_core::errors::{ExError, ExErrorKind};
use casewatch_core::report::EventLog;
use casewatch_core::{
    log_op_end, log_op_error, log_op_start, summarize, ChangeDetector, ChangeEvent, Notice,
    RecordId, ReportSink, SnapshotSummary,
};
use casewatch_core_types::RunId;
use casewatch_store::{write_event_log, StateMap, StateStore};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Options for one run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Maximum records in flight (values below 1 are treated as 1)
    pub concurrency: usize,
    /// Where to write the machine-readable event log, if anywhere
    pub event_log_path: Option<PathBuf>,
    pub run_id: RunId,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            concurrency: 4,
            event_log_path: None,
            run_id: RunId::new(),
        }
    }
}

impl RunOptions {
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_event_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.event_log_path = Some(path.into());
        self
    }

    pub fn with_run_id(mut self, run_id: RunId) -> Self {
        self.run_id = run_id;
        self
    }
}

/// What happened to one record in a run.
#[derive(Debug, Clone)]
pub enum RecordOutcome {
    /// No previous summary; one `new_record` event
    New,
    Changed,
    Unchanged,
    /// Fetch or extraction failed; stored summary untouched
    Failed(ExError),
    /// The run was cancelled before this record started
    NotStarted,
}

impl RecordOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            RecordOutcome::New => "new",
            RecordOutcome::Changed => "changed",
            RecordOutcome::Unchanged => "unchanged",
            RecordOutcome::Failed(_) => "failed",
            RecordOutcome::NotStarted => "not_started",
        }
    }
}

/// Result of [`run_records`]. Renderable even when the state write failed.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: RunId,
    pub generated_at: DateTime<Utc>,
    /// One entry per input record, in input order
    pub outcomes: Vec<(RecordId, RecordOutcome)>,
    /// All events, grouped by record in input order
    pub events: Vec<ChangeEvent>,
    /// The state write failed; the previous state file is intact
    pub persist_error: Option<ExError>,
    /// The event log write failed (not a run-level error)
    pub event_log_error: Option<ExError>,
}

impl RunReport {
    fn count(&self, predicate: impl Fn(&RecordOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| predicate(o)).count()
    }

    /// Records that were started (everything but `NotStarted`).
    pub fn processed(&self) -> usize {
        self.count(|o| !matches!(o, RecordOutcome::NotStarted))
    }

    /// Records with at least one event (`New` or `Changed`).
    pub fn changed(&self) -> usize {
        self.count(|o| matches!(o, RecordOutcome::New | RecordOutcome::Changed))
    }

    pub fn errors(&self) -> usize {
        self.count(|o| matches!(o, RecordOutcome::Failed(_)))
    }

    pub fn not_started(&self) -> usize {
        self.count(|o| matches!(o, RecordOutcome::NotStarted))
    }

    pub fn outcome_of(&self, record_id: &RecordId) -> Option<&RecordOutcome> {
        self.outcomes
            .iter()
            .find(|(id, _)| id == record_id)
            .map(|(_, o)| o)
    }

    /// `processed N records: C changed, E errors`, plus the skipped count
    /// when the run was cancelled.
    pub fn summary_line(&self) -> String {
        let mut line = format!(
            "processed {} records: {} changed, {} errors",
            self.processed(),
            self.changed(),
            self.errors()
        );
        let skipped = self.not_started();
        if skipped > 0 {
            line.push_str(&format!(", {} skipped (cancelled)", skipped));
        }
        line
    }

    pub fn event_log(&self) -> EventLog {
        EventLog::new(self.run_id.clone(), self.generated_at, self.events.clone())
    }
}

/// Per-record result written by a worker.
struct RecordResult {
    outcome: RecordOutcome,
    events: Vec<ChangeEvent>,
    summary: Option<SnapshotSummary>,
}

type Slots = Arc<Mutex<BTreeMap<usize, RecordResult>>>;

/// Process `ids` once against `source` and `store`.
///
/// Record-level failures never abort the run. The only run-level failure is
/// a state write error, reported in [`RunReport::persist_error`].
pub async fn run_records(
    ids: Vec<RecordId>,
    source: Arc<dyn SnapshotSource>,
    store: Arc<dyn StateStore>,
    options: RunOptions,
    cancel: CancellationToken,
    sink: Arc<dyn ReportSink>,
) -> RunReport {
    let run_id = options.run_id.clone();
    log_op_start!("run_records", run_id = %run_id, record_count = ids.len());
    let start = Instant::now();

    let previous = Arc::new(load_previous(&store).await);
    let detector = Arc::new(ChangeDetector::new(sink.clone()));
    let slots: Slots = Arc::new(Mutex::new(BTreeMap::new()));
    let semaphore = Arc::new(Semaphore::new(options.concurrency.max(1)));
    let mut workers = JoinSet::new();
    let mut started = 0usize;

    for (index, record_id) in ids.iter().enumerate() {
        if cancel.is_cancelled() {
            break;
        }
        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            permit = semaphore.clone().acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
        };
        // Cancellation may have landed while the permit was pending.
        if cancel.is_cancelled() {
            break;
        }
        started += 1;

        let record_id = record_id.clone();
        let source = source.clone();
        let previous = previous.clone();
        let detector = detector.clone();
        let sink = sink.clone();
        let slots = slots.clone();
        let span = tracing::info_span!("record", run_id = %run_id, record_id = %record_id);

        workers.spawn(
            async move {
                let _permit = permit;
                let result = process_record(
                    &record_id,
                    source.as_ref(),
                    previous.get(&record_id),
                    &detector,
                    sink.as_ref(),
                )
                .await;
                lock(&slots).insert(index, result);
            }
            .instrument(span),
        );
    }

    while let Some(joined) = workers.join_next().await {
        if let Err(err) = joined {
            tracing::error!(run_id = %run_id, error = %err, "record worker did not complete");
        }
    }

    if started < ids.len() {
        sink.on_notice(&Notice::warn(
            None,
            format!(
                "run cancelled: {} of {} records not started",
                ids.len() - started,
                ids.len()
            ),
        ));
    }

    let mut results = std::mem::take(&mut *lock(&slots));
    let mut state: StateMap = previous.as_ref().clone();
    let mut outcomes = Vec::with_capacity(ids.len());
    let mut events = Vec::new();

    for (index, record_id) in ids.into_iter().enumerate() {
        let outcome = match results.remove(&index) {
            Some(result) => {
                if let Some(summary) = result.summary {
                    state.insert(record_id.clone(), summary);
                }
                events.extend(result.events);
                result.outcome
            }
            None if index < started => RecordOutcome::Failed(
                ExError::new(ExErrorKind::Internal)
                    .with_op("run_records")
                    .with_record_id(record_id.as_str())
                    .with_message("record worker did not complete"),
            ),
            None => RecordOutcome::NotStarted,
        };
        outcomes.push((record_id, outcome));
    }

    let persist_error = persist_state(store, state).await.err();
    if let Some(err) = &persist_error {
        sink.on_notice(&Notice::warn(None, format!("state not saved: {}", err)));
    }

    let mut report = RunReport {
        run_id: run_id.clone(),
        generated_at: Utc::now(),
        outcomes,
        events,
        persist_error,
        event_log_error: None,
    };

    if let Some(path) = options.event_log_path {
        report.event_log_error = persist_event_log(path, report.event_log()).await.err();
        if let Some(err) = &report.event_log_error {
            tracing::warn!(run_id = %run_id, error = %err, "event log not written");
            sink.on_notice(&Notice::warn(None, format!("event log not written: {}", err)));
        }
    }

    let duration_ms = start.elapsed().as_millis() as u64;
    match &report.persist_error {
        Some(err) => {
            log_op_error!(
                "run_records",
                err.clone(),
                duration_ms = duration_ms,
                run_id = %run_id
            );
        }
        None => {
            log_op_end!(
                "run_records",
                duration_ms = duration_ms,
                run_id = %run_id,
                processed = report.processed(),
                changed = report.changed(),
                errors = report.errors()
            );
        }
    }
    sink.on_notice(&Notice::info(None, report.summary_line()));
    report
}

async fn process_record(
    record_id: &RecordId,
    source: &dyn SnapshotSource,
    previous: Option<&SnapshotSummary>,
    detector: &ChangeDetector,
    sink: &dyn ReportSink,
) -> RecordResult {
    let snapshot = match source.fetch(record_id).await {
        Ok(snapshot) => snapshot,
        Err(err) => {
            let err = if err.record_id().is_some() {
                err
            } else {
                err.with_record_id(record_id.as_str())
            };
            tracing::warn!(err.code = err.code(), error = %err, "snapshot unavailable, record skipped");
            sink.on_notice(&Notice::warn(Some(record_id), format!("skipped: {}", err)));
            return RecordResult {
                outcome: RecordOutcome::Failed(err),
                events: Vec::new(),
                summary: None,
            };
        }
    };

    let events = detector.detect(record_id, previous, &snapshot);
    for event in &events {
        sink.on_event(event);
    }

    let outcome = match (previous, events.is_empty()) {
        (None, _) => RecordOutcome::New,
        (Some(_), true) => RecordOutcome::Unchanged,
        (Some(_), false) => RecordOutcome::Changed,
    };
    tracing::debug!(outcome = outcome.label(), event_count = events.len(), "record processed");

    RecordResult {
        outcome,
        events,
        summary: Some(summarize(record_id, &snapshot)),
    }
}

async fn load_previous(store: &Arc<dyn StateStore>) -> StateMap {
    let store = store.clone();
    match tokio::task::spawn_blocking(move || store.load_all()).await {
        Ok(state) => state,
        Err(err) => {
            tracing::error!(error = %err, "state load task failed, starting from empty state");
            StateMap::new()
        }
    }
}

async fn persist_state(store: Arc<dyn StateStore>, state: StateMap) -> Result<(), ExError> {
    tokio::task::spawn_blocking(move || store.save_all(&state))
        .await
        .map_err(join_error)?
}

async fn persist_event_log(path: PathBuf, log: EventLog) -> Result<(), ExError> {
    tokio::task::spawn_blocking(move || write_event_log(&path, &log))
        .await
        .map_err(join_error)?
}

fn join_error(err: tokio::task::JoinError) -> ExError {
    ExError::new(ExErrorKind::Internal)
        .with_op("spawn_blocking")
        .with_message(err.to_string())
}

// Workers only insert into the map, so a poisoned lock still holds whole entries.
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
