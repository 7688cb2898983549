//! Run command
//!
//! Usage: casewatch run [--records <FILE>] [--state <FILE>] [--events <FILE>]
//!        [--concurrency <N>] [--offline] [--json]

use casewatch_core::TracingSink;
use casewatch_engine::{
    run_records, FileSource, HttpSource, RoutingSource, RunOptions, Settings, SnapshotSource,
};
use casewatch_store::{load_record_list, JsonStateStore};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Record list (one identity per line, or a YAML sequence)
    #[arg(long)]
    pub records: Option<PathBuf>,

    /// State file path
    #[arg(long)]
    pub state: Option<PathBuf>,

    /// Event log path
    #[arg(long)]
    pub events: Option<PathBuf>,

    /// Maximum records fetched at once
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Only read local files; never touch the network
    #[arg(long)]
    pub offline: bool,

    /// Print the event log as JSON instead of Markdown
    #[arg(long)]
    pub json: bool,
}

impl RunArgs {
    fn apply(&self, mut settings: Settings) -> Settings {
        if let Some(path) = &self.records {
            settings.records_path = path.clone();
        }
        if let Some(path) = &self.state {
            settings.state_path = path.clone();
        }
        if let Some(path) = &self.events {
            settings.event_log_path = path.clone();
        }
        if let Some(n) = self.concurrency {
            settings.concurrency = n;
        }
        settings
    }
}

/// Execute run command
pub async fn execute(args: RunArgs, settings: Settings) -> anyhow::Result<()> {
    let settings = args.apply(settings);
    settings.validate()?;

    let ids = load_record_list(&settings.records_path)?;
    tracing::info!(
        records = ids.len(),
        path = %settings.records_path.display(),
        "loaded record list"
    );

    let source: Arc<dyn SnapshotSource> = if args.offline {
        Arc::new(FileSource::new())
    } else {
        Arc::new(RoutingSource::new(
            HttpSource::new(&settings.http)?,
            FileSource::new(),
        ))
    };
    let store = Arc::new(JsonStateStore::new(&settings.state_path));

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, finishing records in flight");
            on_signal.cancel();
        }
    });

    let options = RunOptions::default()
        .with_concurrency(settings.concurrency)
        .with_event_log(&settings.event_log_path);
    let report = run_records(
        ids,
        source,
        store,
        options,
        cancel,
        Arc::new(TracingSink),
    )
    .await;

    if args.json {
        println!("{}", report.event_log().to_json_pretty()?);
    } else {
        print!("{}", super::render_markdown(&report.events));
    }
    eprintln!("{}", report.summary_line());

    if let Some(err) = &report.event_log_error {
        eprintln!("Warning: event log not written: {}", err);
    }
    if let Some(err) = report.persist_error {
        return Err(anyhow::Error::new(err).context("state was not saved"));
    }
    Ok(())
}
