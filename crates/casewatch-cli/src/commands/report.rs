//! Report command
//!
//! Usage: casewatch report [--events <FILE>] [--json]

use casewatch_engine::Settings;
use casewatch_store::read_event_log;
use clap::Args;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Event log path
    #[arg(long)]
    pub events: Option<PathBuf>,

    /// Print the event log as JSON instead of Markdown
    #[arg(long)]
    pub json: bool,
}

/// Execute report command
pub fn execute(args: ReportArgs, settings: &Settings) -> anyhow::Result<()> {
    let path = args.events.unwrap_or_else(|| settings.event_log_path.clone());
    let log = read_event_log(&path)?;

    if args.json {
        println!("{}", log.to_json_pretty()?);
    } else {
        println!("_Run {} at {}_\n", log.run_id, log.generated_at.to_rfc3339());
        print!("{}", super::render_markdown(&log.events));
    }
    Ok(())
}
