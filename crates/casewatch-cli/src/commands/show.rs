//! Show command
//!
//! Usage: casewatch show <IDENTITY> [--state <FILE>]

use casewatch_core::RecordId;
use casewatch_engine::Settings;
use casewatch_store::{JsonStateStore, StateStore};
use clap::Args;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Record identity (URL or file path)
    pub identity: String,

    /// State file path
    #[arg(long)]
    pub state: Option<PathBuf>,
}

/// Execute show command
pub fn execute(args: ShowArgs, settings: &Settings) -> anyhow::Result<()> {
    let record_id = RecordId::new(args.identity)?;
    let path = args.state.unwrap_or_else(|| settings.state_path.clone());
    let mut state = JsonStateStore::new(path).try_load_all()?;

    match state.remove(&record_id) {
        Some(summary) => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
        None => anyhow::bail!("{} is not tracked", record_id),
    }
}
