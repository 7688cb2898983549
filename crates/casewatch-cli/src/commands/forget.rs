//! Forget command
//!
//! Usage: casewatch forget <IDENTITY> [--state <FILE>]

use casewatch_core::RecordId;
use casewatch_engine::Settings;
use casewatch_store::{JsonStateStore, StateStore};
use clap::Args;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ForgetArgs {
    /// Record identity (URL or file path)
    pub identity: String,

    /// State file path
    #[arg(long)]
    pub state: Option<PathBuf>,
}

/// Execute forget command
pub fn execute(args: ForgetArgs, settings: &Settings) -> anyhow::Result<()> {
    let record_id = RecordId::new(args.identity)?;
    let path = args.state.unwrap_or_else(|| settings.state_path.clone());
    let store = JsonStateStore::new(path);

    if store.forget(&record_id)? {
        println!("✓ Forgot {}", record_id);
    } else {
        println!("{} was not tracked", record_id);
    }
    Ok(())
}
