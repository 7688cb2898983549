//! CaseWatch CLI
//!
//! Command-line interface for CaseWatch

use casewatch_core::logging_facility;
use casewatch_engine::Settings;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "casewatch")]
#[command(about = "CaseWatch - Court case change detection", long_about = None)]
struct Cli {
    /// Configuration file (default: ./casewatch.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch every tracked record once and report what changed
    Run(commands::run::RunArgs),
    /// Rebuild reports from the persisted event log
    Report(commands::report::ReportArgs),
    /// Stop tracking a record
    Forget(commands::forget::ForgetArgs),
    /// Print the stored summary of a record
    Show(commands::show::ShowArgs),
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let settings = match Settings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    if let Ok(profile) = settings.profile() {
        logging_facility::init(profile);
    }

    let result = match cli.command {
        Commands::Run(args) => commands::run::execute(args, settings).await,
        Commands::Report(args) => commands::report::execute(args, &settings),
        Commands::Forget(args) => commands::forget::execute(args, &settings),
        Commands::Show(args) => commands::show::execute(args, &settings),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
