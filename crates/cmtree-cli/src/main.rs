//! cmtree CLI
//!
//! Command-line interface for editing and committing configuration trees

use clap::{Parser, Subcommand};
use cmtree_core::logging_facility::{self, Profile};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "cmtree")]
#[command(about = "cmtree - Configuration tree editing and commit", long_about = None)]
struct Cli {
    /// Log output: dev (human-readable) or prod (JSON); RUST_LOG overrides the level
    #[arg(long, global = true, default_value = "dev")]
    log: Profile,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run a command script against a baseline and commit the result
    Run(commands::run::RunArgs),
    /// Compare two configuration documents
    Diff(commands::diff::DiffArgs),
    /// Apply a value formula
    Transcode(commands::transcode::TranscodeArgs),
}

fn main() {
    let cli = Cli::parse();
    logging_facility::init(cli.log);

    let result = match cli.command {
        Commands::Run(args) => commands::run::execute(args),
        Commands::Diff(args) => commands::diff::execute(args),
        Commands::Transcode(args) => commands::transcode::execute(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
