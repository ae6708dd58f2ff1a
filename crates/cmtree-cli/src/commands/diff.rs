//! Document comparison command

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use cmtree_core::schema::SchemaCatalog;
use cmtree_core::{commit_trees, CommitRequest, DiffMode};
use cmtree_store::{load_baseline, load_catalog};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DiffFormat {
    /// Markdown summary of the change-set
    Summary,
    /// Replayable command script
    Script,
    /// Canonical change document
    Xml,
}

#[derive(Debug, Args)]
pub struct DiffArgs {
    /// Reference document
    #[arg(long)]
    pub baseline: PathBuf,

    /// Document to compare against the reference
    #[arg(long)]
    pub current: PathBuf,

    /// Schema catalog (JSON); enables the required-parameter check
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Change-set mode: coarse or fine
    #[arg(long, default_value = "fine")]
    pub mode: DiffMode,

    #[arg(long, value_enum, default_value = "summary")]
    pub format: DiffFormat,
}

pub fn execute(args: DiffArgs) -> Result<(), Box<dyn std::error::Error>> {
    let reference = load_baseline(&args.baseline)?;
    let current = load_baseline(&args.current)?;
    let catalog = args.catalog.as_deref().map(load_catalog).transpose()?;

    let request = CommitRequest::new(args.mode);
    let output = commit_trees(
        &current,
        Some(&reference),
        catalog.as_ref().map(|c| c as &dyn SchemaCatalog),
        &request,
    )?;
    for warning in &output.warnings {
        eprintln!("warning: {}", warning);
    }

    match args.format {
        DiffFormat::Summary => print!("{}", output.summary),
        DiffFormat::Script => print!("{}", output.script),
        DiffFormat::Xml => print!("{}", output.document),
    }
    Ok(())
}
