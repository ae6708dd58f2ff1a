//! Script run command

use std::fs;
use std::path::PathBuf;

use clap::Args;
use cmtree_core::document::DocumentHeader;
use cmtree_core::navigation::NoTemplates;
use cmtree_core::{
    commit, CommitRequest, DiffMode, FormulaCatalog, Session, SessionConfig, TemplateExpander,
    TranscodeMode,
};
use cmtree_store::{
    load_baseline, load_catalog, load_formula_catalog, load_rule_table, load_session_config,
    write_commit_output, DirTemplateExpander,
};

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Command script to execute
    #[arg(long)]
    pub script: PathBuf,

    /// Schema catalog (JSON)
    #[arg(long)]
    pub catalog: PathBuf,

    /// Rule table (JSON); without it no defaults are applied
    #[arg(long)]
    pub rules: Option<PathBuf>,

    /// Session configuration (YAML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory of template scripts
    #[arg(long)]
    pub templates: Option<PathBuf>,

    /// Baseline document to edit; required for coarse and fine commits
    #[arg(long)]
    pub baseline: Option<PathBuf>,

    /// Change-set mode: snapshot, coarse or fine
    #[arg(long, default_value = "snapshot")]
    pub mode: DiffMode,

    /// Formula catalog (JSON) used to translate committed values
    #[arg(long)]
    pub formulas: Option<PathBuf>,

    /// Translation direction: once, twice or reverse
    #[arg(long, default_value = "once")]
    pub transcode: TranscodeMode,

    /// Directory the document, script and summary are written to
    #[arg(long)]
    pub out_dir: PathBuf,

    /// File name stem of the outputs
    #[arg(long, default_value = "plan")]
    pub stem: String,

    /// Add a creation header to the document
    #[arg(long)]
    pub header: bool,

    /// Fail without writing anything if any script line failed
    #[arg(long)]
    pub strict: bool,
}

pub fn execute(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = load_catalog(&args.catalog)?;
    let rules = match &args.rules {
        Some(path) => load_rule_table(path)?,
        None => Default::default(),
    };
    let config = match &args.config {
        Some(path) => load_session_config(path)?,
        None => SessionConfig::default(),
    };
    let formulas: Option<FormulaCatalog> = match &args.formulas {
        Some(path) => Some(load_formula_catalog(path)?),
        None => None,
    };
    let dir_templates = args.templates.as_ref().map(DirTemplateExpander::new);
    let templates: &dyn TemplateExpander = match &dir_templates {
        Some(expander) => expander,
        None => &NoTemplates,
    };
    let script = fs::read_to_string(&args.script)
        .map_err(|e| format!("Failed to read script {}: {}", args.script.display(), e))?;

    let mut session = Session::new(&catalog, &rules, templates, config);
    if let Some(path) = &args.baseline {
        session.load_baseline(load_baseline(path)?);
    }

    let report = session.run_script(&script);
    for failure in &report.failures {
        eprintln!("failed {}", failure);
    }
    for diagnostic in session.diagnostics() {
        eprintln!("{}", diagnostic);
    }
    if args.strict && !report.is_clean() {
        return Err(format!("{} script line(s) failed", report.failures.len()).into());
    }

    let mut request = CommitRequest::new(args.mode);
    if let Some(formulas) = &formulas {
        request = request.with_translation(args.transcode, formulas);
    }
    if args.header {
        request = request.with_header(DocumentHeader::created_now());
    }
    let output = commit(&session, &request)?;
    for diagnostic in &output.diagnostics {
        eprintln!("{}", diagnostic);
    }

    let paths = write_commit_output(&args.out_dir, &args.stem, &output)?;

    println!("Committed {} change(s) ({} mode)", output.changeset.len(), args.mode);
    println!("  lines executed: {}", report.executed);
    println!("  lines failed: {}", report.failures.len());
    for line in &report.header {
        println!("  header: {}", line);
    }
    println!("  digest: {}", output.digest);
    println!("  document: {}", paths.document.display());
    println!("  script: {}", paths.script.display());
    println!("  summary: {}", paths.summary.display());

    Ok(())
}
