//! cmtree Store - file-backed collaborators of the editing kernel
//!
//! Provides:
//! - Schema catalog, rule table and formula catalog loaders (JSON)
//! - Session configuration loader (YAML)
//! - Baseline loader for the canonical XML document
//! - A directory-backed template expander
//! - Atomic writers for commit outputs

pub mod baseline;
pub mod catalog;
pub mod config;
pub mod errors;
pub mod formulas;
pub mod output;
pub mod rules;
pub mod templates;

// Re-export key types
pub use baseline::load_baseline;
pub use catalog::load_catalog;
pub use config::load_session_config;
pub use errors::Result;
pub use formulas::load_formula_catalog;
pub use output::{write_commit_output, OutputPaths};
pub use rules::load_rule_table;
pub use templates::DirTemplateExpander;
