//! cmtree Core - in-memory configuration tree of a managed network element
//!
//! This crate provides the editing and commit kernel for cmtree, including:
//! - The configuration tree store with validate-then-apply mutations
//! - The navigation state machine driving edits from command lines
//! - Rulebook default-value application on object creation
//! - Snapshot, coarse and fine change-set computation
//! - Linear formula transcoding of parameter values
//! - Canonical document and command-script rendering
//!
//! File access lives in `cmtree-store`; this crate performs no I/O.

pub mod commit;
pub mod config;
pub mod diagnostics;
pub mod diff;
pub mod document;
pub mod errors;
pub mod formula;
pub mod logging_facility;
pub mod model;
pub mod navigation;
pub mod ops;
pub mod rulebook;
pub mod rules;
pub mod schema;

// Used by the exported logging macros
pub use cmtree_core_types;

// Re-export commonly used types
pub use commit::{commit, commit_trees, CommitOutput, CommitRequest, FormulaCatalog, FormulaEntry};
pub use config::SessionConfig;
pub use diagnostics::{Diagnostic, DiagnosticSource, Severity};
pub use diff::{compute_changeset, ChangeEntry, Changeset, DiffMode};
pub use errors::{CmError, ExError, ExErrorKind, Result};
pub use formula::{FormulaSpec, TranscodeMode, Transcoded};
pub use model::{DistName, ListValue, ManagedObject, OperationTag};
pub use navigation::{Command, RunReport, Session, Step, TemplateExpander};
pub use ops::ConfigTree;
pub use rulebook::RuleTable;
pub use schema::{SchemaCatalog, StaticCatalog};
