//! Commit pipeline
//!
//! `commit` derives the change-set for the requested mode, optionally
//! translates its values, runs the advisory required-parameter pass, and
//! renders the document, its digest, the equivalent script, and a summary.
//!
//! Only change-set classification can fail a commit. Translation failures
//! and missing required parameters are reported alongside the output.

pub mod translate;

use std::time::Instant;

use crate::diagnostics::{Diagnostic, DiagnosticSource};
use crate::diff::{compute_changeset, render_summary, Changeset, DiffMode};
use crate::document::{document_digest, render_changeset, render_script, DocumentHeader};
use crate::errors::Result;
use crate::formula::TranscodeMode;
use crate::navigation::Session;
use crate::ops::ConfigTree;
use crate::rules::{find_missing_required, MissingRequired};
use crate::schema::SchemaCatalog;
use crate::{log_op_end, log_op_error, log_op_start};

pub use translate::{translate_changeset, FormulaCatalog, FormulaEntry};

/// Value translation applied to a change-set before rendering
#[derive(Debug, Clone, Copy)]
pub struct Translation<'c> {
    pub mode: TranscodeMode,
    pub catalog: &'c FormulaCatalog,
}

#[derive(Debug, Clone)]
pub struct CommitRequest<'c> {
    pub mode: DiffMode,
    pub translation: Option<Translation<'c>>,
    pub header: Option<DocumentHeader>,
}

impl<'c> CommitRequest<'c> {
    pub fn new(mode: DiffMode) -> Self {
        Self {
            mode,
            translation: None,
            header: None,
        }
    }

    pub fn with_translation(mut self, mode: TranscodeMode, catalog: &'c FormulaCatalog) -> Self {
        self.translation = Some(Translation { mode, catalog });
        self
    }

    pub fn with_header(mut self, header: DocumentHeader) -> Self {
        self.header = Some(header);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommitOutput {
    pub changeset: Changeset,
    pub document: String,
    /// Hex SHA-256 of `document`
    pub digest: String,
    pub script: String,
    pub summary: String,
    /// Advisory only; never blocks the commit
    pub warnings: Vec<MissingRequired>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Commit the session's tree against its reference
///
/// # Errors
///
/// See [`commit_trees`].
pub fn commit(session: &Session<'_>, request: &CommitRequest<'_>) -> Result<CommitOutput> {
    commit_trees(
        session.tree(),
        session.reference(),
        Some(session.catalog()),
        request,
    )
}

/// Commit `current` against an optional `reference`
///
/// The required-parameter pass runs only when a catalog is supplied.
///
/// # Errors
///
/// - `MissingReference` for coarse and fine modes without a reference
/// - `Diff` when an object cannot be classified
/// - `Document` when rendering fails
pub fn commit_trees(
    current: &ConfigTree,
    reference: Option<&ConfigTree>,
    catalog: Option<&dyn SchemaCatalog>,
    request: &CommitRequest<'_>,
) -> Result<CommitOutput> {
    log_op_start!("commit", mode = request.mode.as_str());
    let start = Instant::now();

    let result = commit_impl(current, reference, catalog, request);
    match &result {
        Ok(output) => log_op_end!(
            "commit",
            duration_ms = start.elapsed().as_millis() as u64,
            change_count = output.changeset.len(),
            digest = output.digest.as_str()
        ),
        Err(e) => log_op_error!(
            "commit",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64
        ),
    }
    result
}

fn commit_impl(
    current: &ConfigTree,
    reference: Option<&ConfigTree>,
    catalog: Option<&dyn SchemaCatalog>,
    request: &CommitRequest<'_>,
) -> Result<CommitOutput> {
    let mut changeset = compute_changeset(request.mode, current, reference)?;
    let mut diagnostics = Vec::new();

    if let Some(translation) = request.translation {
        let (translated, found) =
            translate_changeset(&changeset, translation.catalog, translation.mode);
        changeset = translated;
        diagnostics.extend(found);
    }

    let warnings = catalog
        .map(|catalog| find_missing_required(current, catalog))
        .unwrap_or_default();
    for warning in &warnings {
        tracing::warn!(
            dist_name = %warning.dist_name,
            class = %warning.class,
            missing = %warning.parameters.join(","),
            "required parameters missing"
        );
        diagnostics.push(
            Diagnostic::warning(DiagnosticSource::RequiredParameters, warning.to_string())
                .at(&warning.dist_name),
        );
    }

    let document = render_changeset(&changeset, request.header.as_ref())?;
    let digest = document_digest(&document);
    let script = render_script(&changeset);
    let summary = render_summary(&changeset);

    Ok(CommitOutput {
        changeset,
        document,
        digest,
        script,
        summary,
        warnings,
        diagnostics,
    })
}
