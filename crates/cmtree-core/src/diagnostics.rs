//! Non-fatal findings collected during a session
//!
//! Rulebook misses, template misses, translation fallbacks and advisory
//! checks degrade gracefully; each leaves a [`Diagnostic`] behind instead of
//! failing the operation that produced it.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Subsystem that produced a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticSource {
    Navigation,
    Rulebook,
    Template,
    Translation,
    RequiredParameters,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub source: DiagnosticSource,
    pub dist_name: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(severity: Severity, source: DiagnosticSource, message: impl Into<String>) -> Self {
        Self {
            severity,
            source,
            dist_name: None,
            message: message.into(),
        }
    }

    pub fn warning(source: DiagnosticSource, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, source, message)
    }

    pub fn info(source: DiagnosticSource, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, source, message)
    }

    pub fn at(mut self, dist_name: impl ToString) -> Self {
        self.dist_name = Some(dist_name.to_string());
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}/{:?}]", self.severity, self.source)?;
        if let Some(dn) = &self.dist_name {
            write!(f, " {}:", dn)?;
        }
        write!(f, " {}", self.message)
    }
}
