use cmtree_core_types::SessionId;
use thiserror::Error;

use crate::formula::FormulaError;

/// Result type alias using CmError
pub type Result<T> = std::result::Result<T, CmError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Stable classification of every error the core can surface. Each kind maps
/// to a stable code usable by callers, tests and log pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Tree mutation
    SchemaViolation,
    RangeViolation,
    DuplicateObject,
    NotFound,
    InvalidInput,

    // Session
    Navigation,

    // Engines
    Formula,
    Diff,

    // Integration/IO
    Io,
    Serialization,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::SchemaViolation => "ERR_SCHEMA_VIOLATION",
            ExErrorKind::RangeViolation => "ERR_RANGE_VIOLATION",
            ExErrorKind::DuplicateObject => "ERR_DUPLICATE_OBJECT",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::Navigation => "ERR_NAVIGATION",
            ExErrorKind::Formula => "ERR_FORMULA",
            ExErrorKind::Diff => "ERR_DIFF",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries the classification plus whatever context was known at the point
/// of failure: the operation, the distinguished name and class involved, and
/// the session it happened in.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    dist_name: Option<String>,
    class: Option<String>,
    session_id: Option<SessionId>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            dist_name: None,
            class: None,
            session_id: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add distinguished-name context
    pub fn with_dist_name(mut self, dist_name: impl Into<String>) -> Self {
        self.dist_name = Some(dist_name.into());
        self
    }

    /// Add class context
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    /// Add session context
    pub fn with_session_id(mut self, session_id: SessionId) -> Self {
        self.session_id = Some(session_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn dist_name(&self) -> Option<&str> {
        self.dist_name.as_deref()
    }

    pub fn class(&self) -> Option<&str> {
        self.class.as_deref()
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(dist_name) = &self.dist_name {
            write!(f, " (distName: {})", dist_name)?;
        }
        if let Some(class) = &self.class {
            write!(f, " (class: {})", class)?;
        }
        if let Some(source) = &self.source {
            write!(f, " caused by {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Error taxonomy for configuration-tree operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CmError {
    // ===== Schema Errors =====
    /// Class is not a declared child of the parent class
    #[error("Class {class} is not an allowed child of {parent_class}")]
    ClassNotAllowed { class: String, parent_class: String },

    /// Class is not known to the schema catalog
    #[error("Unknown class: {class}")]
    UnknownClass { class: String },

    /// First frame of a session must be the root class
    #[error("Expected root class {root_class}, got {class}")]
    RootClassRequired { class: String, root_class: String },

    /// Parameter is not declared for the class
    #[error("Parameter {parameter} is not declared for class {class}")]
    UnknownParameter { class: String, parameter: String },

    /// A list-typed parameter was addressed as a scalar
    #[error("Parameter {parameter} of class {class} is a list")]
    NotAScalarParameter { class: String, parameter: String },

    /// Name is not a declared list for the class
    #[error("{list} is not a declared list of class {class}")]
    ListNotAllowed { class: String, list: String },

    /// Field is not declared for the list
    #[error("Field {field} is not declared for list {list} of class {class}")]
    UnknownListField {
        class: String,
        list: String,
        field: String,
    },

    /// Write would change a list between scalar and record shape
    #[error("List {list} of {dist_name} cannot change between scalar and record shape")]
    ListShapeMismatch { dist_name: String, list: String },

    /// List positions are 1-based integers
    #[error("Invalid list index: {index}")]
    InvalidListIndex { index: String },

    // ===== Range Errors =====
    /// Instance id outside the class's declared id domain
    #[error("Id {id} of class {class} is outside {range}")]
    IdOutOfRange {
        class: String,
        id: String,
        range: String,
    },

    /// Parameter value outside its declared domain
    #[error("Value {value} of {class}.{parameter} is outside {range}")]
    ValueOutOfRange {
        class: String,
        parameter: String,
        value: String,
        range: String,
    },

    // ===== Structural Errors =====
    /// An object already exists at the path
    #[error("Object already exists: {dist_name}")]
    DuplicateObject { dist_name: String },

    /// No object at the path
    #[error("Object not found: {dist_name}")]
    ObjectNotFound { dist_name: String },

    /// Parameter absent from the object
    #[error("Parameter {parameter} not present on {dist_name}")]
    ParameterNotFound { dist_name: String, parameter: String },

    /// List absent from the object
    #[error("List {list} not present on {dist_name}")]
    ListNotFound { dist_name: String, list: String },

    /// Parent path of a live object does not resolve
    #[error("Orphaned object {dist_name}: parent {parent} does not exist")]
    OrphanedObject { dist_name: String, parent: String },

    /// Malformed distinguished name
    #[error("Invalid distName '{input}': {reason}")]
    InvalidDistName { input: String, reason: String },

    // ===== Navigation Errors =====
    /// `exit` with nothing to leave
    #[error("Cannot exit: no active frame")]
    ExitPastRoot,

    /// Session already confirmed its end
    #[error("Session has ended")]
    SessionEnded,

    /// Operation needs a current object
    #[error("No current object: enter the root class first")]
    NoCurrentObject,

    /// Hard delete of the current position or one of its ancestors
    #[error("Cannot delete {dist_name}: it is the current position or an ancestor of {current}")]
    DeleteOfCurrentPosition { dist_name: String, current: String },

    /// Rename to the id the object already has
    #[error("{dist_name} already has id {id}")]
    SameId { dist_name: String, id: String },

    /// Line did not classify as any command
    #[error("Unrecognized command: {line}")]
    UnrecognizedCommand { line: String },

    // ===== Engine Errors =====
    /// Strict formula evaluation failure
    #[error("Formula error: {0}")]
    Formula(#[from] FormulaError),

    /// Failure classifying one object; aborts the commit
    #[error("Diff failed at {dist_name}: {reason}")]
    Diff { dist_name: String, reason: String },

    /// Comparison mode without a captured reference tree
    #[error("No reference tree captured; load a baseline first")]
    MissingReference,

    // ===== Codec Errors =====
    /// Canonical document could not be read or written
    #[error("Document error: {reason}")]
    Document { reason: String },
}

impl CmError {
    /// Classify this error onto the canonical taxonomy
    pub fn kind(&self) -> ExErrorKind {
        match self {
            CmError::ClassNotAllowed { .. }
            | CmError::UnknownClass { .. }
            | CmError::RootClassRequired { .. }
            | CmError::UnknownParameter { .. }
            | CmError::NotAScalarParameter { .. }
            | CmError::ListNotAllowed { .. }
            | CmError::UnknownListField { .. }
            | CmError::ListShapeMismatch { .. } => ExErrorKind::SchemaViolation,

            CmError::IdOutOfRange { .. } | CmError::ValueOutOfRange { .. } => {
                ExErrorKind::RangeViolation
            }

            CmError::DuplicateObject { .. } => ExErrorKind::DuplicateObject,

            CmError::ObjectNotFound { .. }
            | CmError::ParameterNotFound { .. }
            | CmError::ListNotFound { .. } => ExErrorKind::NotFound,

            CmError::InvalidListIndex { .. }
            | CmError::InvalidDistName { .. }
            | CmError::OrphanedObject { .. }
            | CmError::UnrecognizedCommand { .. } => ExErrorKind::InvalidInput,

            CmError::ExitPastRoot
            | CmError::SessionEnded
            | CmError::NoCurrentObject
            | CmError::DeleteOfCurrentPosition { .. }
            | CmError::SameId { .. } => ExErrorKind::Navigation,

            CmError::Formula(_) => ExErrorKind::Formula,
            CmError::Diff { .. } | CmError::MissingReference => ExErrorKind::Diff,
            CmError::Document { .. } => ExErrorKind::Serialization,
        }
    }

    /// Distinguished name the error is about, when it names one
    pub fn dist_name(&self) -> Option<&str> {
        match self {
            CmError::ListShapeMismatch { dist_name, .. }
            | CmError::DuplicateObject { dist_name }
            | CmError::ObjectNotFound { dist_name }
            | CmError::ParameterNotFound { dist_name, .. }
            | CmError::ListNotFound { dist_name, .. }
            | CmError::OrphanedObject { dist_name, .. }
            | CmError::DeleteOfCurrentPosition { dist_name, .. }
            | CmError::SameId { dist_name, .. }
            | CmError::Diff { dist_name, .. } => Some(dist_name),
            _ => None,
        }
    }

    /// Class the error is about, when it names one
    pub fn class(&self) -> Option<&str> {
        match self {
            CmError::ClassNotAllowed { class, .. }
            | CmError::UnknownClass { class }
            | CmError::RootClassRequired { class, .. }
            | CmError::UnknownParameter { class, .. }
            | CmError::NotAScalarParameter { class, .. }
            | CmError::ListNotAllowed { class, .. }
            | CmError::UnknownListField { class, .. }
            | CmError::IdOutOfRange { class, .. }
            | CmError::ValueOutOfRange { class, .. } => Some(class),
            _ => None,
        }
    }
}

impl From<CmError> for ExError {
    fn from(err: CmError) -> Self {
        let mut ex = ExError::new(err.kind()).with_message(err.to_string());
        if let Some(dist_name) = err.dist_name() {
            ex = ex.with_dist_name(dist_name);
        }
        if let Some(class) = err.class() {
            ex = ex.with_class(class);
        }
        ex
    }
}

impl From<quick_xml::Error> for CmError {
    fn from(err: quick_xml::Error) -> Self {
        CmError::Document {
            reason: err.to_string(),
        }
    }
}
