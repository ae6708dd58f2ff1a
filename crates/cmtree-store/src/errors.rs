//! Error handling for cmtree-store
//!
//! Wraps cmtree-core ExError with loader-specific helpers

use std::path::Path;

use cmtree_core::errors::{CmError, ExError, ExErrorKind};

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create an IO error
pub fn io_error(operation: &str, err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}

/// Create an IO error naming the file involved
pub fn file_error(operation: &str, path: &Path, err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op(operation.to_string())
        .with_message(format!("{}: {}", path.display(), err))
}

/// Create a parse error for malformed input data
pub fn parse_error(operation: &str, reason: impl std::fmt::Display) -> ExError {
    ExError::new(ExErrorKind::Serialization)
        .with_op(operation.to_string())
        .with_message(reason.to_string())
}

/// Lift a core error, keeping its classification and context
pub fn from_core(operation: &str, err: CmError) -> ExError {
    ExError::from(err).with_op(operation.to_string())
}
