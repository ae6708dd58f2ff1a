//! Canonical logging macros
//!
//! These macros provide a structured, consistent way to log operations.

/// Log the start of an operation
///
/// # Example
///
/// ```
/// # use cmtree_core::log_op_start;
/// log_op_start!("create_object");
/// log_op_start!("create_object", dist_name = "ROOT-1/A-1");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr) => {{
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::cmtree_core_types::schema::EVENT_START,
        );
    }};
    ($op:expr, $($field:tt)*) => {{
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::cmtree_core_types::schema::EVENT_START,
            $($field)*
        );
    }};
}

/// Log the successful end of an operation
///
/// # Example
///
/// ```
/// # use cmtree_core::log_op_end;
/// log_op_end!("commit", duration_ms = 42);
/// log_op_end!("commit", duration_ms = 42, change_count = 3);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr) => {{
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::cmtree_core_types::schema::EVENT_END,
            duration_ms = $duration,
        );
    }};
    ($op:expr, duration_ms = $duration:expr, $($field:tt)*) => {{
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::cmtree_core_types::schema::EVENT_END,
            duration_ms = $duration,
            $($field)*
        );
    }};
}

/// Log an operation error
///
/// The error is converted into an `ExError` so that the stable code is
/// always part of the record.
///
/// # Example
///
/// ```
/// # use cmtree_core::{log_op_error, errors::CmError};
/// let err = CmError::ObjectNotFound { dist_name: "ROOT-1/A-9".to_string() };
/// log_op_error!("set_parameter", err, duration_ms = 1);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr) => {{
        use $crate::errors::ExError;
        let ex_err: ExError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::cmtree_core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code(),
            dist_name = ex_err.dist_name().unwrap_or(""),
        );
    }};
    ($op:expr, $err:expr, duration_ms = $duration:expr, $($field:tt)*) => {{
        use $crate::errors::ExError;
        let ex_err: ExError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::cmtree_core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code(),
            dist_name = ex_err.dist_name().unwrap_or(""),
            $($field)*
        );
    }};
}

/// Log a degraded path that was recovered from
///
/// # Example
///
/// ```
/// # use cmtree_core::log_fallback;
/// log_fallback!("rulebook_resolve", "first instance key", class = "CELL");
/// ```
#[macro_export]
macro_rules! log_fallback {
    ($op:expr, $reason:expr) => {{
        tracing::warn!(
            component = module_path!(),
            op = $op,
            event = $crate::cmtree_core_types::schema::EVENT_FALLBACK,
            reason = $reason,
        );
    }};
    ($op:expr, $reason:expr, $($field:tt)*) => {{
        tracing::warn!(
            component = module_path!(),
            op = $op,
            event = $crate::cmtree_core_types::schema::EVENT_FALLBACK,
            reason = $reason,
            $($field)*
        );
    }};
}
