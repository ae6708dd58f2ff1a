use crate::errors::{CmError, Result};
use crate::ops::ConfigTree;

use super::invariants;

/// Validate the structural invariants of a tree
///
/// 1. Every object's class matches the last segment of its path
/// 2. Exactly one root (one managed device per tree)
/// 3. Every live object's parent resolves (tombstones exempt)
///
/// Distinguished-name uniqueness is guaranteed by the map itself.
///
/// # Errors
///
/// Returns the first violation found.
pub fn validate_tree(tree: &ConfigTree) -> Result<()> {
    if let Some((dist_name, class)) = invariants::find_class_mismatches(tree).into_iter().next() {
        return Err(CmError::InvalidDistName {
            input: dist_name,
            reason: format!("object class {} does not match its path", class),
        });
    }

    if let Some(extra) = invariants::find_extra_roots(tree).into_iter().next() {
        return Err(CmError::DuplicateObject { dist_name: extra });
    }

    if let Some((dist_name, parent)) = invariants::find_orphans(tree).into_iter().next() {
        return Err(CmError::OrphanedObject { dist_name, parent });
    }

    Ok(())
}
