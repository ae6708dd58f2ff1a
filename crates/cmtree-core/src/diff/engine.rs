//! Change-set computation engine.
//!
//! The entry point is [`compute_changeset`]. Entries follow the document
//! order of the live tree. A failure classifying any single object aborts
//! the whole computation with that object's distName.

use std::time::Instant;

use crate::errors::{CmError, Result};
use crate::model::{ManagedObject, OperationTag};
use crate::ops::ConfigTree;
use crate::{log_op_end, log_op_error, log_op_start};

use super::model::{ChangeEntry, Changeset, DiffMode};

/// Every live object as a create, every tombstone as a delete
pub fn snapshot(current: &ConfigTree) -> Changeset {
    let entries = current
        .objects()
        .map(|obj| {
            let tag = if obj.is_tombstone() {
                OperationTag::Delete
            } else {
                OperationTag::Create
            };
            ChangeEntry::new(tag, obj)
        })
        .collect();
    Changeset::new(DiffMode::Snapshot, entries)
}

/// New objects and tombstones relative to `reference`; never reports updates
///
/// # Errors
///
/// `Diff` when an object's class differs from the reference at the same path.
pub fn coarse_diff(current: &ConfigTree, reference: &ConfigTree) -> Result<Changeset> {
    let mut entries = Vec::new();
    for obj in current.objects() {
        if let Some(tag) = classify(obj, reference, false)? {
            entries.push(ChangeEntry::new(tag, obj));
        }
    }
    Ok(Changeset::new(DiffMode::Coarse, entries))
}

/// Coarse diff plus field-by-field comparison of objects on both sides
///
/// # Errors
///
/// `Diff` when an object's class differs from the reference at the same path.
pub fn fine_diff(current: &ConfigTree, reference: &ConfigTree) -> Result<Changeset> {
    let mut entries = Vec::new();
    for obj in current.objects() {
        if let Some(tag) = classify(obj, reference, true)? {
            entries.push(ChangeEntry::new(tag, obj));
        }
    }
    Ok(Changeset::new(DiffMode::Fine, entries))
}

/// Derive the change-set for `mode`
///
/// # Errors
///
/// `MissingReference` for comparison modes without a reference, otherwise
/// the errors of [`coarse_diff`] and [`fine_diff`].
pub fn compute_changeset(
    mode: DiffMode,
    current: &ConfigTree,
    reference: Option<&ConfigTree>,
) -> Result<Changeset> {
    log_op_start!("compute_changeset", mode = mode.as_str(), object_count = current.len());
    let start = Instant::now();

    let result = match (mode, reference) {
        (DiffMode::Snapshot, _) => Ok(snapshot(current)),
        (DiffMode::Coarse, Some(reference)) => coarse_diff(current, reference),
        (DiffMode::Fine, Some(reference)) => fine_diff(current, reference),
        (_, None) => Err(CmError::MissingReference),
    };

    match &result {
        Ok(changeset) => log_op_end!(
            "compute_changeset",
            duration_ms = start.elapsed().as_millis() as u64,
            change_count = changeset.len()
        ),
        Err(e) => log_op_error!(
            "compute_changeset",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64
        ),
    }
    result
}

fn classify(
    obj: &ManagedObject,
    reference: &ConfigTree,
    compare_fields: bool,
) -> Result<Option<OperationTag>> {
    let before = reference.entry(&obj.dist_name);

    if obj.is_tombstone() {
        // Fine mode compares state, and an identical tombstone is no change
        if compare_fields && before.is_some_and(ManagedObject::is_tombstone) {
            return Ok(None);
        }
        return Ok(Some(OperationTag::Delete));
    }

    let Some(before) = before.filter(|b| !b.is_tombstone()) else {
        return Ok(Some(OperationTag::Create));
    };
    if before.class != obj.class {
        return Err(CmError::Diff {
            dist_name: obj.dist_name.to_string(),
            reason: format!("class changed from {} to {}", before.class, obj.class),
        });
    }

    if compare_fields && objects_differ(obj, before) {
        Ok(Some(OperationTag::Update))
    } else {
        Ok(None)
    }
}

/// Field-by-field comparison used by the fine diff
///
/// Scalars differ when present on one side only or when their trimmed text
/// differs. Lists differ when the name sets differ or, per shared list, the
/// trimmed values compare unequal position by position.
pub fn objects_differ(a: &ManagedObject, b: &ManagedObject) -> bool {
    if a.parameters.len() != b.parameters.len() {
        return true;
    }
    let scalars_differ = a.parameters.iter().any(|(name, value)| {
        !b.parameter(name)
            .is_some_and(|other| other.trim() == value.trim())
    });
    if scalars_differ {
        return true;
    }

    if a.lists.len() != b.lists.len() {
        return true;
    }
    a.lists.iter().any(|(name, list)| {
        !b.list(name)
            .is_some_and(|other| other.comparison_key() == list.comparison_key())
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::model::{DistName, ListValue};

    fn dn(s: &str) -> DistName {
        DistName::parse(s).unwrap()
    }

    fn obj(class: &str, path: &str) -> ManagedObject {
        ManagedObject::new(class, None, dn(path), "1.0").with_operation(OperationTag::Create)
    }

    fn baseline() -> ConfigTree {
        let mut b = obj("B", "ROOT-1/A-1/B-1");
        b.set_parameter("x", "10");
        ConfigTree::from_objects([obj("ROOT", "ROOT-1"), obj("A", "ROOT-1/A-1"), b]).unwrap()
    }

    #[test]
    fn test_snapshot_tags_everything_create() {
        let cs = snapshot(&baseline());
        assert_eq!(cs.len(), 3);
        assert_eq!(cs.count(OperationTag::Create), 3);
        assert!(cs.iter().all(|e| e.object.operation == Some(OperationTag::Create)));
    }

    #[test]
    fn test_fine_diff_of_identical_trees_is_empty() {
        let t = baseline();
        assert!(fine_diff(&t, &t).unwrap().is_empty());
        assert!(coarse_diff(&t, &t).unwrap().is_empty());
    }

    #[test]
    fn test_fine_diff_reports_update_with_full_state() {
        let reference = baseline();
        let mut current = reference.clone();
        current
            .get_mut(&dn("ROOT-1/A-1/B-1"))
            .unwrap()
            .set_parameter("x", "20");

        let cs = fine_diff(&current, &reference).unwrap();
        assert_eq!(cs.len(), 1);
        assert_eq!(cs.entries[0].tag, OperationTag::Update);
        assert_eq!(cs.entries[0].object.parameter("x"), Some("20"));
        assert_eq!(cs.entries[0].object.operation, Some(OperationTag::Update));

        assert!(coarse_diff(&current, &reference).unwrap().is_empty());
    }

    #[test]
    fn test_whitespace_only_changes_are_not_updates() {
        let reference = baseline();
        let mut current = reference.clone();
        current
            .get_mut(&dn("ROOT-1/A-1/B-1"))
            .unwrap()
            .set_parameter("x", " 10 ");
        assert!(fine_diff(&current, &reference).unwrap().is_empty());
    }

    #[test]
    fn test_list_comparison_is_positional() {
        let reference = {
            let mut t = baseline();
            t.get_mut(&dn("ROOT-1/A-1/B-1"))
                .unwrap()
                .lists
                .insert("tags".into(), ListValue::Scalar(vec!["a".into(), "b".into()]));
            t
        };
        let mut current = reference.clone();
        current
            .get_mut(&dn("ROOT-1/A-1/B-1"))
            .unwrap()
            .lists
            .insert("tags".into(), ListValue::Scalar(vec!["b".into(), "a".into()]));
        let cs = fine_diff(&current, &reference).unwrap();
        assert_eq!(cs.dist_names(), vec![&dn("ROOT-1/A-1/B-1")]);
    }

    #[test]
    fn test_new_objects_and_tombstones() {
        let reference = baseline();
        let mut current = reference.clone();
        current.insert(obj("A", "ROOT-1/A-2"));
        current.remove(&dn("ROOT-1/A-1/B-1"));
        current.insert(ManagedObject::tombstone("B", None, dn("ROOT-1/A-1/B-1"), "1.0"));

        for cs in [
            coarse_diff(&current, &reference).unwrap(),
            fine_diff(&current, &reference).unwrap(),
        ] {
            assert_eq!(cs.count(OperationTag::Create), 1);
            assert_eq!(cs.count(OperationTag::Delete), 1);
            assert_eq!(cs.count(OperationTag::Update), 0);
        }
    }

    #[test]
    fn test_coarse_diff_repeats_deletes_already_in_reference() {
        let mut planned = baseline();
        planned.remove(&dn("ROOT-1/A-1/B-1"));
        planned.insert(ManagedObject::tombstone("B", None, dn("ROOT-1/A-1/B-1"), "1.0"));

        let coarse = coarse_diff(&planned, &planned).unwrap();
        assert_eq!(coarse.count(OperationTag::Delete), 1);
        assert_eq!(coarse.len(), 1);
        assert_eq!(snapshot(&planned).count(OperationTag::Delete), 1);

        assert!(fine_diff(&planned, &planned).unwrap().is_empty());
    }

    #[test]
    fn test_class_mismatch_aborts_with_dist_name() {
        let reference = baseline();
        let mut current = reference.clone();
        current.get_mut(&dn("ROOT-1/A-1")).unwrap().class = "Z".into();
        let err = fine_diff(&current, &reference).unwrap_err();
        assert_eq!(
            err,
            CmError::Diff {
                dist_name: "ROOT-1/A-1".into(),
                reason: "class changed from A to Z".into()
            }
        );
    }

    #[test]
    fn test_comparison_modes_need_reference() {
        let t = baseline();
        assert!(matches!(
            compute_changeset(DiffMode::Fine, &t, None),
            Err(CmError::MissingReference)
        ));
        assert_eq!(compute_changeset(DiffMode::Snapshot, &t, None).unwrap().len(), 3);
    }
}
