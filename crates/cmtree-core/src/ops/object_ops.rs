//! Tree mutations
//!
//! Every operation validates completely before it touches the tree, so a
//! failed call leaves the tree exactly as it was.

use crate::errors::{CmError, Result};
use crate::model::{DistName, ListValue, ManagedObject, OperationTag, PathSegment};
use crate::schema::{id_parameter_name, ParameterMeta, SchemaCatalog};

use super::store::ConfigTree;

/// Field name that marks a scalar-list write
pub const SCALAR_LIST_FIELD: &str = "val";

/// Prefix for placeholders written by [`add_auto_parameters`] when the catalog has no default
pub const AUTO_PLACEHOLDER_PREFIX: &str = "TEMP_";

/// Create an object under `parent` (or the root when `parent` is `None`)
///
/// The new object is tagged `create` and namespaced from the catalog. A
/// tombstone at the same path is replaced.
///
/// # Errors
///
/// - `InvalidDistName` when `id` is empty or contains `/`
/// - `RootClassRequired` when creating a root of the wrong class
/// - `ObjectNotFound` when `parent` is not a live object
/// - `ClassNotAllowed` when `class` is not a declared child of the parent's class
/// - `IdOutOfRange` when the class declares an id domain and `id` violates it
/// - `DuplicateObject` when a live object already exists at the path
pub fn create_object(
    tree: &mut ConfigTree,
    catalog: &dyn SchemaCatalog,
    parent: Option<&DistName>,
    class: &str,
    id: &str,
    version: &str,
) -> Result<DistName> {
    PathSegment::checked(class, id)?;
    let path = match parent {
        None => {
            if class != catalog.root_class() {
                return Err(CmError::RootClassRequired {
                    class: class.to_string(),
                    root_class: catalog.root_class().to_string(),
                });
            }
            DistName::default().child(class, id)
        }
        Some(parent_path) => {
            let parent_obj = tree.get(parent_path)?;
            if !catalog.is_child_allowed(&parent_obj.class, class) {
                return Err(CmError::ClassNotAllowed {
                    class: class.to_string(),
                    parent_class: parent_obj.class.clone(),
                });
            }
            parent_path.child(class, id)
        }
    };

    check_id_range(catalog, class, id)?;

    if tree.contains_live(&path) {
        return Err(CmError::DuplicateObject {
            dist_name: path.to_string(),
        });
    }

    let namespace = catalog.namespace_for(&path);
    let obj = ManagedObject::new(class, namespace, path.clone(), version)
        .with_operation(OperationTag::Create);
    tree.remove(&path);
    tree.insert(obj);
    Ok(path)
}

fn check_id_range(catalog: &dyn SchemaCatalog, class: &str, id: &str) -> Result<()> {
    let Some(range) = catalog.id_range(class) else {
        return Ok(());
    };
    let in_range = id.trim().parse::<i64>().map(|v| range.contains(v)).unwrap_or(false);
    if in_range {
        Ok(())
    } else {
        Err(CmError::IdOutOfRange {
            class: class.to_string(),
            id: id.to_string(),
            range: range.to_string(),
        })
    }
}

fn scalar_meta<'a>(
    catalog: &'a dyn SchemaCatalog,
    class: &str,
    name: &str,
) -> Result<&'a ParameterMeta> {
    let meta = catalog
        .parameter_metadata(class, name)
        .ok_or_else(|| CmError::UnknownParameter {
            class: class.to_string(),
            parameter: name.to_string(),
        })?;
    if meta.is_list() {
        return Err(CmError::NotAScalarParameter {
            class: class.to_string(),
            parameter: name.to_string(),
        });
    }
    Ok(meta)
}

/// Set a scalar parameter, keeping its first-insertion position
///
/// Integer values are checked against a declared numeric range; other
/// values are stored as given.
///
/// # Errors
///
/// `ObjectNotFound`, `UnknownParameter`, `NotAScalarParameter`, `ValueOutOfRange`.
pub fn set_parameter(
    tree: &mut ConfigTree,
    catalog: &dyn SchemaCatalog,
    path: &DistName,
    name: &str,
    value: &str,
) -> Result<()> {
    let class = tree.get(path)?.class.clone();
    let meta = scalar_meta(catalog, &class, name)?;
    if let (Some(range), Ok(numeric)) = (meta.range(), value.trim().parse::<i64>()) {
        if !range.contains(numeric) {
            return Err(CmError::ValueOutOfRange {
                class,
                parameter: name.to_string(),
                value: value.to_string(),
                range: range.to_string(),
            });
        }
    }
    tree.get_mut(path)?.set_parameter(name, value);
    Ok(())
}

/// Parse a 1-based list position
///
/// # Errors
///
/// Returns `InvalidListIndex` for zero, negatives and non-numbers.
pub fn parse_list_index(index: &str) -> Result<usize> {
    match index.trim().parse::<usize>() {
        Ok(i) if i >= 1 => Ok(i),
        _ => Err(CmError::InvalidListIndex {
            index: index.to_string(),
        }),
    }
}

/// Write fields into a list entry at 1-based `index`
///
/// Exactly one field named `val` addresses a scalar list; anything else
/// addresses a record list and every field must be declared. Missing
/// positions up to `index` are filled with empty placeholders.
///
/// # Errors
///
/// `ObjectNotFound`, `ListNotAllowed`, `UnknownListField`, `InvalidListIndex`,
/// `ListShapeMismatch`.
pub fn set_list_item(
    tree: &mut ConfigTree,
    catalog: &dyn SchemaCatalog,
    path: &DistName,
    list: &str,
    index: usize,
    fields: &[(String, String)],
) -> Result<()> {
    let obj = tree.get(path)?;
    let class = obj.class.clone();
    let meta = catalog
        .parameter_metadata(&class, list)
        .filter(|m| m.is_list() && !m.children.is_empty())
        .ok_or_else(|| CmError::ListNotAllowed {
            class: class.clone(),
            list: list.to_string(),
        })?;
    if index == 0 {
        return Err(CmError::InvalidListIndex {
            index: index.to_string(),
        });
    }

    let scalar = fields.len() == 1 && fields[0].0 == SCALAR_LIST_FIELD;
    if !scalar {
        if let Some((field, _)) = fields.iter().find(|(f, _)| !meta.allows_field(f)) {
            return Err(CmError::UnknownListField {
                class,
                list: list.to_string(),
                field: field.clone(),
            });
        }
    }
    if let Some(existing) = obj.list(list) {
        if existing.is_scalar() != scalar {
            return Err(CmError::ListShapeMismatch {
                dist_name: path.to_string(),
                list: list.to_string(),
            });
        }
    }

    let obj = tree.get_mut(path)?;
    let entry = obj.lists.entry(list.to_string()).or_insert_with(|| {
        if scalar {
            ListValue::Scalar(Vec::new())
        } else {
            ListValue::Records(Vec::new())
        }
    });
    if scalar {
        entry.set_scalar(index, fields[0].1.as_str());
    } else {
        entry.set_record_fields(index, fields.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    }
    Ok(())
}

pub(crate) fn check_not_current(path: &DistName, current: Option<&DistName>) -> Result<()> {
    match current {
        Some(current) if path.is_prefix_of(current) => Err(CmError::DeleteOfCurrentPosition {
            dist_name: path.to_string(),
            current: current.to_string(),
        }),
        _ => Ok(()),
    }
}

/// Remove an object and everything beneath it without scheduling a delete
///
/// Returns the removed paths in document order.
///
/// # Errors
///
/// `DeleteOfCurrentPosition` when `path` is `current` or one of its
/// ancestors; `ObjectNotFound` when no live object exists at `path`.
pub fn delete_hard(
    tree: &mut ConfigTree,
    path: &DistName,
    current: Option<&DistName>,
) -> Result<Vec<DistName>> {
    check_not_current(path, current)?;
    tree.get(path)?;
    let removed = tree.subtree_paths(path);
    for p in &removed {
        tree.remove(p);
    }
    Ok(removed)
}

/// Schedule a delete: remove the live subtree and leave tombstones
///
/// The target gets a tombstone even when it was never loaded; every live
/// descendant that was removed gets one too. Tombstones carry a class,
/// namespace and version resolved afresh from the catalog.
///
/// # Errors
///
/// `DeleteOfCurrentPosition` when `path` is `current` or one of its ancestors;
/// `InvalidDistName` for an empty path.
pub fn delete_soft(
    tree: &mut ConfigTree,
    catalog: &dyn SchemaCatalog,
    path: &DistName,
    current: Option<&DistName>,
) -> Result<Vec<DistName>> {
    check_not_current(path, current)?;
    if path.is_empty() {
        return Err(CmError::InvalidDistName {
            input: String::new(),
            reason: "empty".to_string(),
        });
    }

    let mut targets = vec![path.clone()];
    targets.extend(
        tree.subtree_paths(path)
            .into_iter()
            .filter(|p| p != path && tree.contains_live(p)),
    );

    for target in &targets {
        tree.remove(target);
        let class = target.class().unwrap_or_default();
        let tombstone = ManagedObject::tombstone(
            class,
            catalog.namespace_for(target),
            target.clone(),
            catalog.resolve_version(class),
        );
        tree.insert(tombstone);
    }
    Ok(targets)
}

/// Change the instance id of an object, carrying its subtree along
///
/// Returns the new path. Document order is preserved. A tombstone already
/// at the new path is replaced, as [`create_object`] does.
///
/// # Errors
///
/// `ObjectNotFound`, `SameId`, `InvalidDistName`, `IdOutOfRange`, `DuplicateObject`.
pub fn rename_id(
    tree: &mut ConfigTree,
    catalog: &dyn SchemaCatalog,
    path: &DistName,
    new_id: &str,
) -> Result<DistName> {
    let obj = tree.get(path)?;
    let class = obj.class.clone();
    if path.id() == Some(new_id) {
        return Err(CmError::SameId {
            dist_name: path.to_string(),
            id: new_id.to_string(),
        });
    }
    PathSegment::checked(&class, new_id)?;
    check_id_range(catalog, &class, new_id)?;

    let new_path = match path.parent() {
        Some(parent) => parent.child(&class, new_id),
        None => DistName::default().child(&class, new_id),
    };
    if tree.contains_live(&new_path) {
        return Err(CmError::DuplicateObject {
            dist_name: new_path.to_string(),
        });
    }

    // Tombstones at the target paths are replaced, as on create
    for old in tree.subtree_paths(path) {
        if let Some(renamed) = old.with_prefix_replaced(path, &new_path) {
            tree.remove(&renamed);
        }
    }

    let objects = std::mem::take(&mut tree.objects);
    tree.objects = objects
        .into_iter()
        .map(|(dn, mut obj)| match dn.with_prefix_replaced(path, &new_path) {
            Some(renamed) => {
                obj.dist_name = renamed.clone();
                (renamed, obj)
            }
            None => (dn, obj),
        })
        .collect();
    Ok(new_path)
}

/// Remove one scalar parameter
///
/// # Errors
///
/// `ObjectNotFound`, `ParameterNotFound`.
pub fn remove_parameter(tree: &mut ConfigTree, path: &DistName, name: &str) -> Result<()> {
    let obj = tree.get_mut(path)?;
    obj.parameters
        .shift_remove(name)
        .map(|_| ())
        .ok_or_else(|| CmError::ParameterNotFound {
            dist_name: path.to_string(),
            parameter: name.to_string(),
        })
}

/// Remove a whole list
///
/// # Errors
///
/// `ObjectNotFound`, `ListNotFound`.
pub fn remove_list(tree: &mut ConfigTree, path: &DistName, name: &str) -> Result<()> {
    let obj = tree.get_mut(path)?;
    obj.lists
        .shift_remove(name)
        .map(|_| ())
        .ok_or_else(|| CmError::ListNotFound {
            dist_name: path.to_string(),
            list: name.to_string(),
        })
}

/// Fill absent scalar parameters from catalog defaults
///
/// With `all` every declared scalar is considered, otherwise only required
/// ones. A parameter without a default gets `TEMP_<name>` so that it stands
/// out in review. Returns the names that were added.
///
/// # Errors
///
/// `ObjectNotFound`.
pub fn add_auto_parameters(
    tree: &mut ConfigTree,
    catalog: &dyn SchemaCatalog,
    path: &DistName,
    all: bool,
) -> Result<Vec<String>> {
    let obj = tree.get(path)?;
    let id_param = id_parameter_name(&obj.class);
    let additions: Vec<(String, String)> = catalog
        .parameters_of(&obj.class)
        .into_iter()
        .filter(|(name, meta)| {
            !meta.is_list()
                && (all || meta.required)
                && *name != id_param
                && !obj.parameters.contains_key(*name)
        })
        .map(|(name, meta)| {
            let value = meta
                .default_text()
                .unwrap_or_else(|| format!("{}{}", AUTO_PLACEHOLDER_PREFIX, name));
            (name.to_string(), value)
        })
        .collect();

    let obj = tree.get_mut(path)?;
    for (name, value) in &additions {
        obj.set_parameter(name.as_str(), value.as_str());
    }
    Ok(additions.into_iter().map(|(name, _)| name).collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::schema::StaticCatalog;

    fn meta(kind: &str) -> ParameterMeta {
        ParameterMeta {
            kind: kind.to_string(),
            ..ParameterMeta::default()
        }
    }

    fn catalog() -> StaticCatalog {
        StaticCatalog::new("R")
            .with_default_version("1.0")
            .with_class("R", ["A"])
            .with_class("A", ["B"])
            .with_class("B", Vec::<String>::new())
            .with_param("B", "x", meta("int"))
            .with_param(
                "B",
                "levels",
                ParameterMeta {
                    kind: "list".into(),
                    children: vec!["lo".into(), "hi".into()],
                    ..ParameterMeta::default()
                },
            )
            .with_param(
                "B",
                "tags",
                ParameterMeta {
                    kind: "list".into(),
                    children: vec!["val".into()],
                    ..ParameterMeta::default()
                },
            )
    }

    fn dn(s: &str) -> DistName {
        DistName::parse(s).unwrap()
    }

    fn seeded() -> (ConfigTree, StaticCatalog) {
        let cat = catalog();
        let mut tree = ConfigTree::new();
        create_object(&mut tree, &cat, None, "R", "1", "1.0").unwrap();
        create_object(&mut tree, &cat, Some(&dn("R-1")), "A", "1", "1.0").unwrap();
        create_object(&mut tree, &cat, Some(&dn("R-1/A-1")), "B", "1", "1.0").unwrap();
        (tree, cat)
    }

    #[test]
    fn test_create_rejects_undeclared_child_and_leaves_tree() {
        let (mut tree, cat) = seeded();
        let before = tree.clone();
        let err = create_object(&mut tree, &cat, Some(&dn("R-1")), "B", "2", "1.0").unwrap_err();
        assert!(matches!(err, CmError::ClassNotAllowed { .. }));
        assert_eq!(tree, before);
    }

    #[test]
    fn test_create_duplicate() {
        let (mut tree, cat) = seeded();
        let err = create_object(&mut tree, &cat, Some(&dn("R-1")), "A", "1", "1.0").unwrap_err();
        assert!(matches!(err, CmError::DuplicateObject { .. }));
    }

    #[test]
    fn test_set_list_item_scalar_and_record() {
        let (mut tree, cat) = seeded();
        let b = dn("R-1/A-1/B-1");
        set_list_item(&mut tree, &cat, &b, "tags", 2, &[("val".into(), "t2".into())]).unwrap();
        set_list_item(&mut tree, &cat, &b, "levels", 1, &[("lo".into(), "1".into())]).unwrap();
        let obj = tree.find(&b).unwrap();
        assert_eq!(
            obj.list("tags"),
            Some(&ListValue::Scalar(vec![String::new(), "t2".into()]))
        );
        assert!(!obj.list("levels").unwrap().is_scalar());
    }

    #[test]
    fn test_set_list_item_rejects_unknown_field_without_mutation() {
        let (mut tree, cat) = seeded();
        let b = dn("R-1/A-1/B-1");
        let err = set_list_item(
            &mut tree,
            &cat,
            &b,
            "levels",
            1,
            &[("lo".into(), "1".into()), ("mid".into(), "2".into())],
        )
        .unwrap_err();
        assert!(matches!(err, CmError::UnknownListField { .. }));
        assert!(tree.find(&b).unwrap().list("levels").is_none());
    }

    #[test]
    fn test_set_list_item_on_scalar_parameter() {
        let (mut tree, cat) = seeded();
        let err = set_list_item(
            &mut tree,
            &cat,
            &dn("R-1/A-1/B-1"),
            "x",
            1,
            &[("val".into(), "1".into())],
        )
        .unwrap_err();
        assert!(matches!(err, CmError::ListNotAllowed { .. }));
    }

    #[test]
    fn test_delete_soft_tombstones_subtree() {
        let (mut tree, cat) = seeded();
        let removed = delete_soft(&mut tree, &cat, &dn("R-1/A-1"), Some(&dn("R-1"))).unwrap();
        assert_eq!(removed.len(), 2);
        assert!(tree.find(&dn("R-1/A-1")).is_none());
        assert!(tree.entry(&dn("R-1/A-1")).unwrap().is_tombstone());
        assert!(tree.entry(&dn("R-1/A-1/B-1")).unwrap().is_tombstone());
    }

    #[test]
    fn test_rename_rewrites_descendants() {
        let (mut tree, cat) = seeded();
        let new_path = rename_id(&mut tree, &cat, &dn("R-1/A-1"), "5").unwrap();
        assert_eq!(new_path.to_string(), "R-1/A-5");
        assert!(tree.find(&dn("R-1/A-5/B-1")).is_some());
        assert!(tree.find(&dn("R-1/A-1")).is_none());
        let err = rename_id(&mut tree, &cat, &new_path, "5").unwrap_err();
        assert!(matches!(err, CmError::SameId { .. }));
    }

    #[test]
    fn test_ids_with_separator_are_refused() {
        let (mut tree, cat) = seeded();
        let before = tree.clone();
        let err =
            create_object(&mut tree, &cat, Some(&dn("R-1")), "A", "2/B-1", "1.0").unwrap_err();
        assert!(matches!(err, CmError::InvalidDistName { .. }));
        let err = rename_id(&mut tree, &cat, &dn("R-1/A-1"), "9/x").unwrap_err();
        assert!(matches!(err, CmError::InvalidDistName { .. }));
        assert_eq!(tree, before);
    }

    #[test]
    fn test_rename_onto_tombstoned_id_replaces_it() {
        let (mut tree, cat) = seeded();
        create_object(&mut tree, &cat, Some(&dn("R-1")), "A", "2", "1.0").unwrap();
        create_object(&mut tree, &cat, Some(&dn("R-1/A-2")), "B", "1", "1.0").unwrap();
        delete_soft(&mut tree, &cat, &dn("R-1/A-2"), Some(&dn("R-1"))).unwrap();

        let new_path = rename_id(&mut tree, &cat, &dn("R-1/A-1"), "2").unwrap();
        assert_eq!(new_path.to_string(), "R-1/A-2");
        assert!(tree.find(&dn("R-1/A-2")).is_some());
        assert!(tree.find(&dn("R-1/A-2/B-1")).is_some());
        assert!(tree.entry(&dn("R-1/A-1")).is_none());
        assert_eq!(tree.objects().filter(|o| o.is_tombstone()).count(), 0);

        // a live target still blocks the rename
        create_object(&mut tree, &cat, Some(&dn("R-1")), "A", "3", "1.0").unwrap();
        let err = rename_id(&mut tree, &cat, &new_path, "3").unwrap_err();
        assert!(matches!(err, CmError::DuplicateObject { .. }));
    }

    #[test]
    fn test_remove_parameter_and_list() {
        let (mut tree, cat) = seeded();
        let b = dn("R-1/A-1/B-1");
        set_parameter(&mut tree, &cat, &b, "x", "1").unwrap();
        remove_parameter(&mut tree, &b, "x").unwrap();
        assert!(matches!(
            remove_parameter(&mut tree, &b, "x"),
            Err(CmError::ParameterNotFound { .. })
        ));
        assert!(matches!(
            remove_list(&mut tree, &b, "levels"),
            Err(CmError::ListNotFound { .. })
        ));
    }

    #[test]
    fn test_parse_list_index() {
        assert_eq!(parse_list_index("3").unwrap(), 3);
        assert!(parse_list_index("0").is_err());
        assert!(parse_list_index("x").is_err());
    }
}
