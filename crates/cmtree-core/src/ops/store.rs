use indexmap::IndexMap;

use crate::errors::{CmError, Result};
use crate::model::{DistName, ManagedObject};
use crate::rules::validation;

/// The configuration tree of one managed device
///
/// Objects are keyed by distinguished name and kept in insertion order, which
/// is the order the canonical document lists them in. Tombstones (objects
/// tagged `delete`) live alongside live objects under their own path.
///
/// Single-owner and not thread-safe; a session mutates it through
/// [`crate::ops::object_ops`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigTree {
    pub(crate) objects: IndexMap<DistName, ManagedObject>,
}

impl ConfigTree {
    pub fn new() -> Self {
        Self {
            objects: IndexMap::new(),
        }
    }

    /// Bulk-load a baseline
    ///
    /// # Errors
    ///
    /// Returns `DuplicateObject` for a repeated distinguished name and
    /// `OrphanedObject` when a live object's parent is missing.
    pub fn from_objects(objects: impl IntoIterator<Item = ManagedObject>) -> Result<Self> {
        let mut tree = Self::new();
        for obj in objects {
            if tree.objects.contains_key(&obj.dist_name) {
                return Err(CmError::DuplicateObject {
                    dist_name: obj.dist_name.to_string(),
                });
            }
            tree.objects.insert(obj.dist_name.clone(), obj);
        }
        validation::validate_tree(&tree)?;
        Ok(tree)
    }

    /// Number of entries, tombstones included
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// All entries in document order, tombstones included
    pub fn objects(&self) -> impl Iterator<Item = &ManagedObject> {
        self.objects.values()
    }

    pub fn live_objects(&self) -> impl Iterator<Item = &ManagedObject> {
        self.objects.values().filter(|o| !o.is_tombstone())
    }

    /// Any entry at `path`, tombstone or live
    pub fn entry(&self, path: &DistName) -> Option<&ManagedObject> {
        self.objects.get(path)
    }

    /// Live object at `path`
    pub fn find(&self, path: &DistName) -> Option<&ManagedObject> {
        self.objects.get(path).filter(|o| !o.is_tombstone())
    }

    pub fn contains_live(&self, path: &DistName) -> bool {
        self.find(path).is_some()
    }

    /// Live object at `path`
    ///
    /// # Errors
    ///
    /// Returns `ObjectNotFound` if nothing live exists there.
    pub fn get(&self, path: &DistName) -> Result<&ManagedObject> {
        self.find(path).ok_or_else(|| CmError::ObjectNotFound {
            dist_name: path.to_string(),
        })
    }

    /// Mutable live object at `path`
    ///
    /// # Errors
    ///
    /// Returns `ObjectNotFound` if nothing live exists there.
    pub fn get_mut(&mut self, path: &DistName) -> Result<&mut ManagedObject> {
        self.objects
            .get_mut(path)
            .filter(|o| !o.is_tombstone())
            .ok_or_else(|| CmError::ObjectNotFound {
                dist_name: path.to_string(),
            })
    }

    /// Paths of every entry at or below `path`, in document order
    pub fn subtree_paths(&self, path: &DistName) -> Vec<DistName> {
        self.objects
            .keys()
            .filter(|k| path.is_prefix_of(k))
            .cloned()
            .collect()
    }

    /// Live objects whose last segment is `CLASS-id`
    pub fn find_by_segment(&self, class: &str, id: &str) -> Vec<DistName> {
        self.live_objects()
            .filter(|o| o.dist_name.class() == Some(class) && o.dist_name.id() == Some(id))
            .map(|o| o.dist_name.clone())
            .collect()
    }

    pub(crate) fn insert(&mut self, obj: ManagedObject) {
        self.objects.insert(obj.dist_name.clone(), obj);
    }

    pub(crate) fn remove(&mut self, path: &DistName) -> Option<ManagedObject> {
        self.objects.shift_remove(path)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::model::OperationTag;

    fn obj(dn: &str) -> ManagedObject {
        let dist_name = DistName::parse(dn).unwrap();
        let class = dist_name.class().unwrap().to_string();
        ManagedObject::new(class, None, dist_name, "1.0")
    }

    #[test]
    fn test_bulk_load_preserves_order() {
        let tree = ConfigTree::from_objects(vec![obj("R-1"), obj("R-1/B-1"), obj("R-1/A-1")]).unwrap();
        let order: Vec<String> = tree.objects().map(|o| o.dist_name.to_string()).collect();
        assert_eq!(order, vec!["R-1", "R-1/B-1", "R-1/A-1"]);
    }

    #[test]
    fn test_bulk_load_rejects_duplicates() {
        let err = ConfigTree::from_objects(vec![obj("R-1"), obj("R-1")]).unwrap_err();
        assert!(matches!(err, CmError::DuplicateObject { .. }));
    }

    #[test]
    fn test_bulk_load_rejects_orphans_but_not_tombstones() {
        let err = ConfigTree::from_objects(vec![obj("R-1"), obj("R-1/A-1/B-1")]).unwrap_err();
        assert!(matches!(err, CmError::OrphanedObject { .. }));

        let tombstone = obj("R-1/A-1/B-1").with_operation(OperationTag::Delete);
        assert!(ConfigTree::from_objects(vec![obj("R-1"), tombstone]).is_ok());
    }

    #[test]
    fn test_find_skips_tombstones() {
        let tombstone = obj("R-1/A-1").with_operation(OperationTag::Delete);
        let tree = ConfigTree::from_objects(vec![obj("R-1"), tombstone]).unwrap();
        let path = DistName::parse("R-1/A-1").unwrap();
        assert!(tree.find(&path).is_none());
        assert!(tree.entry(&path).is_some());
        assert!(matches!(tree.get(&path), Err(CmError::ObjectNotFound { .. })));
    }

    #[test]
    fn test_find_by_segment() {
        let tree = ConfigTree::from_objects(vec![
            obj("R-1"),
            obj("R-1/A-1"),
            obj("R-1/A-1/C-2"),
            obj("R-1/A-2"),
            obj("R-1/A-2/C-2"),
        ])
        .unwrap();
        assert_eq!(tree.find_by_segment("C", "2").len(), 2);
        assert_eq!(tree.find_by_segment("A", "1").len(), 1);
    }
}
