use crate::ops::ConfigTree;

/// Live objects whose parent path does not resolve to a live object
///
/// Returns `(dist_name, parent)` pairs. Tombstones are exempt: a scheduled
/// delete may outlive its parent.
pub fn find_orphans(tree: &ConfigTree) -> Vec<(String, String)> {
    tree.live_objects()
        .filter_map(|obj| {
            let parent = obj.dist_name.parent()?;
            if tree.contains_live(&parent) {
                None
            } else {
                Some((obj.dist_name.to_string(), parent.to_string()))
            }
        })
        .collect()
}

/// Objects whose `class` disagrees with the class in their own path
///
/// Returns `(dist_name, class)` pairs.
pub fn find_class_mismatches(tree: &ConfigTree) -> Vec<(String, String)> {
    tree.objects()
        .filter(|obj| obj.dist_name.class() != Some(obj.class.as_str()))
        .map(|obj| (obj.dist_name.to_string(), obj.class.clone()))
        .collect()
}

/// More than one live object at depth one
pub fn find_extra_roots(tree: &ConfigTree) -> Vec<String> {
    let roots: Vec<String> = tree
        .live_objects()
        .filter(|obj| obj.dist_name.len() == 1)
        .map(|obj| obj.dist_name.to_string())
        .collect();
    if roots.len() > 1 {
        roots[1..].to_vec()
    } else {
        Vec::new()
    }
}
