//! Advisory required-parameter pass
//!
//! Reports live objects that lack parameters the catalog marks as required.
//! Findings are warnings attached to a commit; they never block it.

use serde::Serialize;

use crate::ops::ConfigTree;
use crate::schema::{id_parameter_name, SchemaCatalog};

/// Required parameters absent from one object
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingRequired {
    pub dist_name: String,
    pub class: String,
    pub parameters: Vec<String>,
}

impl std::fmt::Display for MissingRequired {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}) is missing required parameters: {}",
            self.dist_name,
            self.class,
            self.parameters.join(", ")
        )
    }
}

/// Scan live objects for missing required parameters
///
/// A required list counts as present when the object carries the list at all.
/// The id parameter is carried by the distName and never reported.
pub fn find_missing_required(tree: &ConfigTree, catalog: &dyn SchemaCatalog) -> Vec<MissingRequired> {
    tree.live_objects()
        .filter_map(|obj| {
            let id_param = id_parameter_name(&obj.class);
            let parameters: Vec<String> = catalog
                .parameters_of(&obj.class)
                .into_iter()
                .filter(|(name, meta)| meta.required && *name != id_param)
                .filter(|(name, meta)| {
                    if meta.is_list() {
                        !obj.lists.contains_key(*name)
                    } else {
                        !obj.parameters.contains_key(*name)
                    }
                })
                .map(|(name, _)| name.to_string())
                .collect();
            if parameters.is_empty() {
                None
            } else {
                Some(MissingRequired {
                    dist_name: obj.dist_name.to_string(),
                    class: obj.class.clone(),
                    parameters,
                })
            }
        })
        .collect()
}
