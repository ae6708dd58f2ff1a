use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{ParameterMeta, SchemaCatalog};
use crate::model::DistName;

/// Declaration of one class
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClassSchema {
    #[serde(default)]
    pub children: Vec<String>,
    #[serde(default)]
    pub params: IndexMap<String, ParameterMeta>,
}

/// Version strings per class with a fallback
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VersionTable {
    #[serde(default)]
    pub default: String,
    #[serde(default)]
    pub classes: BTreeMap<String, String>,
}

/// How classes are qualified in the canonical document
///
/// The root object uses `root`. Every other object is qualified by the
/// branch it lives under (the class of the second path segment, lowercased):
/// an entry in `branches` wins, otherwise `{branch_prefix}.{branch}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NamespaceTable {
    #[serde(default)]
    pub root: Option<String>,
    #[serde(default)]
    pub branch_prefix: Option<String>,
    #[serde(default)]
    pub branches: BTreeMap<String, String>,
}

/// In-memory catalog deserialized from a JSON document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StaticCatalog {
    pub root_class: String,
    #[serde(default)]
    pub versions: VersionTable,
    #[serde(default)]
    pub namespaces: NamespaceTable,
    #[serde(default)]
    pub classes: IndexMap<String, ClassSchema>,
}

impl StaticCatalog {
    pub fn new(root_class: impl Into<String>) -> Self {
        Self {
            root_class: root_class.into(),
            ..Self::default()
        }
    }

    /// Builder used by fixtures: declare `class` with its children
    pub fn with_class<I, S>(mut self, class: &str, children: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entry = self.classes.entry(class.to_string()).or_default();
        entry.children = children.into_iter().map(Into::into).collect();
        self
    }

    /// Builder used by fixtures: declare one parameter of `class`
    pub fn with_param(mut self, class: &str, name: &str, meta: ParameterMeta) -> Self {
        self.classes
            .entry(class.to_string())
            .or_default()
            .params
            .insert(name.to_string(), meta);
        self
    }

    pub fn with_default_version(mut self, version: impl Into<String>) -> Self {
        self.versions.default = version.into();
        self
    }
}

impl SchemaCatalog for StaticCatalog {
    fn root_class(&self) -> &str {
        &self.root_class
    }

    fn has_class(&self, class: &str) -> bool {
        self.classes.contains_key(class)
    }

    fn children_of(&self, class: &str) -> Vec<&str> {
        self.classes
            .get(class)
            .map(|c| c.children.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    fn parameter_metadata(&self, class: &str, name: &str) -> Option<&ParameterMeta> {
        self.classes.get(class)?.params.get(name)
    }

    fn parameters_of(&self, class: &str) -> Vec<(&str, &ParameterMeta)> {
        self.classes
            .get(class)
            .map(|c| c.params.iter().map(|(k, v)| (k.as_str(), v)).collect())
            .unwrap_or_default()
    }

    fn resolve_version(&self, class: &str) -> String {
        self.versions
            .classes
            .get(class)
            .cloned()
            .unwrap_or_else(|| self.versions.default.clone())
    }

    fn namespace_for(&self, path: &DistName) -> Option<String> {
        let segments = path.segments();
        if segments.len() <= 1 {
            return self.namespaces.root.clone();
        }
        let branch = segments[1].class.to_lowercase();
        if let Some(ns) = self.namespaces.branches.get(&branch) {
            return Some(ns.clone());
        }
        self.namespaces
            .branch_prefix
            .as_ref()
            .map(|prefix| format!("{}.{}", prefix, branch))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn catalog() -> StaticCatalog {
        serde_json::from_str(
            r#"{
                "root_class": "ROOT",
                "versions": {"default": "V2", "classes": {"ROOT": "V1"}},
                "namespaces": {
                    "root": "com.vendor.root",
                    "branch_prefix": "com.vendor.root",
                    "branches": {"legacy": "LEGACY"}
                },
                "classes": {
                    "ROOT": {"children": ["A", "LEGACY"]},
                    "A": {"children": ["B"], "params": {"aId": {"type": "int", "range": "1...10, step 1"}}},
                    "B": {"params": {"x": {"type": "int"}}}
                }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_children_and_parameters() {
        let c = catalog();
        assert!(c.is_child_allowed("ROOT", "A"));
        assert!(!c.is_child_allowed("ROOT", "B"));
        assert!(c.children_of("NOPE").is_empty());
        assert!(c.parameter_metadata("B", "x").is_some());
        assert_eq!(c.id_range("A").map(|r| r.max), Some(10));
        assert!(c.id_range("B").is_none());
    }

    #[test]
    fn test_versions_fall_back_to_default() {
        let c = catalog();
        assert_eq!(c.resolve_version("ROOT"), "V1");
        assert_eq!(c.resolve_version("B"), "V2");
    }

    #[test]
    fn test_namespace_by_branch() {
        let c = catalog();
        let root = DistName::parse("ROOT-1").unwrap();
        let a = DistName::parse("ROOT-1/A-1/B-1").unwrap();
        let legacy = DistName::parse("ROOT-1/LEGACY-1").unwrap();
        assert_eq!(c.namespace_for(&root).as_deref(), Some("com.vendor.root"));
        assert_eq!(c.namespace_for(&a).as_deref(), Some("com.vendor.root.a"));
        assert_eq!(c.namespace_for(&legacy).as_deref(), Some("LEGACY"));
    }
}
