//! Session configuration
//!
//! Everything that tailors one editing session to a device family without
//! touching the schema catalog or the rule table. All fields are optional
//! when deserialized.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Look up a reserved rule key instead of the instance id
///
/// Applies to `anchor_class` instances whose id is `anchor_id`, and to any
/// object of a `dependents` class created beneath such an instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentinelRule {
    pub anchor_class: String,
    pub anchor_id: String,
    #[serde(default)]
    pub dependents: Vec<String>,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Id token standing for "this element's root id"
    pub placeholder_id: String,

    /// Classes besides the root class whose id mirrors the root id
    pub root_id_classes: Vec<String>,

    /// Keywords accepted in place of the root class
    pub root_aliases: Vec<String>,

    /// Requested class to the variant class actually created
    pub class_substitutions: BTreeMap<String, String>,

    /// Classes whose creation expands a template, with the variant key to expand
    pub templates: BTreeMap<String, String>,

    pub sentinels: Vec<SentinelRule>,

    /// Classes the rulebook never populates
    pub rulebook_exempt: Vec<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            placeholder_id: "000".to_string(),
            root_id_classes: Vec::new(),
            root_aliases: Vec::new(),
            class_substitutions: BTreeMap::new(),
            templates: BTreeMap::new(),
            sentinels: Vec::new(),
            rulebook_exempt: Vec::new(),
        }
    }
}

impl SessionConfig {
    /// Whether ids of `class` mirror the root id (the root class always does)
    pub fn mirrors_root_id(&self, class: &str, root_class: &str) -> bool {
        class == root_class || self.root_id_classes.iter().any(|c| c == class)
    }

    pub fn is_rulebook_exempt(&self, class: &str) -> bool {
        self.rulebook_exempt.iter().any(|c| c == class)
    }

    pub fn substitute_class<'a>(&'a self, class: &'a str) -> &'a str {
        self.class_substitutions
            .get(class)
            .map(String::as_str)
            .unwrap_or(class)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_fields_missing() {
        let cfg: SessionConfig = serde_json::from_str(r#"{"root_id_classes": ["CHILD"]}"#).unwrap();
        assert_eq!(cfg.placeholder_id, "000");
        assert!(cfg.mirrors_root_id("CHILD", "ROOT"));
        assert!(cfg.mirrors_root_id("ROOT", "ROOT"));
        assert!(!cfg.mirrors_root_id("OTHER", "ROOT"));
    }

    #[test]
    fn test_class_substitution() {
        let mut cfg = SessionConfig::default();
        cfg.class_substitutions
            .insert("RMOD".to_string(), "ASIRMOD".to_string());
        assert_eq!(cfg.substitute_class("RMOD"), "ASIRMOD");
        assert_eq!(cfg.substitute_class("CELL"), "CELL");
    }
}
