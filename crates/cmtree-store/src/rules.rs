//! Rule table loader
//!
//! The file is a JSON object. A top-level key that is a class name holds that
//! class's selectors:
//!
//! ```json
//! { "B": { "__default__": { "x": { "value": 1 } } } }
//! ```
//!
//! A top-level key that is a path fragment (`.../CLASS-id`) is itself a
//! selector; it is filed under the class of its last segment.

use std::fs;
use std::path::Path;

use cmtree_core::model::PathSegment;
use cmtree_core::rulebook::{RuleObject, RuleTable};
use serde_json::{Map, Value};

use crate::errors::{file_error, parse_error, Result};

/// Load a rule table from a JSON file
pub fn load_rule_table(path: &Path) -> Result<RuleTable> {
    let content = fs::read_to_string(path).map_err(|e| file_error("load_rule_table", path, e))?;
    parse_rule_table_str(&content)
}

/// Parse a rule table from JSON text
pub fn parse_rule_table_str(content: &str) -> Result<RuleTable> {
    let root: Map<String, Value> = serde_json::from_str(content)
        .map_err(|e| parse_error("load_rule_table", format!("rule table JSON parse error: {}", e)))?;

    let mut table = RuleTable::new();
    let mut path_selectors = 0usize;
    for (key, value) in root {
        match path_class(&key) {
            Some(class) => {
                let rule = rule_object(&key, value)?;
                table.insert(&class, &key, rule);
                path_selectors += 1;
            }
            None => {
                let selectors: Map<String, Value> = serde_json::from_value(value).map_err(|e| {
                    parse_error("load_rule_table", format!("class {}: {}", key, e))
                })?;
                for (selector, rule) in selectors {
                    let rule = rule_object(&selector, rule)?;
                    table.insert(&key, &selector, rule);
                }
            }
        }
    }

    tracing::debug!(
        class_count = table.classes.len(),
        path_selectors,
        "rule table loaded"
    );
    Ok(table)
}

/// Class of the last segment when `key` reads as a path fragment
fn path_class(key: &str) -> Option<String> {
    let last = key.rsplit('/').next()?;
    if !key.contains('/') && !last.contains('-') {
        return None;
    }
    PathSegment::parse(last).ok().map(|segment| segment.class)
}

fn rule_object(selector: &str, value: Value) -> Result<RuleObject> {
    serde_json::from_value(value)
        .map_err(|e| parse_error("load_rule_table", format!("selector {}: {}", selector, e)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use cmtree_core::rulebook::DEFAULT_SELECTOR;

    #[test]
    fn test_nested_and_flat_keys_merge_by_class() {
        let table = parse_rule_table_str(
            r#"{
                "B": {"__default__": {"x": {"value": 1}}},
                "ROOT-000/A-1/B-2": {"x": {"value": 2}}
            }"#,
        )
        .unwrap();
        let b = table.class_rules("B").unwrap();
        assert_eq!(b.len(), 2);
        assert_eq!(
            b[DEFAULT_SELECTOR]["x"].value_text().as_deref(),
            Some("1")
        );
        assert_eq!(
            b["ROOT-000/A-1/B-2"]["x"].value_text().as_deref(),
            Some("2")
        );
    }

    #[test]
    fn test_path_class_detection() {
        assert_eq!(path_class("A-1/B-2").as_deref(), Some("B"));
        assert_eq!(path_class("B-2").as_deref(), Some("B"));
        assert_eq!(path_class("B"), None);
    }

    #[test]
    fn test_bad_rule_value_names_selector() {
        let err = parse_rule_table_str(r#"{"B": {"7": {"x": {"children": 3}}}}"#).unwrap_err();
        assert!(err.message().contains("selector 7"));
    }
}
