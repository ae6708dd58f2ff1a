//! Schema catalog seam
//!
//! The catalog is external, read-only reference data: which classes may nest
//! under which, what parameters each class declares, and how classes are
//! versioned and namespaced in the canonical document. The core only sees it
//! through [`SchemaCatalog`]; [`StaticCatalog`] is the serde-backed
//! implementation loaded from JSON.

pub mod catalog;

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

use crate::model::DistName;

pub use catalog::{ClassSchema, NamespaceTable, StaticCatalog, VersionTable};

/// Read-only view of the per-class schema
pub trait SchemaCatalog {
    /// Class every tree is rooted at
    fn root_class(&self) -> &str;

    fn has_class(&self, class: &str) -> bool;

    /// Declared child classes of `class` (empty for unknown classes)
    fn children_of(&self, class: &str) -> Vec<&str>;

    fn parameter_metadata(&self, class: &str, name: &str) -> Option<&ParameterMeta>;

    /// All declared parameters of `class` in catalog order
    fn parameters_of(&self, class: &str) -> Vec<(&str, &ParameterMeta)>;

    fn resolve_version(&self, class: &str) -> String;

    /// Vendor namespace for an object at `path`
    fn namespace_for(&self, path: &DistName) -> Option<String>;

    fn is_child_allowed(&self, parent_class: &str, child_class: &str) -> bool {
        self.children_of(parent_class).contains(&child_class)
    }

    /// Declared id domain, read from the `<class>Id` parameter
    fn id_range(&self, class: &str) -> Option<IdRange> {
        self.parameter_metadata(class, &id_parameter_name(class))
            .and_then(ParameterMeta::range)
    }
}

/// Name of the parameter that declares a class's id domain
pub fn id_parameter_name(class: &str) -> String {
    format!("{}Id", class.to_lowercase())
}

/// Per-parameter metadata
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParameterMeta {
    /// Type tag; `"list"` marks a list parameter
    #[serde(rename = "type", default)]
    pub kind: String,

    #[serde(default, deserialize_with = "flexible_bool")]
    pub required: bool,

    /// Numeric domain in `min...max, step s` form
    #[serde(default)]
    pub range: Option<String>,

    #[serde(default)]
    pub default: Option<serde_json::Value>,

    /// Allowed field names for list parameters
    #[serde(default)]
    pub children: Vec<String>,
}

impl ParameterMeta {
    pub fn is_list(&self) -> bool {
        self.kind.eq_ignore_ascii_case("list")
    }

    pub fn range(&self) -> Option<IdRange> {
        self.range.as_deref().and_then(IdRange::parse)
    }

    /// Default rendered as document text; `null` and absent yield `None`
    pub fn default_text(&self) -> Option<String> {
        match self.default.as_ref()? {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Whether `field` is a declared field of this list
    pub fn allows_field(&self, field: &str) -> bool {
        self.children.iter().any(|c| c == field)
    }
}

fn flexible_bool<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Bool(b) => b,
        serde_json::Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "yes" | "1"),
        serde_json::Value::Number(n) => n.as_i64().is_some_and(|v| v != 0),
        _ => false,
    })
}

/// Numeric domain `[min, max]` restricted to multiples of `step`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdRange {
    pub min: i64,
    pub max: i64,
    pub step: i64,
}

fn range_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^\s*(-?\d+)\s*\.\.\.\s*(-?\d+)\s*,\s*step\s+(\d+)\s*$").ok())
        .as_ref()
}

impl IdRange {
    /// Parse `min...max, step s`; anything else yields `None`
    pub fn parse(text: &str) -> Option<Self> {
        let caps = range_pattern()?.captures(text)?;
        let min = caps.get(1)?.as_str().parse().ok()?;
        let max = caps.get(2)?.as_str().parse().ok()?;
        let step = caps.get(3)?.as_str().parse().ok()?;
        Some(Self { min, max, step })
    }

    pub fn contains(&self, value: i64) -> bool {
        let step = self.step.max(1);
        value >= self.min && value <= self.max && value.rem_euclid(step) == 0
    }
}

impl std::fmt::Display for IdRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}...{}, step {}", self.min, self.max, self.step)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_range_parse() {
        let r = IdRange::parse("1...10, step 2").unwrap();
        assert_eq!(r, IdRange { min: 1, max: 10, step: 2 });
        assert_eq!(r.to_string(), "1...10, step 2");
        assert!(IdRange::parse("1..10").is_none());
        assert!(IdRange::parse("a...b, step 1").is_none());
    }

    #[test]
    fn test_range_contains_respects_step() {
        let even = IdRange::parse("1...10, step 2").unwrap();
        assert!(even.contains(2));
        assert!(even.contains(10));
        assert!(!even.contains(5));
        assert!(!even.contains(1));
        assert!(!even.contains(12));
        let any = IdRange::parse("1...10, step 1").unwrap();
        assert!(any.contains(5));
        assert!(!any.contains(0));
        let signed = IdRange::parse("-6...6, step 3").unwrap();
        assert!(signed.contains(-3));
        assert!(!signed.contains(-4));
    }

    #[test]
    fn test_id_parameter_name() {
        assert_eq!(id_parameter_name("LNCEL"), "lncelId");
    }

    #[test]
    fn test_parameter_meta_flexible_fields() {
        let meta: ParameterMeta = serde_json::from_str(
            r#"{"type": "int", "required": "true", "default": 5, "range": "0...7, step 1"}"#,
        )
        .unwrap();
        assert!(meta.required);
        assert!(!meta.is_list());
        assert_eq!(meta.default_text().as_deref(), Some("5"));
        assert_eq!(meta.range().map(|r| r.max), Some(7));

        let list: ParameterMeta =
            serde_json::from_str(r#"{"type": "list", "children": ["a", "b"], "default": null}"#)
                .unwrap();
        assert!(list.is_list());
        assert!(list.allows_field("a"));
        assert!(!list.allows_field("c"));
        assert_eq!(list.default_text(), None);
    }
}
