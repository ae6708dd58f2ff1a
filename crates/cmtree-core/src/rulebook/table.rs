use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Selector of the class-wide default entry
pub const DEFAULT_SELECTOR: &str = "__default__";

/// One rule value: a scalar with metadata, or a list descriptor
///
/// A list descriptor has `type: "list"` and ordered `children`, each child a
/// map of field name to a scalar rule value. Fields other than `type`,
/// `value` and `children` are metadata and ignored.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RuleValue {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<IndexMap<String, RuleValue>>,
}

impl RuleValue {
    pub fn scalar(value: impl Into<String>) -> Self {
        Self {
            value: Some(serde_json::Value::String(value.into())),
            ..Self::default()
        }
    }

    pub fn list(children: Vec<IndexMap<String, RuleValue>>) -> Self {
        Self {
            kind: Some("list".to_string()),
            value: None,
            children,
        }
    }

    pub fn is_list(&self) -> bool {
        self.kind
            .as_deref()
            .is_some_and(|k| k.eq_ignore_ascii_case("list"))
    }

    /// Value as document text; absent and `null` yield `None`
    pub fn value_text(&self) -> Option<String> {
        match self.value.as_ref()? {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// Parameter name to rule value, in application order
pub type RuleObject = IndexMap<String, RuleValue>;

/// `class -> selector -> rule object`
///
/// A selector is an instance id, the placeholder id, [`DEFAULT_SELECTOR`], a
/// sentinel key, or a templated path fragment ending in `CLASS-id`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleTable {
    pub classes: BTreeMap<String, BTreeMap<String, RuleObject>>,
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn class_rules(&self, class: &str) -> Option<&BTreeMap<String, RuleObject>> {
        self.classes.get(class)
    }

    pub fn insert(&mut self, class: &str, selector: &str, rule: RuleObject) {
        self.classes
            .entry(class.to_string())
            .or_default()
            .insert(selector.to_string(), rule);
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
