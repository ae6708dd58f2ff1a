use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::list_value::ListValue;
use super::path::DistName;

/// Change intent carried by an object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationTag {
    Create,
    Update,
    Delete,
}

impl OperationTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationTag::Create => "create",
            OperationTag::Update => "update",
            OperationTag::Delete => "delete",
        }
    }

    /// Parse the document attribute form; unknown values yield `None`
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "create" => Some(OperationTag::Create),
            "update" => Some(OperationTag::Update),
            "delete" => Some(OperationTag::Delete),
            _ => None,
        }
    }
}

impl std::fmt::Display for OperationTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed, addressable configuration object
///
/// `class` is the bare class name; `namespace` is the vendor qualifier the
/// document writes in front of it (`namespace:class`). Parameters and lists
/// keep first-insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagedObject {
    pub class: String,
    pub namespace: Option<String>,
    pub dist_name: DistName,
    pub version: String,
    pub operation: Option<OperationTag>,
    pub parameters: IndexMap<String, String>,
    pub lists: IndexMap<String, ListValue>,
}

impl ManagedObject {
    pub fn new(
        class: impl Into<String>,
        namespace: Option<String>,
        dist_name: DistName,
        version: impl Into<String>,
    ) -> Self {
        Self {
            class: class.into(),
            namespace,
            dist_name,
            version: version.into(),
            operation: None,
            parameters: IndexMap::new(),
            lists: IndexMap::new(),
        }
    }

    /// Delete marker: identity only, no parameters or lists
    pub fn tombstone(
        class: impl Into<String>,
        namespace: Option<String>,
        dist_name: DistName,
        version: impl Into<String>,
    ) -> Self {
        let mut obj = Self::new(class, namespace, dist_name, version);
        obj.operation = Some(OperationTag::Delete);
        obj
    }

    pub fn with_operation(mut self, operation: OperationTag) -> Self {
        self.operation = Some(operation);
        self
    }

    pub fn is_tombstone(&self) -> bool {
        self.operation == Some(OperationTag::Delete)
    }

    /// `namespace:class`, or the bare class when no namespace is known
    pub fn qualified_class(&self) -> String {
        match &self.namespace {
            Some(ns) if !ns.is_empty() => format!("{}:{}", ns, self.class),
            _ => self.class.clone(),
        }
    }

    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).map(String::as_str)
    }

    /// Upsert; an existing parameter keeps its position
    pub fn set_parameter(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.parameters.insert(name.into(), value.into());
    }

    pub fn list(&self, name: &str) -> Option<&ListValue> {
        self.lists.get(name)
    }
}
