//! Change-set output types.

use serde::{Deserialize, Serialize};

use crate::model::{DistName, ManagedObject, OperationTag};

/// How a change-set is derived from the live tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffMode {
    Snapshot,
    Coarse,
    Fine,
}

impl DiffMode {
    /// Whether the mode compares against a reference tree
    pub fn needs_reference(&self) -> bool {
        !matches!(self, DiffMode::Snapshot)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DiffMode::Snapshot => "snapshot",
            DiffMode::Coarse => "coarse",
            DiffMode::Fine => "fine",
        }
    }
}

impl std::str::FromStr for DiffMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "snapshot" => Ok(DiffMode::Snapshot),
            "coarse" => Ok(DiffMode::Coarse),
            "fine" => Ok(DiffMode::Fine),
            other => Err(format!("unknown diff mode '{}'", other)),
        }
    }
}

impl std::fmt::Display for DiffMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One object of a change-set
///
/// `object` is the full final state; its `operation` always equals `tag`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEntry {
    pub tag: OperationTag,
    pub object: ManagedObject,
}

impl ChangeEntry {
    pub fn new(tag: OperationTag, object: &ManagedObject) -> Self {
        Self {
            tag,
            object: object.clone().with_operation(tag),
        }
    }

    pub fn dist_name(&self) -> &DistName {
        &self.object.dist_name
    }
}

/// Ordered change-set, produced once per commit and never mutated after
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Changeset {
    pub mode: DiffMode,
    pub entries: Vec<ChangeEntry>,
}

impl Changeset {
    pub fn new(mode: DiffMode, entries: Vec<ChangeEntry>) -> Self {
        Self { mode, entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, tag: OperationTag) -> usize {
        self.entries.iter().filter(|e| e.tag == tag).count()
    }

    pub fn dist_names(&self) -> Vec<&DistName> {
        self.entries.iter().map(ChangeEntry::dist_name).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChangeEntry> {
        self.entries.iter()
    }
}
