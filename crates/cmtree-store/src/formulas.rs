//! Formula catalog loader
//!
//! A flat JSON object keyed by `Class::parameter`. A value is either the
//! formula text or an object with `formula` and an optional `default`:
//!
//! ```json
//! {
//!   "B::x": "(UI_VALUE + 140) * 2 / 1",
//!   "B::level": { "formula": "(UI_VALUE - 3) * 1 / 10", "default": "0" }
//! }
//! ```
//!
//! Formula text is not checked here; a malformed formula surfaces as a
//! translation diagnostic when it is first used.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use cmtree_core::{FormulaCatalog, FormulaEntry};
use serde::Deserialize;

use crate::errors::{file_error, parse_error, Result};

/// Separator between class and parameter in catalog keys
pub const KEY_SEPARATOR: &str = "::";

#[derive(Deserialize)]
#[serde(untagged)]
enum RawEntry {
    Formula(String),
    Full(FormulaEntry),
}

/// Load a formula catalog from a JSON file
pub fn load_formula_catalog(path: &Path) -> Result<FormulaCatalog> {
    let content =
        fs::read_to_string(path).map_err(|e| file_error("load_formula_catalog", path, e))?;
    parse_formula_catalog_str(&content)
}

/// Parse a formula catalog from JSON text
pub fn parse_formula_catalog_str(content: &str) -> Result<FormulaCatalog> {
    let raw: BTreeMap<String, RawEntry> = serde_json::from_str(content).map_err(|e| {
        parse_error(
            "load_formula_catalog",
            format!("formula catalog JSON parse error: {}", e),
        )
    })?;

    let mut catalog = FormulaCatalog::new();
    for (key, entry) in raw {
        let (class, name) = key
            .split_once(KEY_SEPARATOR)
            .filter(|(c, n)| !c.is_empty() && !n.is_empty())
            .ok_or_else(|| {
                parse_error(
                    "load_formula_catalog",
                    format!("key '{}' is not of the form Class{}parameter", key, KEY_SEPARATOR),
                )
            })?;
        let entry = match entry {
            RawEntry::Formula(formula) => FormulaEntry::new(formula),
            RawEntry::Full(entry) => entry,
        };
        catalog.insert(class, name, entry);
    }

    tracing::debug!(entry_count = catalog.len(), "formula catalog loaded");
    Ok(catalog)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_both_entry_shapes() {
        let catalog = parse_formula_catalog_str(
            r#"{
                "B::x": "(UI_VALUE + 140) * 2 / 1",
                "B::level": {"formula": "(UI_VALUE - 3) * 1 / 10", "default": "0"}
            }"#,
        )
        .unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(
            catalog.get("B", "x").map(|e| e.formula.as_str()),
            Some("(UI_VALUE + 140) * 2 / 1")
        );
        assert_eq!(
            catalog.get("B", "level").and_then(|e| e.default.as_deref()),
            Some("0")
        );
    }

    #[test]
    fn test_key_without_separator_is_rejected() {
        let err = parse_formula_catalog_str(r#"{"Bx": "(UI_VALUE + 1) * 1 / 1"}"#).unwrap_err();
        assert!(err.message().contains("Bx"));
    }
}
