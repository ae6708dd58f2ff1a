//! Schema catalog loader
//!
//! The catalog is a JSON document deserialized straight into
//! [`StaticCatalog`]. After parsing, the root class must be declared and
//! every declared child class must itself be declared.

use std::fs;
use std::path::Path;

use cmtree_core::schema::{SchemaCatalog, StaticCatalog};

use crate::errors::{file_error, parse_error, Result};

/// Load a schema catalog from a JSON file
pub fn load_catalog(path: &Path) -> Result<StaticCatalog> {
    let content = fs::read_to_string(path).map_err(|e| file_error("load_catalog", path, e))?;
    parse_catalog_str(&content)
}

/// Parse a schema catalog from JSON text
pub fn parse_catalog_str(content: &str) -> Result<StaticCatalog> {
    let catalog: StaticCatalog = serde_json::from_str(content)
        .map_err(|e| parse_error("load_catalog", format!("catalog JSON parse error: {}", e)))?;
    validate_catalog(&catalog)?;

    tracing::debug!(
        root_class = catalog.root_class(),
        class_count = catalog.classes.len(),
        "schema catalog loaded"
    );
    Ok(catalog)
}

fn validate_catalog(catalog: &StaticCatalog) -> Result<()> {
    if catalog.root_class.trim().is_empty() {
        return Err(parse_error("load_catalog", "catalog has no root class"));
    }
    if !catalog.has_class(&catalog.root_class) {
        return Err(parse_error(
            "load_catalog",
            format!("root class {} is not declared", catalog.root_class),
        ));
    }
    for (class, schema) in &catalog.classes {
        if let Some(child) = schema.children.iter().find(|c| !catalog.has_class(c)) {
            return Err(parse_error(
                "load_catalog",
                format!("class {} declares undeclared child {}", class, child),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use cmtree_core::errors::ExErrorKind;

    #[test]
    fn test_parse_minimal_catalog() {
        let catalog = parse_catalog_str(
            r#"{
                "root_class": "ROOT",
                "versions": {"default": "1.0"},
                "classes": {
                    "ROOT": {"children": ["A"]},
                    "A": {"params": {"aId": {"type": "int", "range": "1...4, step 1"}}}
                }
            }"#,
        )
        .unwrap();
        assert!(catalog.is_child_allowed("ROOT", "A"));
        assert_eq!(catalog.id_range("A").map(|r| r.max), Some(4));
        assert_eq!(catalog.resolve_version("A"), "1.0");
    }

    #[test]
    fn test_undeclared_root_is_rejected() {
        let err = parse_catalog_str(r#"{"root_class": "ROOT", "classes": {}}"#).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Serialization);
        assert!(err.message().contains("ROOT"));
    }

    #[test]
    fn test_undeclared_child_is_rejected() {
        let err = parse_catalog_str(
            r#"{"root_class": "ROOT", "classes": {"ROOT": {"children": ["GHOST"]}}}"#,
        )
        .unwrap_err();
        assert!(err.message().contains("GHOST"));
    }

    #[test]
    fn test_malformed_json_is_a_parse_error() {
        let err = parse_catalog_str("{ not json").unwrap_err();
        assert_eq!(err.op(), Some("load_catalog"));
    }
}
