//! Baseline loader
//!
//! A baseline is a canonical XML document describing the device as it is.
//! Objects keep the class namespace and version they were exported with.

use std::fs;
use std::path::Path;

use cmtree_core::document::parse_document;
use cmtree_core::ConfigTree;

use crate::errors::{file_error, from_core, Result};

/// Load a baseline tree from an XML file
pub fn load_baseline(path: &Path) -> Result<ConfigTree> {
    let content = fs::read_to_string(path).map_err(|e| file_error("load_baseline", path, e))?;
    parse_baseline_str(&content)
}

/// Parse a baseline tree from XML text
pub fn parse_baseline_str(content: &str) -> Result<ConfigTree> {
    let objects = parse_document(content).map_err(|e| from_core("load_baseline", e))?;
    let tree = ConfigTree::from_objects(objects).map_err(|e| from_core("load_baseline", e))?;
    tracing::debug!(object_count = tree.len(), "baseline loaded");
    Ok(tree)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use cmtree_core::errors::ExErrorKind;
    use cmtree_core::DistName;

    const BASELINE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<raml version="2.0" xmlns="raml20.xsd">
  <cmData type="plan">
    <managedObject class="ROOT" distName="ROOT-1" version="1.0"/>
    <managedObject class="vendor.a:A" distName="ROOT-1/A-1" version="1.0">
      <p name="x">10</p>
    </managedObject>
  </cmData>
</raml>
"#;

    #[test]
    fn test_parse_baseline() {
        let tree = parse_baseline_str(BASELINE).unwrap();
        assert_eq!(tree.len(), 2);
        let a = tree.find(&DistName::parse("ROOT-1/A-1").unwrap()).unwrap();
        assert_eq!(a.class, "A");
        assert_eq!(a.parameter("x"), Some("10"));
    }

    #[test]
    fn test_orphan_is_rejected_with_context() {
        let orphan = BASELINE.replace("distName=\"ROOT-1\"", "distName=\"ROOT-2\"");
        let err = parse_baseline_str(&orphan).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::InvalidInput);
        assert_eq!(err.op(), Some("load_baseline"));
        assert_eq!(err.dist_name(), Some("ROOT-1/A-1"));
    }
}
