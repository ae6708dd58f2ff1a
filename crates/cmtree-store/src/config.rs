//! Session configuration loader (YAML)

use std::fs;
use std::path::Path;

use cmtree_core::SessionConfig;

use crate::errors::{file_error, parse_error, Result};

/// Load a session configuration from a YAML file
pub fn load_session_config(path: &Path) -> Result<SessionConfig> {
    let content =
        fs::read_to_string(path).map_err(|e| file_error("load_session_config", path, e))?;
    parse_session_config_str(&content)
}

/// Parse a session configuration from YAML text
///
/// An empty document yields the default configuration.
pub fn parse_session_config_str(content: &str) -> Result<SessionConfig> {
    if content.trim().is_empty() {
        return Ok(SessionConfig::default());
    }
    serde_yaml::from_str(content).map_err(|e| {
        parse_error(
            "load_session_config",
            format!("YAML parse error: {}", e),
        )
    })
}
