//! Directory-backed template expander
//!
//! A template is a plain command script. For class `A` and variant `basic`
//! the expander reads `<dir>/A/basic.cli` when it exists, otherwise
//! `<dir>/basic.cli`.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use cmtree_core::TemplateExpander;

/// File extension of template scripts
pub const TEMPLATE_EXTENSION: &str = "cli";

#[derive(Debug, Clone)]
pub struct DirTemplateExpander {
    dir: PathBuf,
}

impl DirTemplateExpander {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn candidates(&self, class: &str, variant_key: &str) -> [PathBuf; 2] {
        let file = format!("{}.{}", variant_key, TEMPLATE_EXTENSION);
        [self.dir.join(class).join(&file), self.dir.join(&file)]
    }
}

impl TemplateExpander for DirTemplateExpander {
    fn expand(&self, class: &str, variant_key: &str) -> Option<Vec<String>> {
        for path in self.candidates(class, variant_key) {
            match fs::read_to_string(&path) {
                Ok(text) => return Some(text.lines().map(str::to_string).collect()),
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "template unreadable"
                    );
                    return None;
                }
            }
        }
        None
    }
}
