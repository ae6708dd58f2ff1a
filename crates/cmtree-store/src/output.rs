//! Commit output writers
//!
//! Every file is written through a temp file and a rename, so a reader never
//! sees a partially written document.

use std::fs;
use std::path::{Path, PathBuf};

use cmtree_core::CommitOutput;

use crate::errors::{io_error, Result};

/// Where [`write_commit_output`] put each artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub document: PathBuf,
    pub script: PathBuf,
    pub summary: PathBuf,
}

impl OutputPaths {
    /// `<dir>/<stem>.xml`, `<dir>/<stem>.cli` and `<dir>/<stem>.md`
    pub fn new(dir: &Path, stem: &str) -> Self {
        Self {
            document: dir.join(format!("{}.xml", stem)),
            script: dir.join(format!("{}.cli", stem)),
            summary: dir.join(format!("{}.md", stem)),
        }
    }
}

/// Atomically write bytes to a file
///
/// Uses temp file + rename to ensure atomic write
pub fn atomic_write(target_path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = target_path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_error("create_output_dir", e))?;
    }

    let temp_path = target_path.with_extension("tmp");
    fs::write(&temp_path, content).map_err(|e| io_error("write_output_temp", e))?;
    fs::rename(&temp_path, target_path).map_err(|e| io_error("rename_output_temp", e))?;

    Ok(())
}

/// Write the document, script and summary of a commit under `dir`
pub fn write_commit_output(dir: &Path, stem: &str, output: &CommitOutput) -> Result<OutputPaths> {
    let paths = OutputPaths::new(dir, stem);
    atomic_write(&paths.document, output.document.as_bytes())?;
    atomic_write(&paths.script, output.script.as_bytes())?;
    atomic_write(&paths.summary, output.summary.as_bytes())?;

    tracing::debug!(
        document = %paths.document.display(),
        digest = output.digest.as_str(),
        "commit output written"
    );
    Ok(paths)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_atomic_write_creates_parent() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("subdir").join("plan.xml");

        atomic_write(&target, b"nested").unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"nested");
    }

    #[test]
    fn test_no_tmp_files_after_write() {
        let temp_dir = TempDir::new().unwrap();
        atomic_write(&temp_dir.path().join("plan.xml"), b"x").unwrap();

        let leftovers: Vec<_> = fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_output_paths_share_stem() {
        let paths = OutputPaths::new(Path::new("/out"), "plan");
        assert_eq!(paths.document, Path::new("/out/plan.xml"));
        assert_eq!(paths.script, Path::new("/out/plan.cli"));
        assert_eq!(paths.summary, Path::new("/out/plan.md"));
    }
}
