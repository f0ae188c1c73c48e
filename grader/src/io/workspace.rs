//! Ephemeral working directories.
//!
//! Staging, build and trace directories are cleared in place: their contents
//! are removed, the directories themselves stay.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use super::config::GraderConfig;

/// All directories the grader reads or writes, resolved against a root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspacePaths {
    pub root: PathBuf,
    pub tasks_dir: PathBuf,
    pub solutions_dir: PathBuf,
    pub build_dir: PathBuf,
    pub traces_dir: PathBuf,
}

impl WorkspacePaths {
    pub fn new(root: impl Into<PathBuf>, cfg: &GraderConfig) -> Self {
        let root = root.into();
        Self {
            tasks_dir: root.join(&cfg.tasks_dir),
            solutions_dir: root.join(&cfg.solutions_dir),
            build_dir: root.join(&cfg.build_dir),
            traces_dir: root.join(&cfg.traces_dir),
            root,
        }
    }

    /// Directories cleared by [`reset_all`], in clearing order.
    pub fn ephemeral_dirs(&self) -> [&Path; 3] {
        [
            self.solutions_dir.as_path(),
            self.build_dir.as_path(),
            self.traces_dir.as_path(),
        ]
    }
}

/// Create staging, build and trace directories if missing.
pub fn ensure_dirs(paths: &WorkspacePaths) -> Result<()> {
    for dir in paths.ephemeral_dirs() {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    Ok(())
}

/// Clear staging, build and trace directories.
///
/// Missing directories are skipped.
pub fn reset_all(paths: &WorkspacePaths) -> Result<()> {
    let mut removed = 0;
    for dir in paths.ephemeral_dirs() {
        removed += clear_dir_contents(dir)?;
    }
    info!(removed, "workspaces reset");
    Ok(())
}

/// Clear only the build directory.
pub fn reset_build(paths: &WorkspacePaths) -> Result<()> {
    let removed = clear_dir_contents(&paths.build_dir)?;
    debug!(removed, "build directory reset");
    Ok(())
}

/// Remove every entry inside `dir`, keeping `dir` itself.
///
/// Returns the number of top-level entries removed; a missing directory
/// removes nothing.
pub fn clear_dir_contents(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }
    let mut removed = 0;
    for entry in fs::read_dir(dir).with_context(|| format!("read {}", dir.display()))? {
        let entry = entry.context("read entry")?;
        let path = entry.path();
        let file_type = entry
            .file_type()
            .with_context(|| format!("stat {}", path.display()))?;
        if file_type.is_dir() {
            fs::remove_dir_all(&path).with_context(|| format!("remove {}", path.display()))?;
        } else {
            fs::remove_file(&path).with_context(|| format!("remove {}", path.display()))?;
        }
        removed += 1;
    }
    Ok(removed)
}
