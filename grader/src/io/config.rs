//! Grader configuration stored in `grader.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = "grader.toml";

/// How the session picks a level when none is selected.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LevelSelection {
    /// List levels and ask for an index or name.
    #[default]
    Prompt,
    /// Pick a level at random without asking.
    Random,
}

/// Grader configuration (TOML).
///
/// Relative paths are resolved against the root directory passed on the
/// command line. Missing fields default to the conventional layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GraderConfig {
    /// Root of the exercise catalog (`<level>/<exercise>/...`).
    pub tasks_dir: PathBuf,

    /// Staging directory holding the single candidate solution.
    pub solutions_dir: PathBuf,

    pub build_dir: PathBuf,

    pub traces_dir: PathBuf,

    /// Description file name inside an exercise directory.
    pub description_file: PathBuf,

    /// Expected-output path relative to an exercise directory.
    pub expected_output: PathBuf,

    /// File name of the compiled program inside the build directory.
    pub executable_name: String,

    pub level_selection: LevelSelection,
}

impl Default for GraderConfig {
    fn default() -> Self {
        Self {
            tasks_dir: PathBuf::from("tasks/subjects"),
            solutions_dir: PathBuf::from("solutions"),
            build_dir: PathBuf::from("build"),
            traces_dir: PathBuf::from("traces"),
            description_file: PathBuf::from("subject.txt"),
            expected_output: PathBuf::from("output/output.txt"),
            executable_name: "program.out".to_string(),
            level_selection: LevelSelection::Prompt,
        }
    }
}

impl GraderConfig {
    pub fn validate(&self) -> Result<()> {
        let paths = [
            ("tasks_dir", &self.tasks_dir),
            ("solutions_dir", &self.solutions_dir),
            ("build_dir", &self.build_dir),
            ("traces_dir", &self.traces_dir),
            ("description_file", &self.description_file),
            ("expected_output", &self.expected_output),
        ];
        for (name, path) in paths {
            if path.as_os_str().is_empty() {
                return Err(anyhow!("{name} must be non-empty"));
            }
        }
        if self.executable_name.trim().is_empty() {
            return Err(anyhow!("executable_name must be non-empty"));
        }
        if self.executable_name.contains('/') || self.executable_name.contains('\\') {
            return Err(anyhow!("executable_name must not contain path separators"));
        }
        if self.build_dir == self.solutions_dir || self.build_dir == self.traces_dir {
            return Err(anyhow!("build_dir must differ from solutions_dir and traces_dir"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `GraderConfig::default()`.
pub fn load_config(path: &Path) -> Result<GraderConfig> {
    if !path.exists() {
        let cfg = GraderConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: GraderConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &GraderConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
