//! Exercise catalog: levels, exercises and random selection.
//!
//! Layout: `<tasks_dir>/<level>/<exercise>/` with an optional description
//! file and an optional expected-output file inside each exercise.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use rand::seq::SliceRandom;

use super::config::GraderConfig;

/// A selected exercise with its resolved artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exercise {
    pub level: String,
    pub name: String,
    pub dir: PathBuf,
    /// Trimmed description text, if the description file exists.
    pub description: Option<String>,
    /// Expected-output path, if the file exists.
    pub expected_output: Option<PathBuf>,
}

impl Exercise {
    /// Identifier used in trace names and reports (`<level>_<exercise>`).
    pub fn subject(&self) -> String {
        format!("{}_{}", self.level, self.name)
    }
}

/// Source of choices among levels and exercises.
pub trait Selector {
    /// Pick one element of `items`, or `None` when `items` is empty.
    fn pick(&mut self, items: &[String]) -> Option<String>;
}

/// Uniform random choice backed by the thread-local RNG.
#[derive(Debug, Default)]
pub struct RandomSelector;

impl Selector for RandomSelector {
    fn pick(&mut self, items: &[String]) -> Option<String> {
        items.choose(&mut rand::thread_rng()).cloned()
    }
}

/// Immediate subdirectories of `tasks_dir`, sorted by name.
pub fn list_levels(tasks_dir: &Path) -> Result<Vec<String>> {
    list_subdirs(tasks_dir)
}

/// Immediate subdirectories of a level, sorted by name.
pub fn list_exercises(tasks_dir: &Path, level: &str) -> Result<Vec<String>> {
    list_subdirs(&tasks_dir.join(level))
}

/// Resolve an exercise directory and read its description.
pub fn load_exercise(
    tasks_dir: &Path,
    level: &str,
    name: &str,
    cfg: &GraderConfig,
) -> Result<Exercise> {
    let dir = tasks_dir.join(level).join(name);
    if !dir.is_dir() {
        bail!("exercise {level}/{name} not found at {}", dir.display());
    }

    let description_path = dir.join(&cfg.description_file);
    let description = if description_path.is_file() {
        let text = fs::read_to_string(&description_path)
            .with_context(|| format!("read {}", description_path.display()))?;
        Some(text.trim().to_string())
    } else {
        None
    };

    let expected_path = dir.join(&cfg.expected_output);
    let expected_output = expected_path.is_file().then_some(expected_path);

    Ok(Exercise {
        level: level.to_string(),
        name: name.to_string(),
        dir,
        description,
        expected_output,
    })
}

fn list_subdirs(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("read {}", dir.display()))? {
        let entry = entry.context("read entry")?;
        if entry.path().is_dir() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
    }
    names.sort();
    Ok(names)
}
