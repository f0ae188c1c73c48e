//! Test-only helpers: a temporary task tree and scripted trait fakes.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tempfile::TempDir;

use crate::io::catalog::{Exercise, Selector, load_exercise};
use crate::io::config::GraderConfig;
use crate::io::process::{CommandSpec, ProcessOutput, ProcessRunner};
use crate::io::workspace::{WorkspacePaths, ensure_dirs};

/// A grader root in a temporary directory with the default layout.
pub struct TaskTree {
    temp: TempDir,
    config: GraderConfig,
    paths: WorkspacePaths,
}

impl TaskTree {
    /// Create the root with empty tasks, staging, build and trace directories.
    pub fn new() -> Result<Self> {
        Self::with_config(GraderConfig::default())
    }

    pub fn with_config(config: GraderConfig) -> Result<Self> {
        let temp = tempfile::tempdir().context("tempdir")?;
        let paths = WorkspacePaths::new(temp.path(), &config);
        fs::create_dir_all(&paths.tasks_dir).context("create tasks dir")?;
        ensure_dirs(&paths)?;
        Ok(Self {
            temp,
            config,
            paths,
        })
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    pub fn config(&self) -> &GraderConfig {
        &self.config
    }

    pub fn paths(&self) -> &WorkspacePaths {
        &self.paths
    }

    /// Create an empty level directory.
    pub fn level(&self, level: &str) -> Result<PathBuf> {
        let dir = self.paths.tasks_dir.join(level);
        fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
        Ok(dir)
    }

    /// Create an exercise, optionally with an expected-output file.
    pub fn exercise(&self, level: &str, name: &str, expected: Option<&str>) -> Result<Exercise> {
        let dir = self.level(level)?.join(name);
        fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
        if let Some(expected) = expected {
            let path = dir.join(&self.config.expected_output);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, expected).with_context(|| format!("write {}", path.display()))?;
        }
        load_exercise(&self.paths.tasks_dir, level, name, &self.config)
    }

    pub fn describe(&self, level: &str, name: &str, description: &str) -> Result<()> {
        let path = self
            .paths
            .tasks_dir
            .join(level)
            .join(name)
            .join(&self.config.description_file);
        fs::write(&path, description).with_context(|| format!("write {}", path.display()))
    }

    /// Place a file in the solution staging directory.
    pub fn stage_solution(&self, file_name: &str, contents: &str) -> Result<PathBuf> {
        let path = self.paths.solutions_dir.join(file_name);
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
        Ok(path)
    }

    pub fn trace_files(&self) -> Result<Vec<PathBuf>> {
        list_files(&self.paths.traces_dir)
    }

    pub fn build_files(&self) -> Result<Vec<PathBuf>> {
        list_files(&self.paths.build_dir)
    }
}

fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("read {}", dir.display()))? {
        files.push(entry?.path());
    }
    files.sort();
    Ok(files)
}

/// Process runner returning queued outputs in order and recording every call.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    outputs: RefCell<VecDeque<ProcessOutput>>,
    calls: RefCell<Vec<CommandSpec>>,
}

impl ScriptedRunner {
    pub fn new(outputs: Vec<ProcessOutput>) -> Self {
        Self {
            outputs: RefCell::new(outputs.into()),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Compiler succeeds, then the program prints `stdout`.
    pub fn compiles_and_prints(stdout: &str) -> Self {
        Self::new(vec![exited(0, "", ""), exited(0, stdout, "")])
    }

    /// Compiler exits 1 with `stderr`.
    pub fn compile_fails(stderr: &str) -> Self {
        Self::new(vec![exited(1, "", stderr)])
    }

    /// Queue more outputs, e.g. for a later round.
    pub fn push(&self, output: ProcessOutput) {
        self.outputs.borrow_mut().push_back(output);
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.borrow().clone()
    }
}

impl ProcessRunner for ScriptedRunner {
    fn run(&self, spec: &CommandSpec) -> Result<ProcessOutput> {
        self.calls.borrow_mut().push(spec.clone());
        self.outputs
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| anyhow!("unexpected command {:?}", spec.argv))
    }
}

pub fn exited(code: i32, stdout: &str, stderr: &str) -> ProcessOutput {
    ProcessOutput {
        exit_code: Some(code),
        stdout: stdout.to_string(),
        stderr: stderr.to_string(),
    }
}

/// Always picks the first item.
#[derive(Debug, Default)]
pub struct FirstSelector;

impl Selector for FirstSelector {
    fn pick(&mut self, items: &[String]) -> Option<String> {
        items.first().cloned()
    }
}

/// Picks scripted names in order, skipping names absent from the offered items.
#[derive(Debug)]
pub struct NamedSelector(pub Vec<String>);

impl Selector for NamedSelector {
    fn pick(&mut self, items: &[String]) -> Option<String> {
        let position = self.0.iter().position(|name| items.contains(name))?;
        Some(self.0.remove(position))
    }
}
