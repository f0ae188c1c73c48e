//! Build-and-verify pipeline.
//!
//! Stage the single solution, compile it, run it, compare normalized output
//! with the exercise's expectation, and persist a trace on failure. Every step
//! is a gate: the first failing step decides the verdict.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::core::normalize::normalize;
use crate::core::toolchain::toolchain_for;
use crate::io::catalog::{Exercise, Selector, list_exercises, load_exercise};
use crate::io::config::GraderConfig;
use crate::io::process::{CommandSpec, ProcessOutput, ProcessRunner};
use crate::io::trace::{TraceRecord, write_trace};
use crate::io::workspace::{WorkspacePaths, reset_build};

/// Result of verifying one staged solution against one exercise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    /// No recognized solution file in the staging directory.
    NoSolution,
    /// More than one recognized solution file; nothing was compiled.
    MultipleSolutions { files: Vec<String> },
    CompileFailure {
        compiler: ProcessOutput,
        trace: PathBuf,
    },
    Match { run: ProcessOutput },
    Mismatch {
        run: ProcessOutput,
        expected: Vec<String>,
        actual: Vec<String>,
        trace: PathBuf,
    },
    /// The exercise has no expected output; the run is shown but not graded.
    Unverified { run: ProcessOutput },
}

/// Coarse classification of a [`Verdict`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Pass,
    Fail,
    /// The round could not be graded because of the staging area.
    Unusable,
    Unverified,
}

impl Verdict {
    pub fn outcome(&self) -> Outcome {
        match self {
            Verdict::NoSolution | Verdict::MultipleSolutions { .. } => Outcome::Unusable,
            Verdict::CompileFailure { .. } | Verdict::Mismatch { .. } => Outcome::Fail,
            Verdict::Match { .. } => Outcome::Pass,
            Verdict::Unverified { .. } => Outcome::Unverified,
        }
    }

    pub fn trace(&self) -> Option<&Path> {
        match self {
            Verdict::CompileFailure { trace, .. } | Verdict::Mismatch { trace, .. } => Some(trace),
            _ => None,
        }
    }
}

/// Result of a full round: exercise selection plus verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundOutcome {
    NoExercises { level: String },
    Graded { exercise: Exercise, verdict: Verdict },
}

/// Pick a random exercise of `level`, announce it through `on_selected`, then verify.
pub fn run_round<R, S, F>(
    paths: &WorkspacePaths,
    cfg: &GraderConfig,
    level: &str,
    runner: &R,
    selector: &mut S,
    on_selected: F,
) -> Result<RoundOutcome>
where
    R: ProcessRunner,
    S: Selector + ?Sized,
    F: FnOnce(&Exercise) -> Result<()>,
{
    let exercises = list_exercises(&paths.tasks_dir, level)?;
    let Some(name) = selector.pick(&exercises) else {
        warn!(level, "no exercises in level");
        return Ok(RoundOutcome::NoExercises {
            level: level.to_string(),
        });
    };
    let exercise = load_exercise(&paths.tasks_dir, level, &name, cfg)?;
    on_selected(&exercise)?;
    let verdict = verify_exercise(paths, cfg, &exercise, runner)?;
    Ok(RoundOutcome::Graded { exercise, verdict })
}

/// Compile, run and check the staged solution against `exercise`.
///
/// Staging problems, compile failures and mismatches are verdicts; `Err` is
/// reserved for filesystem or process failures.
#[instrument(skip_all, fields(subject = %exercise.subject()))]
pub fn verify_exercise<R: ProcessRunner>(
    paths: &WorkspacePaths,
    cfg: &GraderConfig,
    exercise: &Exercise,
    runner: &R,
) -> Result<Verdict> {
    reset_build(paths).context("reset build directory")?;

    let mut solutions = find_solutions(&paths.solutions_dir)?;
    let solution = match solutions.len() {
        0 => {
            warn!(dir = %paths.solutions_dir.display(), "no solution file staged");
            return Ok(Verdict::NoSolution);
        }
        1 => solutions.remove(0),
        _ => {
            let files = solutions
                .iter()
                .filter_map(|path| path.file_name())
                .map(|name| name.to_string_lossy().to_string())
                .collect::<Vec<_>>();
            warn!(files = ?files, "multiple solution files staged");
            return Ok(Verdict::MultipleSolutions { files });
        }
    };
    let Some(toolchain) = toolchain_for(&solution) else {
        return Ok(Verdict::NoSolution);
    };

    fs::create_dir_all(&paths.build_dir)
        .with_context(|| format!("create {}", paths.build_dir.display()))?;
    let file_name = solution
        .file_name()
        .with_context(|| format!("solution path has no file name {}", solution.display()))?;
    let staged = paths.build_dir.join(file_name);
    fs::copy(&solution, &staged)
        .with_context(|| format!("copy {} to {}", solution.display(), staged.display()))?;
    debug!(staged = %staged.display(), "solution staged");

    let executable = paths.build_dir.join(&cfg.executable_name);
    let compile = CommandSpec::new(toolchain.compile_command(&staged, &executable))
        .in_dir(&paths.build_dir);
    let compiler = runner.run(&compile).context("run compiler")?;
    if !compiler.success() {
        warn!(exit_code = ?compiler.exit_code, compiler = toolchain.program, "compilation failed");
        let record = TraceRecord::CompileFailure {
            level: exercise.level.clone(),
            exercise: exercise.name.clone(),
            stdout: compiler.stdout.clone(),
            stderr: compiler.stderr.clone(),
        };
        let trace = write_trace(&paths.traces_dir, &record, Local::now())?;
        return Ok(Verdict::CompileFailure { compiler, trace });
    }
    info!(compiler = toolchain.program, "compilation succeeded");

    let program = CommandSpec::new([executable.as_os_str()]).in_dir(&paths.root);
    let run = runner.run(&program).context("run compiled program")?;
    debug!(exit_code = ?run.exit_code, "program finished");

    let Some(expected_path) = &exercise.expected_output else {
        info!("no expected output, skipping comparison");
        return Ok(Verdict::Unverified { run });
    };
    let expected_raw = fs::read_to_string(expected_path)
        .with_context(|| format!("read {}", expected_path.display()))?;

    let expected = normalize(&expected_raw);
    let actual = normalize(&run.stdout);
    if expected == actual {
        info!("output matches");
        return Ok(Verdict::Match { run });
    }

    warn!(
        expected_lines = expected.len(),
        actual_lines = actual.len(),
        "output mismatch"
    );
    let record = TraceRecord::Mismatch {
        subject: exercise.subject(),
        expected: expected.clone(),
        actual: actual.clone(),
    };
    let trace = write_trace(&paths.traces_dir, &record, Local::now())?;
    Ok(Verdict::Mismatch {
        run,
        expected,
        actual,
        trace,
    })
}

/// Regular files in `dir` with a recognized source extension, sorted by name.
///
/// A missing directory holds no solutions.
pub fn find_solutions(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut found = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("read {}", dir.display()))? {
        let entry = entry.context("read entry")?;
        let path = entry.path();
        if path.is_file() && toolchain_for(&path).is_some() {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}
