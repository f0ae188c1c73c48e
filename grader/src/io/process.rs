//! Child process execution for compilers and candidate programs.
//!
//! Candidates run to completion: there is no timeout and no resource limit.

use std::ffi::{OsStr, OsString};
use std::path::PathBuf;
use std::process::{Command, Stdio};

use anyhow::{Context, Result, bail};
use serde::Serialize;
use tracing::{debug, instrument};

/// A command line to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Program first, then arguments. Paths pass through unchanged, even when
    /// they are not valid UTF-8.
    pub argv: Vec<OsString>,
    pub current_dir: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new<I>(argv: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<OsString>,
    {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
            current_dir: None,
        }
    }

    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn program(&self) -> Option<&OsStr> {
        self.argv.first().map(OsString::as_os_str)
    }

    /// Program name for logs and messages.
    pub fn program_name(&self) -> String {
        self.program()
            .map(|program| program.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Captured result of a finished child process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcessOutput {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

pub trait ProcessRunner {
    fn run(&self, spec: &CommandSpec) -> Result<ProcessOutput>;
}

/// Runs commands with `std::process`, blocking until exit.
#[derive(Debug, Default)]
pub struct SystemProcessRunner;

impl ProcessRunner for SystemProcessRunner {
    #[instrument(skip_all, fields(program = %spec.program_name()))]
    fn run(&self, spec: &CommandSpec) -> Result<ProcessOutput> {
        let Some((program, args)) = spec.argv.split_first() else {
            bail!("command must be non-empty");
        };
        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &spec.current_dir {
            command.current_dir(dir);
        }

        debug!(argv = ?spec.argv, "spawning child process");
        let output = command
            .output()
            .with_context(|| format!("run {:?}", spec.argv))?;

        let result = ProcessOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };
        debug!(exit_code = ?result.exit_code, "child process finished");
        Ok(result)
    }
}
