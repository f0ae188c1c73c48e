//! User-facing rendering of exercises and verdicts.

use std::io::Write;

use anyhow::Result;

use crate::core::normalize::join_lines;
use crate::core::toolchain::accepted_extensions;
use crate::io::catalog::Exercise;
use crate::io::process::ProcessOutput;
use crate::io::workspace::WorkspacePaths;
use crate::pipeline::Verdict;

/// Announce the selected exercise and print its description, if any.
pub fn render_exercise<W: Write>(out: &mut W, exercise: &Exercise) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "Working on {}/exercise {}", exercise.level, exercise.name)?;
    if let Some(description) = &exercise.description {
        writeln!(out)?;
        writeln!(out, "--- Exercise Description ---")?;
        writeln!(out, "{description}")?;
        writeln!(out, "-----------------------------")?;
    }
    writeln!(out)?;
    Ok(())
}

pub fn render_verdict<W: Write>(out: &mut W, verdict: &Verdict, paths: &WorkspacePaths) -> Result<()> {
    match verdict {
        Verdict::NoSolution => {
            staging_hint(out, paths)?;
        }
        Verdict::MultipleSolutions { files } => {
            staging_hint(out, paths)?;
            writeln!(out, "found: {}", files.join(", "))?;
        }
        Verdict::CompileFailure { compiler, trace } => {
            writeln!(out, "Compilation failed!")?;
            let stderr = compiler.stderr.trim();
            if !stderr.is_empty() {
                writeln!(out, "{stderr}")?;
            }
            writeln!(out, "Trace saved to {}", trace.display())?;
        }
        Verdict::Match { run } => {
            writeln!(out, "Compilation successful!")?;
            render_run(out, run)?;
            writeln!(out, "Output matches expected!")?;
        }
        Verdict::Mismatch {
            run,
            expected,
            actual,
            trace,
        } => {
            writeln!(out, "Compilation successful!")?;
            render_run(out, run)?;
            writeln!(out, "Output does NOT match expected!")?;
            writeln!(out, "--- Expected ---")?;
            writeln!(out, "{}", join_lines(expected))?;
            writeln!(out, "--- Got ---")?;
            writeln!(out, "{}", join_lines(actual))?;
            writeln!(out, "Mismatch trace saved to {}", trace.display())?;
        }
        Verdict::Unverified { run } => {
            writeln!(out, "Compilation successful!")?;
            render_run(out, run)?;
            writeln!(out, "No expected output for this exercise; nothing to compare.")?;
        }
    }
    Ok(())
}

fn staging_hint<W: Write>(out: &mut W, paths: &WorkspacePaths) -> Result<()> {
    writeln!(
        out,
        "You must place exactly ONE solution file ({}) in {}",
        accepted_extensions(),
        paths.solutions_dir.display()
    )?;
    Ok(())
}

fn render_run<W: Write>(out: &mut W, run: &ProcessOutput) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "--- Program output ---")?;
    let stdout = run.stdout.trim();
    if stdout.is_empty() {
        writeln!(out, "[no output]")?;
    } else {
        writeln!(out, "{stdout}")?;
    }
    let stderr = run.stderr.trim();
    if !stderr.is_empty() {
        writeln!(out, "Runtime errors: {stderr}")?;
    }
    match run.exit_code {
        Some(0) => {}
        Some(code) => writeln!(out, "(exit code {code})")?,
        None => writeln!(out, "(terminated by signal)")?,
    }
    Ok(())
}
