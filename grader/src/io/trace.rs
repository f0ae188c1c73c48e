//! Trace records written on compile failures and output mismatches.
//!
//! One file per failure event, never appended to. Names embed a sortable
//! `YYYYMMDD_HHMMSS` timestamp; a numeric suffix keeps same-second events apart.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use tracing::info;

use crate::core::normalize::join_lines;

/// Diagnostic content of a failed round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceRecord {
    CompileFailure {
        level: String,
        exercise: String,
        stdout: String,
        stderr: String,
    },
    Mismatch {
        subject: String,
        expected: Vec<String>,
        actual: Vec<String>,
    },
}

pub fn format_timestamp(at: &DateTime<Local>) -> String {
    at.format("%Y%m%d_%H%M%S").to_string()
}

impl TraceRecord {
    /// File stem without collision suffix or extension.
    pub fn file_stem(&self, timestamp: &str) -> String {
        match self {
            TraceRecord::CompileFailure {
                level, exercise, ..
            } => format!("{level}_{exercise}_compile_{timestamp}"),
            TraceRecord::Mismatch { subject, .. } => format!("{subject}_trace_{timestamp}"),
        }
    }

    pub fn render(&self, timestamp: &str) -> String {
        let mut buf = String::new();
        match self {
            TraceRecord::CompileFailure {
                level,
                exercise,
                stdout,
                stderr,
            } => {
                buf.push_str(&format!("subject: {level}_{exercise}\n"));
                buf.push_str(&format!("timestamp: {timestamp}\n"));
                buf.push_str("Compilation failed\n");
                buf.push_str("--- Compiler stdout ---\n");
                buf.push_str(stdout);
                buf.push_str("\n--- Compiler stderr ---\n");
                buf.push_str(stderr);
                buf.push('\n');
            }
            TraceRecord::Mismatch {
                subject,
                expected,
                actual,
            } => {
                buf.push_str(&format!("subject: {subject}\n"));
                buf.push_str(&format!("timestamp: {timestamp}\n"));
                buf.push_str("Output mismatch\n");
                buf.push_str("--- Expected ---\n");
                buf.push_str(&join_lines(expected));
                buf.push_str("\n--- Got ---\n");
                buf.push_str(&join_lines(actual));
                buf.push('\n');
            }
        }
        buf
    }
}

/// Write `record` as a new file under `traces_dir` and return its path.
pub fn write_trace(traces_dir: &Path, record: &TraceRecord, at: DateTime<Local>) -> Result<PathBuf> {
    fs::create_dir_all(traces_dir)
        .with_context(|| format!("create {}", traces_dir.display()))?;
    let timestamp = format_timestamp(&at);
    let stem = record.file_stem(&timestamp);
    let contents = record.render(&timestamp);

    let mut attempt = 0u32;
    loop {
        let name = if attempt == 0 {
            format!("{stem}.txt")
        } else {
            format!("{stem}_{attempt}.txt")
        };
        let path = traces_dir.join(name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(contents.as_bytes())
                    .with_context(|| format!("write {}", path.display()))?;
                info!(path = %path.display(), "trace written");
                return Ok(path);
            }
            Err(err) if err.kind() == ErrorKind::AlreadyExists => attempt += 1,
            Err(err) => {
                return Err(err).with_context(|| format!("create {}", path.display()));
            }
        }
    }
}
