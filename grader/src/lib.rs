//! Interactive exercise grader.
//!
//! Presents a random exercise from a chosen level, compiles the single
//! staged C/C++ solution, runs it and compares its normalized output with the
//! exercise's expected output. Failures leave a trace file behind.
//!
//! - **[`core`]**: Pure logic (normalization, toolchain table, session state machine).
//! - **[`io`]**: Filesystem, configuration and child processes.
//!
//! [`pipeline`] and [`session`] coordinate the two; [`report`] renders results.

pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod pipeline;
pub mod report;
pub mod session;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
