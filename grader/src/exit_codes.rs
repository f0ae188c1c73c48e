//! Stable exit codes for grader CLI commands.

/// Command succeeded; `check` passed or had nothing to compare.
pub const OK: i32 = 0;
/// Startup failure (missing task root, invalid config) or other errors.
pub const INVALID: i32 = 1;
/// `check` found a compile failure or an output mismatch.
pub const FAILED: i32 = 2;
/// `check` could not grade: bad staging area, or no levels for `session`.
pub const UNUSABLE: i32 = 3;
