//! Extension-keyed compiler table.
//!
//! Adding a language means adding a row to [`TOOLCHAINS`].

use std::ffi::OsString;
use std::path::Path;

/// A compiler invocation bound to one source extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Toolchain {
    /// File extension without the leading dot.
    pub extension: &'static str,
    /// Compiler program looked up on `PATH`.
    pub program: &'static str,
    /// Language standard flag passed before the output arguments.
    pub standard_flag: &'static str,
}

pub const TOOLCHAINS: &[Toolchain] = &[
    Toolchain {
        extension: "c",
        program: "gcc",
        standard_flag: "-std=c11",
    },
    Toolchain {
        extension: "cpp",
        program: "c++",
        standard_flag: "-std=c++17",
    },
];

impl Toolchain {
    /// Argument vector (program first) compiling `source` into `output`.
    pub fn compile_command(&self, source: &Path, output: &Path) -> Vec<OsString> {
        vec![
            self.program.into(),
            self.standard_flag.into(),
            "-o".into(),
            output.into(),
            source.into(),
        ]
    }
}

/// Toolchain bound to the extension of `path`, if any.
///
/// Matching is exact: `main.C` or `main.cc` are not recognized.
pub fn toolchain_for(path: &Path) -> Option<&'static Toolchain> {
    let ext = path.extension()?.to_str()?;
    TOOLCHAINS.iter().find(|toolchain| toolchain.extension == ext)
}

/// Comma-separated list of accepted extensions, for user messages (`.c, .cpp`).
pub fn accepted_extensions() -> String {
    TOOLCHAINS
        .iter()
        .map(|toolchain| format!(".{}", toolchain.extension))
        .collect::<Vec<_>>()
        .join(", ")
}
