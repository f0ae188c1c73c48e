//! Canonical line form used to compare program output with expectations.

/// Split `text` into trimmed, non-empty lines, preserving order.
///
/// Applied identically to actual and expected output, so incidental
/// whitespace and blank lines never affect a verdict while line content and
/// line order still do.
pub fn normalize(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Join normalized lines back into text (one line per entry, no trailing newline).
pub fn join_lines(lines: &[String]) -> String {
    lines.join("\n")
}
