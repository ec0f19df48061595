//! Whole-line comment elision.
//!
//! Only full-line comments are detected. Block comment boundaries
//! (`--[[`, `--[==[`, `--]]`, ...) are kept even when the block ends on
//! the same line, and trailing comments after code are left alone.

/// True if `line` is a comment from its first non-blank character, and
/// that comment is not a block comment opener or closer.
pub fn is_full_comment_line(line: &str) -> bool {
    let Some(rest) = line.trim().strip_prefix("--") else {
        return false;
    };
    !(is_long_bracket(rest, '[') || is_long_bracket(rest, ']'))
}

// `[=*[` or `]=*]`
fn is_long_bracket(text: &str, bracket: char) -> bool {
    text.strip_prefix(bracket)
        .map(|rest| rest.trim_start_matches('='))
        .is_some_and(|rest| rest.starts_with(bracket))
}
