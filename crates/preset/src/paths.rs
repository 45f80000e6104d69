//! Relative path validation, glob escaping and small path helpers.
//!
//! Every path handled by the compiler is relative to the project root and
//! uses `/` separators. The root itself is the empty string.

use crate::config::CaseSensitivity;
use crate::error::{PresetError, Result};

/// Characters with a meaning in stored patterns
const GLOB_META: &[char] = &['*', '?', '[', ']', '{', '}'];

/// Normalizes a selected path and rejects anything that could escape the root.
pub fn normalize_selection_path(raw: &str) -> Result<String> {
    if raw.contains('\0') {
        return Err(PresetError::unsafe_path(raw, "contains a NUL byte"));
    }

    let value = raw.trim().replace('\\', "/");
    if is_absolute(&value) {
        return Err(PresetError::unsafe_path(raw, "absolute paths are not allowed"));
    }

    let mut segments = Vec::new();
    for segment in value.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                return Err(PresetError::unsafe_path(
                    raw,
                    "parent directory segments are not allowed",
                ))
            }
            other => segments.push(other),
        }
    }

    if segments.is_empty() {
        return Err(PresetError::unsafe_path(raw, "empty path"));
    }
    Ok(segments.join("/"))
}

/// Rejects stored patterns that are absolute or walk out of the project.
pub fn check_pattern_safety(pattern: &str) -> Result<()> {
    if pattern.contains('\0') {
        return Err(PresetError::unsafe_pattern(pattern, "contains a NUL byte"));
    }
    if is_absolute(pattern) {
        return Err(PresetError::unsafe_pattern(
            pattern,
            "absolute patterns are not allowed",
        ));
    }
    if pattern.split('/').any(|segment| segment == "..") {
        return Err(PresetError::unsafe_pattern(
            pattern,
            "parent directory segments are not allowed",
        ));
    }
    Ok(())
}

fn is_absolute(value: &str) -> bool {
    if value.starts_with('/') {
        return true;
    }
    // Windows drive prefixes such as `C:` or `c:/`
    let bytes = value.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Escapes glob metacharacters so `text` only matches itself.
pub fn escape_glob(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch == '\\' || GLOB_META.contains(&ch) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Escapes a whole relative path for use as a stored include pattern.
///
/// A leading `!` or `#` would otherwise be read back as an exclude or comment.
pub fn escape_literal_pattern(path: &str) -> String {
    let escaped = escape_glob(path);
    if escaped.starts_with('!') || escaped.starts_with('#') {
        format!("\\{escaped}")
    } else {
        escaped
    }
}

/// Returns the literal path a pattern stands for, or `None` for real globs.
pub fn unescape_literal(pattern: &str) -> Option<String> {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            out.push(chars.next()?);
        } else if GLOB_META.contains(&ch) {
            return None;
        } else {
            out.push(ch);
        }
    }
    Some(out)
}

/// Whether the pattern contains an unescaped glob token
pub fn has_glob_meta(pattern: &str) -> bool {
    unescape_literal(pattern).is_none()
}

/// Literal text of a pattern up to its first glob token.
///
/// For a literal pattern this is the whole (unescaped) path.
pub fn coverage_key(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some(next) => out.push(next),
                None => break,
            }
        } else if GLOB_META.contains(&ch) {
            break;
        } else {
            out.push(ch);
        }
    }
    out
}

/// Extension as matched by `*.ext`: the text after the last `.` of the file name.
pub fn file_extension(path: &str) -> Option<&str> {
    let name = file_name(path);
    let (_, ext) = name.rsplit_once('.')?;
    if ext.is_empty() {
        None
    } else {
        Some(ext)
    }
}

pub fn file_name(path: &str) -> &str {
    path.rsplit_once('/').map_or(path, |(_, name)| name)
}

/// Parent directory of `path`, `""` for entries directly under the root.
pub fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(parent, _)| parent)
}

pub fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}

/// Number of path segments (`0` for the root)
pub fn depth(path: &str) -> usize {
    if path.is_empty() {
        0
    } else {
        path.split('/').count()
    }
}

/// Whether `path` lies strictly below `dir` (everything lies below the root).
pub fn is_within(dir: &str, path: &str) -> bool {
    if dir.is_empty() {
        return !path.is_empty();
    }
    path.len() > dir.len() && path.starts_with(dir) && path.as_bytes()[dir.len()] == b'/'
}

impl CaseSensitivity {
    /// Comparison key for `path` under this policy
    pub fn key(self, path: &str) -> String {
        match self {
            Self::Sensitive => path.to_string(),
            Self::Insensitive => path.to_lowercase(),
        }
    }
}
