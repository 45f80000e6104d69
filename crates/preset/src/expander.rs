//! Expansion of stored patterns back into concrete file paths.

use crate::config::CaseSensitivity;
use crate::error::{PresetError, Result};
use crate::ignored;
use crate::parser::{parse_patterns, ParsedPatterns};
use crate::paths::unescape_literal;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::collections::BTreeSet;
use std::path::Path;
use walkdir::WalkDir;

/// Expands stored pattern text into sorted relative file paths.
pub fn expand(text: &str, root: impl AsRef<Path>) -> Result<Vec<String>> {
    expand_with_case(text, root, CaseSensitivity::Sensitive)
}

/// [`expand`] under an explicit case policy
pub fn expand_with_case(
    text: &str,
    root: impl AsRef<Path>,
    case: CaseSensitivity,
) -> Result<Vec<String>> {
    let parsed = parse_patterns(text)?;
    expand_patterns(&parsed, root.as_ref(), case)
}

/// Expands already parsed patterns against `root`.
///
/// Globs match a walk of the project that follows symbolic links and skips
/// the default-ignore list. Literal includes are taken as-is when the file
/// exists, even inside ignored locations.
pub fn expand_patterns(
    patterns: &ParsedPatterns,
    root: &Path,
    case: CaseSensitivity,
) -> Result<Vec<String>> {
    if patterns.includes.is_empty() {
        return Ok(Vec::new());
    }

    let includes = build_glob_set(&patterns.includes, case)?;
    let excludes = build_glob_set(&patterns.excludes, case)?;

    let mut files = BTreeSet::new();
    for pattern in &patterns.includes {
        if let Some(literal) = unescape_literal(pattern) {
            if root.join(&literal).is_file() {
                files.insert(literal);
            }
        }
    }

    let walker = WalkDir::new(root)
        .follow_links(true)
        .min_depth(1)
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0 || !ignored::is_ignored_name(&entry.file_name().to_string_lossy())
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping entry during expansion: {e}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(rel) = relative_path(root, entry.path()) else {
            continue;
        };
        if includes.is_match(&rel) {
            files.insert(rel);
        }
    }

    let before = files.len();
    files.retain(|file| !excludes.is_match(file));
    log::debug!(
        "Expanded {} includes / {} excludes into {} files ({} excluded)",
        patterns.includes.len(),
        patterns.excludes.len(),
        files.len(),
        before - files.len()
    );

    Ok(files.into_iter().collect())
}

fn build_glob_set(patterns: &[String], case: CaseSensitivity) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .backslash_escape(true)
            .case_insensitive(case == CaseSensitivity::Insensitive)
            .build()
            .map_err(|source| PresetError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| PresetError::InvalidPattern {
        pattern: patterns.join(", "),
        source,
    })
}

/// `path` relative to `root` with forward slashes
fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    Some(rel.to_string_lossy().replace('\\', "/"))
}
