//! Dedup, redundancy elimination, brace merges and ordering of raw patterns.

use crate::ignored;
use crate::paths::{self, coverage_key, has_glob_meta, unescape_literal};
use crate::types::{Rule, RuleApplication};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Characters that disqualify a segment from taking part in a brace merge
const BRACE_UNSAFE: &[char] = &['\\', '{', '}', '*', '?', '[', ']', ','];

/// Turns raw include/exclude patterns into the final stored-form list.
pub fn finalize(
    includes: Vec<String>,
    excludes: Vec<String>,
    merge_braces: bool,
) -> (Vec<String>, Vec<RuleApplication>) {
    let includes = eliminate_redundant(dedupe(includes));
    let excludes = dedupe(excludes);

    let mut applications = Vec::new();
    let includes = if merge_braces {
        let (merged, mut merge_applications) = self::merge_braces(includes);
        applications.append(&mut merge_applications);
        merged
    } else {
        includes
    };

    (order(includes, excludes), applications)
}

/// Removes exact duplicates, keeping first-seen order
pub fn dedupe(patterns: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    patterns
        .into_iter()
        .filter(|pattern| seen.insert(pattern.clone()))
        .collect()
}

/// Directory of a brace-free `dir/**` pattern
fn recursive_dir_prefix(pattern: &str) -> Option<String> {
    let body = pattern.strip_suffix("/**")?;
    let dir = unescape_literal(body)?;
    (!dir.is_empty()).then_some(dir)
}

/// Drops patterns already implied by a broader `dir/**` glob.
///
/// Literals of ignored files survive: a directory glob never expands to them.
pub fn eliminate_redundant(includes: Vec<String>) -> Vec<String> {
    let mut dirs: Vec<String> = includes
        .iter()
        .filter_map(|pattern| recursive_dir_prefix(pattern))
        .collect();
    dirs.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));

    let mut kept_dirs: Vec<String> = Vec::new();
    for dir in dirs {
        if kept_dirs.iter().any(|kept| paths::is_within(kept, &dir)) {
            log::debug!("Dropping {dir}/**: covered by a broader directory glob");
            continue;
        }
        kept_dirs.push(dir);
    }

    includes
        .into_iter()
        .filter(|pattern| {
            if let Some(dir) = recursive_dir_prefix(pattern) {
                return kept_dirs.contains(&dir);
            }
            if let Some(literal) = unescape_literal(pattern) {
                if ignored::is_ignored_file(&literal) {
                    return true;
                }
            }
            let key = coverage_key(pattern);
            let covered = kept_dirs
                .iter()
                .any(|kept| key.starts_with(kept.as_str()) && key[kept.len()..].starts_with('/'));
            if covered {
                log::debug!("Dropping {pattern}: covered by a directory glob");
            }
            !covered
        })
        .collect()
}

/// Aggressive-level brace merges.
///
/// Sibling directory globs become `parent/{a,b}/**`, then patterns that only
/// differ by extension become `prefix.{ts,tsx}`.
pub fn merge_braces(includes: Vec<String>) -> (Vec<String>, Vec<RuleApplication>) {
    let mut applications = Vec::new();

    let before = includes.len();
    let includes = merge_groups(includes, directory_merge_key, |parent, names| {
        format!("{parent}/{{{}}}/**", names.join(","))
    });
    if includes.len() < before {
        applications.push(RuleApplication::new(
            Rule::BraceMerge,
            "merged sibling directory globs",
            before,
            includes.len(),
        ));
    }

    let before = includes.len();
    let includes = merge_groups(includes, extension_merge_key, |prefix, exts| {
        format!("{prefix}.{{{}}}", exts.join(","))
    });
    if includes.len() < before {
        applications.push(RuleApplication::new(
            Rule::BraceMerge,
            "merged extension variants",
            before,
            includes.len(),
        ));
    }

    (includes, applications)
}

/// `parent/name/**` → `(parent, name)`; top-level directories stay unmerged
fn directory_merge_key(pattern: &str) -> Option<(String, String)> {
    let body = pattern.strip_suffix("/**")?;
    if body.contains(BRACE_UNSAFE) {
        return None;
    }
    let (parent, name) = body.rsplit_once('/')?;
    if parent.is_empty() || name.is_empty() {
        return None;
    }
    Some((parent.to_string(), name.to_string()))
}

/// `prefix.ext` → `(prefix, ext)`
fn extension_merge_key(pattern: &str) -> Option<(String, String)> {
    if pattern.contains(['{', '}']) {
        return None;
    }
    if let Some(literal) = unescape_literal(pattern) {
        if ignored::is_ignored_file(&literal) {
            return None;
        }
    }
    let name = paths::file_name(pattern);
    let (_, ext) = name.rsplit_once('.')?;
    if ext.is_empty() || ext.contains(BRACE_UNSAFE) || ext == "*" {
        return None;
    }
    let prefix = &pattern[..pattern.len() - ext.len() - 1];
    if prefix.is_empty() || prefix.ends_with('/') || prefix.ends_with('\\') {
        return None;
    }
    Some((prefix.to_string(), ext.to_string()))
}

/// Replaces every group of two or more patterns sharing a key with one merged
/// pattern, placed where the first member was.
fn merge_groups(
    patterns: Vec<String>,
    key_of: impl Fn(&str) -> Option<(String, String)>,
    build: impl Fn(&str, &[String]) -> String,
) -> Vec<String> {
    let mut groups: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for pattern in &patterns {
        if let Some((key, member)) = key_of(pattern) {
            groups.entry(key).or_default().insert(member);
        }
    }

    let mut emitted: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(patterns.len());
    for pattern in patterns {
        let Some((key, _)) = key_of(&pattern) else {
            out.push(pattern);
            continue;
        };
        let members = &groups[&key];
        if members.len() < 2 {
            out.push(pattern);
            continue;
        }
        if emitted.insert(key.clone()) {
            let members: Vec<String> = members.iter().cloned().collect();
            let merged = build(&key, &members);
            log::debug!("Brace merge: {} patterns -> {merged}", members.len());
            out.push(merged);
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum PatternGroup {
    Directory,
    Extension,
    Literal,
}

fn group_of(pattern: &str) -> PatternGroup {
    if pattern.ends_with("/**") {
        PatternGroup::Directory
    } else if has_glob_meta(pattern) {
        PatternGroup::Extension
    } else {
        PatternGroup::Literal
    }
}

/// Directory globs, extension globs, literals, then `!` excludes; each sorted.
pub fn order(includes: Vec<String>, excludes: Vec<String>) -> Vec<String> {
    let mut includes = includes;
    includes.sort_by(|a, b| group_of(a).cmp(&group_of(b)).then_with(|| a.cmp(b)));

    let mut excludes = excludes;
    excludes.sort();

    includes
        .into_iter()
        .chain(excludes.into_iter().map(|pattern| format!("!{pattern}")))
        .collect()
}

/// Stored text: optional `#` header, one pattern per line, trailing newline
pub fn render(patterns: &[String], header: Option<&str>) -> String {
    let mut out = String::new();
    if let Some(header) = header {
        for line in header.lines() {
            if line.is_empty() {
                out.push_str("#\n");
            } else {
                out.push_str("# ");
                out.push_str(line);
                out.push('\n');
            }
        }
    }
    for pattern in patterns {
        out.push_str(pattern);
        out.push('\n');
    }
    out
}
