use crate::error::Result;
use crate::paths::check_pattern_safety;

/// Include glob synthesised when a pattern list only holds excludes
pub const MATCH_ALL: &str = "**/*";

/// Stored pattern text split into includes and excludes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPatterns {
    pub includes: Vec<String>,
    /// Without the leading `!`
    pub excludes: Vec<String>,
}

impl ParsedPatterns {
    pub fn is_empty(&self) -> bool {
        self.includes.is_empty() && self.excludes.is_empty()
    }
}

/// Parses stored pattern text.
///
/// Blank lines and `#` comments are skipped, `!` marks an exclude. Every
/// pattern is checked for safety before anything touches the filesystem.
pub fn parse_patterns(text: &str) -> Result<ParsedPatterns> {
    let mut parsed = ParsedPatterns::default();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (pattern, is_exclude) = match line.strip_prefix('!') {
            Some(rest) => (rest.trim_start(), true),
            None => (line, false),
        };
        let pattern = pattern.strip_prefix("./").unwrap_or(pattern);
        if pattern.is_empty() {
            log::debug!("Skipping empty pattern line '{line}'");
            continue;
        }

        check_pattern_safety(pattern)?;
        if is_exclude {
            parsed.excludes.push(pattern.to_string());
        } else {
            parsed.includes.push(pattern.to_string());
        }
    }

    if parsed.includes.is_empty() && !parsed.excludes.is_empty() {
        parsed.includes.push(MATCH_ALL.to_string());
    }
    Ok(parsed)
}
