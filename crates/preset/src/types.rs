use crate::config::OptimizationLevel;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rules of the compiler, in application order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rule {
    FullDirectory,
    NearFullExclusion,
    DirectoryExtension,
    GlobalExtension,
    LiteralFallback,
    BraceMerge,
}

impl Rule {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FullDirectory => "full-directory",
            Self::NearFullExclusion => "near-full-exclusion",
            Self::DirectoryExtension => "directory-extension",
            Self::GlobalExtension => "global-extension",
            Self::LiteralFallback => "literal-fallback",
            Self::BraceMerge => "brace-merge",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One firing of a rule, for diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleApplication {
    pub rule: Rule,

    /// Human readable description (`src/** (12 files)`)
    pub detail: String,

    /// Uncovered files before the rule fired (pattern count for brace merges)
    pub before: usize,

    /// Uncovered files after the rule fired (pattern count for brace merges)
    pub after: usize,
}

impl RuleApplication {
    pub fn new(rule: Rule, detail: impl Into<String>, before: usize, after: usize) -> Self {
        Self {
            rule,
            detail: detail.into(),
            before,
            after,
        }
    }
}

/// Aggregate numbers of a compilation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizationStats {
    /// Number of distinct selected files
    pub input_files: usize,

    /// Number of emitted patterns (excludes included)
    pub pattern_count: usize,

    /// `input_files - pattern_count`, never negative
    pub patterns_saved: usize,
}

impl OptimizationStats {
    pub fn new(input_files: usize, pattern_count: usize) -> Self {
        Self {
            input_files,
            pattern_count,
            patterns_saved: input_files.saturating_sub(pattern_count),
        }
    }
}

/// Output of [`crate::Compiler::compile`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub level: OptimizationLevel,

    /// Patterns in stored form, excludes prefixed with `!`
    pub patterns: Vec<String>,

    pub applications: Vec<RuleApplication>,

    pub stats: OptimizationStats,
}

impl OptimizationResult {
    pub fn empty(level: OptimizationLevel) -> Self {
        Self {
            level,
            patterns: Vec::new(),
            applications: Vec::new(),
            stats: OptimizationStats::default(),
        }
    }

    /// Stored pattern text with an optional comment header
    pub fn to_pattern_text(&self, header: Option<&str>) -> String {
        crate::emitter::render(&self.patterns, header)
    }

    pub fn includes(&self) -> impl Iterator<Item = &str> {
        self.patterns
            .iter()
            .map(String::as_str)
            .filter(|p| !p.starts_with('!'))
    }

    pub fn excludes(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().filter_map(|p| p.strip_prefix('!'))
    }
}
