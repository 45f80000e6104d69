use crate::config::{CompilerConfig, OptimizationLevel};
use crate::coverage::CoverageAnalyzer;
use crate::error::Result;
use crate::fs::{FileSystem, OsFileSystem};
use crate::optimizer::RuleEngine;
use crate::paths::normalize_selection_path;
use crate::scanner::Scanner;
use crate::types::{OptimizationResult, OptimizationStats, RuleApplication};
use std::collections::BTreeMap;
use std::path::Path;

/// Compiles file selections into stored patterns.
///
/// # Example
///
/// ```
/// use context_preset::{Compiler, MemoryFileSystem, OptimizationLevel};
///
/// let fs = MemoryFileSystem::with_files("/p", &["pkg/a.ts", "pkg/b.ts", "pkg/c.ts"]);
/// let result = Compiler::with_fs(fs)
///     .compile(["pkg/a.ts", "pkg/b.ts"], "/p", OptimizationLevel::Balanced)
///     .unwrap();
/// assert_eq!(result.patterns, vec!["pkg/**", "!pkg/c.ts"]);
/// ```
#[derive(Debug, Clone)]
pub struct Compiler<F: FileSystem = OsFileSystem> {
    fs: F,
    config: CompilerConfig,
}

impl Compiler {
    /// Compiler over the real filesystem with default policy
    pub fn new() -> Self {
        Self::with_fs(OsFileSystem)
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: FileSystem> Compiler<F> {
    pub fn with_fs(fs: F) -> Self {
        Self {
            fs,
            config: CompilerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: CompilerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compiles `selection` (paths relative to `root`) at `level`.
    ///
    /// Fails on absolute paths and `..` segments. Subtrees that cannot be
    /// scanned safely never fail the compilation; their files stay literal.
    pub fn compile<I, S>(
        &self,
        selection: I,
        root: impl AsRef<Path>,
        level: OptimizationLevel,
    ) -> Result<OptimizationResult>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.config.validate()?;
        let root = root.as_ref();
        let case = self.config.case_sensitivity;

        // Case key -> first spelling seen
        let mut unique: BTreeMap<String, String> = BTreeMap::new();
        for raw in selection {
            let path = normalize_selection_path(raw.as_ref())?;
            unique.entry(case.key(&path)).or_insert(path);
        }
        if unique.is_empty() {
            log::debug!("Empty selection, nothing to compile");
            return Ok(OptimizationResult::empty(level));
        }
        let selection: Vec<String> = unique.into_values().collect();

        log::debug!(
            "Compiling {} files under {} at level {level}",
            selection.len(),
            root.display()
        );

        let scanner = Scanner::new(&self.fs, root);
        let mut analyzer =
            CoverageAnalyzer::new(scanner, selection.iter().map(String::as_str), case);

        // A level never emits more patterns than the levels below it
        let mut best: Option<(Vec<String>, Vec<RuleApplication>)> = None;
        for candidate in OptimizationLevel::ALL.into_iter().filter(|l| *l <= level) {
            let engine = RuleEngine::new(&mut analyzer, &selection, &self.config, candidate);
            let (patterns, applications) = engine.run();
            let kept = best.as_ref().map(|(kept, _)| kept.len());
            if let Some(kept) = kept.filter(|kept| *kept < patterns.len()) {
                log::debug!(
                    "{candidate} emits {} patterns, keeping {kept} from a lower level",
                    patterns.len()
                );
                continue;
            }
            best = Some((patterns, applications));
        }
        let (patterns, applications) = best.unwrap_or_default();

        let stats = OptimizationStats::new(selection.len(), patterns.len());
        log::info!(
            "Compiled {} files into {} patterns ({level})",
            stats.input_files,
            stats.pattern_count
        );

        Ok(OptimizationResult {
            level,
            patterns,
            applications,
            stats,
        })
    }
}

/// Compiles against the real filesystem with the default policy.
pub fn compile<I, S>(
    selection: I,
    root: impl AsRef<Path>,
    level: OptimizationLevel,
) -> Result<OptimizationResult>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Compiler::new().compile(selection, root, level)
}
