//! Rule engine turning a selection into patterns.
//!
//! ```text
//! selection ──> full-directory ──> near-full exclusion ──> directory extension
//!                 (all levels)       (balanced+)             (balanced+)
//!           ──> global extension ──> literal fallback ──> emitter (+ brace merges)
//!                 (aggressive)         (all levels)          (aggressive)
//! ```
//!
//! Every rule only consumes files no earlier rule covered. A rule that
//! replaces several files with one glob fires only after the coverage
//! analyzer verified every file the glob implies is selected, and a newer
//! emission removes older ones whose files it fully covers.

use crate::config::{CompilerConfig, ExtensionGrouping, OptimizationLevel};
use crate::coverage::{candidate_directories, CoverageAnalyzer, DirectoryScan};
use crate::emitter;
use crate::fs::FileSystem;
use crate::paths::{self, escape_glob, escape_literal_pattern};
use crate::tree::SelectionTree;
use crate::types::{Rule, RuleApplication};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Patterns produced by one rule firing, with the files they stand for
#[derive(Debug, Clone)]
struct Emission {
    rule: Rule,
    /// Directory of a `dir/**` emission
    dir_glob: Option<String>,
    includes: Vec<String>,
    excludes: Vec<String>,
    /// Case keys of the selected files matched by `includes`
    covers: HashSet<String>,
}

impl Emission {
    fn pattern_count(&self) -> usize {
        self.includes.len() + self.excludes.len()
    }
}

pub(crate) struct RuleEngine<'a, 'fs, F: FileSystem + ?Sized> {
    analyzer: &'a mut CoverageAnalyzer<'fs, F>,
    config: &'a CompilerConfig,
    level: OptimizationLevel,
    /// Case key -> selected path, for files no emission covers yet
    uncovered: BTreeMap<String, String>,
    emissions: Vec<Emission>,
    applications: Vec<RuleApplication>,
}

impl<'a, 'fs, F: FileSystem + ?Sized> RuleEngine<'a, 'fs, F> {
    pub(crate) fn new(
        analyzer: &'a mut CoverageAnalyzer<'fs, F>,
        selection: &[String],
        config: &'a CompilerConfig,
        level: OptimizationLevel,
    ) -> Self {
        let case = analyzer.case();
        let uncovered = selection
            .iter()
            .map(|path| (case.key(path), path.clone()))
            .collect();
        Self {
            analyzer,
            config,
            level,
            uncovered,
            emissions: Vec::new(),
            applications: Vec::new(),
        }
    }

    /// Runs every rule of the level; returns stored-form patterns and the
    /// rule applications.
    pub(crate) fn run(mut self) -> (Vec<String>, Vec<RuleApplication>) {
        let tree = SelectionTree::from_paths(self.uncovered.values().map(String::as_str));
        let deepest_first = candidate_directories(&tree);

        self.full_directories(&deepest_first);
        if self.level >= OptimizationLevel::Balanced {
            self.near_full_exclusions(&deepest_first);

            let mut shallowest_first = deepest_first.clone();
            shallowest_first.sort_by(|a, b| {
                paths::depth(a)
                    .cmp(&paths::depth(b))
                    .then_with(|| a.cmp(b))
            });
            self.directory_extensions(&shallowest_first);
        }
        if self.level >= OptimizationLevel::Aggressive {
            self.global_extensions();
        }
        self.literal_fallback();

        let mut includes = Vec::new();
        let mut excludes = Vec::new();
        for emission in self.emissions {
            includes.extend(emission.includes);
            excludes.extend(emission.excludes);
        }

        let merge_braces = self.level >= OptimizationLevel::Aggressive;
        let (patterns, mut merges) = emitter::finalize(includes, excludes, merge_braces);
        self.applications.append(&mut merges);
        (patterns, self.applications)
    }

    fn keys(&self, files: &[String]) -> HashSet<String> {
        let case = self.analyzer.case();
        files.iter().map(|file| case.key(file)).collect()
    }

    fn uncovered_count(&self, files: &[String]) -> usize {
        let case = self.analyzer.case();
        files
            .iter()
            .filter(|file| self.uncovered.contains_key(&case.key(file)))
            .count()
    }

    /// Earlier emissions that an emission covering `covers` would make redundant
    fn superseded_count(&self, covers: &HashSet<String>) -> usize {
        self.emissions
            .iter()
            .filter(|e| !e.covers.is_empty() && e.covers.is_subset(covers))
            .count()
    }

    /// Patterns of earlier emissions that one covering `covers` would replace
    fn replaced_patterns(&self, covers: &HashSet<String>) -> usize {
        self.emissions
            .iter()
            .filter(|e| !e.covers.is_empty() && e.covers.is_subset(covers))
            .map(Emission::pattern_count)
            .sum()
    }

    fn under_dir_glob(&self, dir: &str) -> bool {
        self.emissions.iter().any(|e| {
            e.dir_glob
                .as_deref()
                .is_some_and(|glob_dir| glob_dir == dir || paths::is_within(glob_dir, dir))
        })
    }

    fn push(&mut self, emission: Emission, detail: String) {
        let before = self.uncovered.len();

        self.emissions.retain(|existing| {
            let redundant =
                !existing.covers.is_empty() && existing.covers.is_subset(&emission.covers);
            if redundant {
                log::debug!(
                    "{} superseded by {}: {:?}",
                    existing.rule,
                    emission.rule,
                    existing.includes
                );
            }
            !redundant
        });
        for key in &emission.covers {
            self.uncovered.remove(key);
        }

        log::debug!("{}: {detail}", emission.rule);
        self.applications.push(RuleApplication::new(
            emission.rule,
            detail,
            before,
            self.uncovered.len(),
        ));
        self.emissions.push(emission);
    }

    /// Rule 1: `dir/**` for fully selected directories
    fn full_directories(&mut self, deepest_first: &[String]) {
        let min = self.config.min_files_per_glob;
        for dir in deepest_first {
            let Some(scan) = self.analyzer.full_coverage(dir) else {
                continue;
            };
            if scan.selected.len() < min {
                continue;
            }
            let covers = self.keys(&scan.selected);
            let loose = self.uncovered_count(&scan.selected);
            // A parent that would only stand in for one collapsed child stays open
            if self.superseded_count(&covers) + loose < min {
                continue;
            }

            let detail = format!("{}/** ({} files)", dir, scan.selected.len());
            self.push(
                Emission {
                    rule: Rule::FullDirectory,
                    dir_glob: Some(dir.clone()),
                    includes: vec![dir_glob(dir)],
                    excludes: Vec::new(),
                    covers,
                },
                detail,
            );
        }
    }

    /// Rule 2: `dir/**` plus one exclude per unselected file
    fn near_full_exclusions(&mut self, deepest_first: &[String]) {
        let max_missing = self.config.max_missing(self.level);
        if max_missing == 0 {
            return;
        }
        let min = self.config.min_files_per_glob;

        for dir in deepest_first {
            if self.under_dir_glob(dir) {
                continue;
            }
            let Some(scan) = self.analyzer.near_full_coverage(dir, max_missing) else {
                continue;
            };
            if scan.selected.len() < min {
                continue;
            }

            let covers = self.keys(&scan.selected);
            let loose = self.uncovered_count(&scan.selected);
            let cost = 1 + scan.missing.len();
            let superseded = self.replaced_patterns(&covers);
            if superseded + loose < cost {
                continue;
            }
            // Climbing over earlier emissions needs a strict gain
            if superseded > 0 && superseded + loose == cost {
                log::debug!(
                    "Skipping near-full exclusion for {dir}: no gain over {superseded} patterns"
                );
                continue;
            }
            let grouped_cost = superseded + self.extension_group_cost(&scan);
            if grouped_cost < cost {
                log::debug!(
                    "Skipping near-full exclusion for {dir}: {grouped_cost} patterns without it"
                );
                continue;
            }
            if let Some(ext_cost) = self.extension_plan_cost(&scan) {
                if ext_cost <= cost {
                    log::debug!(
                        "Skipping near-full exclusion for {dir}: {ext_cost} extension globs suffice"
                    );
                    continue;
                }
            }

            let detail = format!(
                "{}/** ({} files, {} excluded)",
                dir,
                scan.selected.len(),
                scan.missing.len()
            );
            self.push(
                Emission {
                    rule: Rule::NearFullExclusion,
                    dir_glob: Some(dir.clone()),
                    includes: vec![dir_glob(dir)],
                    excludes: scan
                        .missing
                        .iter()
                        .map(|file| escape_literal_pattern(file))
                        .collect(),
                    covers,
                },
                detail,
            );
        }
    }

    /// Number of extension globs that would reproduce the selection under
    /// `scan` exactly, if there is such a set.
    fn extension_plan_cost(&mut self, scan: &DirectoryScan) -> Option<usize> {
        let mut exts = BTreeSet::new();
        for file in &scan.selected {
            exts.insert(self.analyzer.extension_key(file)?);
        }
        if self.config.extension_grouping == ExtensionGrouping::Direct
            && scan.selected.len() > scan.listing.direct_files.len()
        {
            return None;
        }
        for ext in &exts {
            self.analyzer.recursive_extension_coverage(scan.dir(), ext)?;
        }
        Some(exts.len())
    }

    /// Patterns the loose selected files under `scan` would need if rule 3
    /// and the literal fallback handled them instead.
    fn extension_group_cost(&mut self, scan: &DirectoryScan) -> usize {
        let case = self.analyzer.case();
        let mut loose: HashSet<String> = scan
            .selected
            .iter()
            .map(|file| case.key(file))
            .filter(|key| self.uncovered.contains_key(key))
            .collect();

        let mut dirs = BTreeSet::new();
        for file in &scan.selected {
            let mut dir = paths::parent_dir(file);
            while dir == scan.dir() || paths::is_within(scan.dir(), dir) {
                if dir.is_empty() || !dirs.insert(dir.to_string()) {
                    break;
                }
                dir = paths::parent_dir(dir);
            }
        }
        let mut dirs: Vec<String> = dirs.into_iter().collect();
        dirs.sort_by(|a, b| paths::depth(a).cmp(&paths::depth(b)).then_with(|| a.cmp(b)));

        let min = self.config.min_files_per_glob;
        let recursive = self.config.extension_grouping == ExtensionGrouping::PreferRecursive;
        let mut cost = 0;
        for dir in &dirs {
            let Some(dir_scan) = self.analyzer.analyze(dir) else {
                continue;
            };
            for (ext, files) in &dir_scan.direct_files_by_extension {
                if !files.iter().any(|f| loose.contains(&case.key(f)))
                    || !self.analyzer.extension_coverage(dir, ext)
                {
                    continue;
                }
                let mut group = None;
                if recursive && dir_scan.listing.has_subdirectories {
                    group = self
                        .analyzer
                        .recursive_extension_coverage(dir, ext)
                        .filter(|all| all.len() >= min);
                }
                if group.is_none() && files.len() >= min {
                    group = Some(files.clone());
                }
                if let Some(group) = group {
                    cost += 1;
                    for file in &group {
                        loose.remove(&case.key(file));
                    }
                }
            }
        }
        cost + loose.len()
    }

    /// Rule 3: `dir/*.ext` or `dir/**/*.ext`
    fn directory_extensions(&mut self, shallowest_first: &[String]) {
        let min = self.config.min_files_per_glob;
        for dir in shallowest_first {
            if self.under_dir_glob(dir) {
                continue;
            }
            let Some(scan) = self.analyzer.analyze(dir) else {
                continue;
            };

            for (ext, files) in &scan.direct_files_by_extension {
                if self.uncovered_count(files) == 0 || !self.analyzer.extension_coverage(dir, ext) {
                    continue;
                }

                if self.config.extension_grouping == ExtensionGrouping::PreferRecursive
                    && scan.listing.has_subdirectories
                {
                    if let Some(all) = self.analyzer.recursive_extension_coverage(dir, ext) {
                        if all.len() >= min {
                            let detail = format!("{dir}/**/*.{ext} ({} files)", all.len());
                            let covers = self.keys(&all);
                            self.push(
                                Emission {
                                    rule: Rule::DirectoryExtension,
                                    dir_glob: None,
                                    includes: vec![format!(
                                        "{}/**/*.{}",
                                        escape_glob(dir),
                                        escape_glob(ext)
                                    )],
                                    excludes: Vec::new(),
                                    covers,
                                },
                                detail,
                            );
                            continue;
                        }
                    }
                }

                if files.len() >= min {
                    let detail = format!("{dir}/*.{ext} ({} files)", files.len());
                    let covers = self.keys(files);
                    self.push(
                        Emission {
                            rule: Rule::DirectoryExtension,
                            dir_glob: None,
                            includes: vec![format!("{}/*.{}", escape_glob(dir), escape_glob(ext))],
                            excludes: Vec::new(),
                            covers,
                        },
                        detail,
                    );
                }
            }
        }
    }

    /// Rule 4: `**/*.ext` when every file of the extension is selected
    fn global_extensions(&mut self) {
        let Some(root) = self.analyzer.analyze("") else {
            log::debug!("Project scan is unknown; skipping global extension globs");
            return;
        };
        let min = self.config.min_files_per_glob;

        let mut by_ext: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for file in &root.listing.all_files {
            if let Some(ext) = self.analyzer.extension_key(file) {
                by_ext.entry(ext).or_default().push(file.clone());
            }
        }

        for (ext, files) in by_ext {
            if files.len() < min || !files.iter().all(|f| self.analyzer.is_selected(f)) {
                continue;
            }
            let covers = self.keys(&files);
            let loose = self.uncovered_count(&files);
            // Directory globs that already hold exactly these files stay as they are
            let replaces_narrower = self.emissions.iter().any(|e| {
                e.dir_glob.is_none() && !e.covers.is_empty() && e.covers.is_subset(&covers)
            });
            if loose == 0 && !replaces_narrower {
                continue;
            }

            let detail = format!("**/*.{ext} ({} files)", files.len());
            self.push(
                Emission {
                    rule: Rule::GlobalExtension,
                    dir_glob: None,
                    includes: vec![format!("**/*.{}", escape_glob(&ext))],
                    excludes: Vec::new(),
                    covers,
                },
                detail,
            );
        }
    }

    /// Rule 5: everything left becomes a literal
    fn literal_fallback(&mut self) {
        if self.uncovered.is_empty() {
            return;
        }
        let before = self.uncovered.len();
        let uncovered = std::mem::take(&mut self.uncovered);
        for (key, path) in uncovered {
            self.emissions.push(Emission {
                rule: Rule::LiteralFallback,
                dir_glob: None,
                includes: vec![escape_literal_pattern(&path)],
                excludes: Vec::new(),
                covers: HashSet::from([key]),
            });
        }
        self.applications.push(RuleApplication::new(
            Rule::LiteralFallback,
            format!("{before} literal paths"),
            before,
            0,
        ));
    }
}

fn dir_glob(dir: &str) -> String {
    format!("{}/**", escape_glob(dir))
}
