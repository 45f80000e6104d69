use crate::config::CaseSensitivity;
use crate::fs::FileSystem;
use crate::ignored;
use crate::paths;
use crate::scanner::{DirectoryListing, Scanner};
use crate::tree::SelectionTree;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

/// Scan of one directory compared against the selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryScan {
    pub listing: Arc<DirectoryListing>,
    /// Direct visible files keyed by extension (case-folded per policy)
    pub direct_files_by_extension: BTreeMap<String, Vec<String>>,
    /// Whether every direct file of an extension is selected
    pub direct_coverage_by_extension: BTreeMap<String, bool>,
    /// Selected visible files below the directory
    pub selected: Vec<String>,
    /// Unselected visible files below the directory
    pub missing: Vec<String>,
    pub fully_selected: bool,
}

impl DirectoryScan {
    pub fn dir(&self) -> &str {
        &self.listing.dir
    }
}

/// Answers coverage questions for candidate directories.
pub struct CoverageAnalyzer<'fs, F: FileSystem + ?Sized> {
    scanner: Scanner<'fs, F>,
    selected: HashSet<String>,
    case: CaseSensitivity,
    cache: HashMap<String, Option<Arc<DirectoryScan>>>,
}

impl<'fs, F: FileSystem + ?Sized> CoverageAnalyzer<'fs, F> {
    pub fn new<'a>(
        scanner: Scanner<'fs, F>,
        selection: impl IntoIterator<Item = &'a str>,
        case: CaseSensitivity,
    ) -> Self {
        Self {
            scanner,
            selected: selection.into_iter().map(|path| case.key(path)).collect(),
            case,
            cache: HashMap::new(),
        }
    }

    pub fn case(&self) -> CaseSensitivity {
        self.case
    }

    pub fn is_selected(&self, path: &str) -> bool {
        self.selected.contains(&self.case.key(path))
    }

    /// Extension key of a file under the case policy
    pub fn extension_key(&self, path: &str) -> Option<String> {
        paths::file_extension(path).map(|ext| self.case.key(ext))
    }

    /// Coverage of `dir` (`""` is the root), `None` when its scan is unknown.
    pub fn analyze(&mut self, dir: &str) -> Option<Arc<DirectoryScan>> {
        if let Some(cached) = self.cache.get(dir) {
            return cached.clone();
        }
        let result = self.scanner.scan(dir).map(|listing| Arc::new(self.compare(listing)));
        self.cache.insert(dir.to_string(), result.clone());
        result
    }

    fn compare(&self, listing: Arc<DirectoryListing>) -> DirectoryScan {
        let (selected, missing): (Vec<String>, Vec<String>) = listing
            .all_files
            .iter()
            .cloned()
            .partition(|file| self.is_selected(file));

        let mut direct_files_by_extension: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for file in &listing.direct_files {
            if let Some(ext) = self.extension_key(file) {
                direct_files_by_extension
                    .entry(ext)
                    .or_default()
                    .push(file.clone());
            }
        }
        let direct_coverage_by_extension = direct_files_by_extension
            .iter()
            .map(|(ext, files)| (ext.clone(), files.iter().all(|f| self.is_selected(f))))
            .collect();

        DirectoryScan {
            fully_selected: missing.is_empty() && !selected.is_empty(),
            listing,
            direct_files_by_extension,
            direct_coverage_by_extension,
            selected,
            missing,
        }
    }

    /// Every visible file below `dir` is selected.
    ///
    /// The project root never qualifies, and neither does anything inside an
    /// ignored location.
    pub fn full_coverage(&mut self, dir: &str) -> Option<Arc<DirectoryScan>> {
        if dir.is_empty() || ignored::is_ignored_dir(dir) {
            return None;
        }
        self.analyze(dir).filter(|scan| scan.fully_selected)
    }

    /// Between 1 and `max_missing` visible files below `dir` are unselected.
    pub fn near_full_coverage(
        &mut self,
        dir: &str,
        max_missing: usize,
    ) -> Option<Arc<DirectoryScan>> {
        if dir.is_empty() || max_missing == 0 || ignored::is_ignored_dir(dir) {
            return None;
        }
        self.analyze(dir)
            .filter(|scan| !scan.missing.is_empty() && scan.missing.len() <= max_missing)
    }

    /// Every direct file of `dir` with extension `ext` is selected.
    pub fn extension_coverage(&mut self, dir: &str, ext: &str) -> bool {
        if ignored::is_ignored_dir(dir) {
            return false;
        }
        self.analyze(dir)
            .and_then(|scan| scan.direct_coverage_by_extension.get(ext).copied())
            .unwrap_or(false)
    }

    /// Files with extension `ext` anywhere below `dir`, if all of them are selected.
    pub fn recursive_extension_coverage(&mut self, dir: &str, ext: &str) -> Option<Vec<String>> {
        if ignored::is_ignored_dir(dir) {
            return None;
        }
        let scan = self.analyze(dir)?;
        let files: Vec<String> = scan
            .listing
            .all_files
            .iter()
            .filter(|file| self.extension_key(file).as_deref() == Some(ext))
            .cloned()
            .collect();
        if files.is_empty() || !files.iter().all(|f| self.is_selected(f)) {
            return None;
        }
        Some(files)
    }
}

/// Directories holding selected files, root excluded, deepest first.
///
/// Ties on depth are broken lexicographically.
pub fn candidate_directories(tree: &SelectionTree) -> Vec<String> {
    let mut dirs = tree.directories();
    dirs.sort_by(|a, b| {
        paths::depth(b)
            .cmp(&paths::depth(a))
            .then_with(|| a.cmp(b))
    });
    dirs
}
