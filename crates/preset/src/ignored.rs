//! Fixed default-ignore list shared by the scanner and the expander.
//!
//! Ignored entries are invisible to coverage analysis and to glob expansion,
//! so a generalised pattern never depends on them. Selected files inside an
//! ignored location are always stored as literals.

const IGNORED_DIRS: &[&str] = &[
    // VCS
    ".git",
    ".hg",
    ".svn",
    // dependency caches
    "node_modules",
    "bower_components",
    ".venv",
    "venv",
    "__pycache__",
    ".pytest_cache",
    ".mypy_cache",
    ".gradle",
    // build output
    "dist",
    "build",
    "out",
    "target",
    ".next",
    ".nuxt",
    "coverage",
    ".turbo",
    ".cache",
];

const IGNORED_FILE_NAMES: &[&str] = &[".ds_store", "thumbs.db", "desktop.ini"];

const IGNORED_FILE_EXTENSIONS: &[&str] = &["log"];

/// Whether an entry name is hidden, whatever kind of entry carries it
pub fn is_ignored_name(name: &str) -> bool {
    let lowered = name.to_lowercase();
    if IGNORED_DIRS.iter().any(|ignored| *ignored == lowered)
        || IGNORED_FILE_NAMES.iter().any(|ignored| *ignored == lowered)
    {
        return true;
    }
    lowered
        .rsplit_once('.')
        .is_some_and(|(_, ext)| IGNORED_FILE_EXTENSIONS.contains(&ext))
}

/// Whether any component of a relative directory path is ignored
pub fn is_ignored_dir(dir: &str) -> bool {
    !dir.is_empty() && dir.split('/').any(is_ignored_name)
}

/// Whether a relative file path is hidden from scans and glob expansion
pub fn is_ignored_file(path: &str) -> bool {
    path.split('/').any(is_ignored_name)
}
