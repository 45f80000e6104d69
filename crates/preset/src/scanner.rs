use crate::fs::{EntryKind, FileSystem};
use crate::ignored;
use crate::paths;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Visible content of one directory subtree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryListing {
    /// Relative directory path (`""` for the project root)
    pub dir: String,
    /// Every visible file below `dir`, sorted
    pub all_files: Vec<String>,
    /// Visible files directly inside `dir`, sorted
    pub direct_files: Vec<String>,
    pub has_subdirectories: bool,
}

/// Memoizing subtree scanner for a single compilation.
///
/// A subtree is reported as unknown (`None`) when it cannot be described
/// safely: unreadable directories, entries that resolve outside the project,
/// linked directories, and anything that is neither a file nor a directory.
/// An unknown subtree makes every ancestor unknown too.
pub struct Scanner<'fs, F: FileSystem + ?Sized> {
    fs: &'fs F,
    root: PathBuf,
    real_root: Option<PathBuf>,
    cache: HashMap<String, Option<Arc<DirectoryListing>>>,
}

impl<'fs, F: FileSystem + ?Sized> Scanner<'fs, F> {
    pub fn new(fs: &'fs F, root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        let real_root = match fs.real_path(&root) {
            Ok(real) => Some(real),
            Err(_) if !fs.exists(&root) => {
                log::warn!("Project root {} does not exist", root.display());
                None
            }
            Err(e) => {
                log::warn!("Cannot resolve project root {}: {e}", root.display());
                None
            }
        };
        Self {
            fs,
            root,
            real_root,
            cache: HashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Scans `dir` (relative, `""` for the root), reusing earlier results.
    pub fn scan(&mut self, dir: &str) -> Option<Arc<DirectoryListing>> {
        if let Some(cached) = self.cache.get(dir) {
            return cached.clone();
        }
        let result = self.scan_uncached(dir);
        self.cache.insert(dir.to_string(), result.clone());
        result
    }

    fn scan_uncached(&mut self, dir: &str) -> Option<Arc<DirectoryListing>> {
        if ignored::is_ignored_dir(dir) {
            return None;
        }
        let real_root = self.real_root.clone()?;

        let abs_dir = self.absolute(dir);
        let mut entries = match self.fs.list_directory(&abs_dir) {
            Ok(entries) => entries,
            Err(e) => return unknown(dir, &format!("cannot list directory: {e}")),
        };
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        let mut all_files = Vec::new();
        let mut direct_files = Vec::new();
        let mut has_subdirectories = false;

        for entry in entries {
            if ignored::is_ignored_name(&entry.name) {
                continue;
            }
            let rel = paths::join(dir, &entry.name);

            match self.fs.real_path(&self.absolute(&rel)) {
                Ok(real) if real.starts_with(&real_root) => {}
                Ok(real) => {
                    return unknown(
                        dir,
                        &format!("{rel} resolves outside the project ({})", real.display()),
                    )
                }
                Err(e) => return unknown(dir, &format!("cannot resolve {rel}: {e}")),
            }

            match entry.kind {
                EntryKind::File | EntryKind::FileLink => {
                    direct_files.push(rel.clone());
                    all_files.push(rel);
                }
                EntryKind::Directory => {
                    has_subdirectories = true;
                    let Some(child) = self.scan(&rel) else {
                        return unknown(dir, &format!("subtree {rel} is unknown"));
                    };
                    all_files.extend(child.all_files.iter().cloned());
                }
                EntryKind::DirectoryLink => {
                    return unknown(dir, &format!("{rel} is a linked directory"))
                }
                EntryKind::Other => return unknown(dir, &format!("{rel} is not a regular file")),
            }
        }

        all_files.sort();
        Some(Arc::new(DirectoryListing {
            dir: dir.to_string(),
            all_files,
            direct_files,
            has_subdirectories,
        }))
    }

    fn absolute(&self, rel: &str) -> PathBuf {
        if rel.is_empty() {
            self.root.clone()
        } else {
            self.root.join(rel)
        }
    }
}

fn unknown(dir: &str, reason: &str) -> Option<Arc<DirectoryListing>> {
    log::debug!("Scan of '{dir}' is unknown: {reason}");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFileSystem;
    use pretty_assertions::assert_eq;

    #[test]
    fn lists_visible_files_recursively() {
        let fs = MemoryFileSystem::with_files(
            "/p",
            &[
                "src/a.ts",
                "src/b.md",
                "src/nested/c.ts",
                "src/node_modules/dep/index.js",
                "src/debug.log",
                "src/.DS_Store",
            ],
        );
        let mut scanner = Scanner::new(&fs, "/p");

        let listing = scanner.scan("src").unwrap();
        assert_eq!(
            listing.all_files,
            vec!["src/a.ts", "src/b.md", "src/nested/c.ts"]
        );
        assert_eq!(listing.direct_files, vec!["src/a.ts", "src/b.md"]);
        assert!(listing.has_subdirectories);

        let nested = scanner.scan("src/nested").unwrap();
        assert_eq!(nested.all_files, vec!["src/nested/c.ts"]);
        assert!(!nested.has_subdirectories);
    }

    #[test]
    fn ignored_directories_are_never_scanned() {
        let fs = MemoryFileSystem::with_files("/p", &["node_modules/dep/a.js", "node_modules/dep/b.js"]);
        let mut scanner = Scanner::new(&fs, "/p");
        assert!(scanner.scan("node_modules/dep").is_none());
    }

    #[test]
    fn link_outside_root_makes_subtree_unknown() {
        let mut fs = MemoryFileSystem::with_files("/p", &["src/a.ts", "lib/b.ts"]);
        fs.add_file("/elsewhere/secret.ts");
        fs.add_symlink("/p/src/lib/escape.ts", "/elsewhere/secret.ts");
        let mut scanner = Scanner::new(&fs, "/p");

        assert!(scanner.scan("src/lib").is_none());
        assert!(scanner.scan("src").is_none());
        assert!(scanner.scan("").is_none());
        assert!(scanner.scan("lib").is_some());
    }

    #[test]
    fn file_link_inside_root_counts_as_file() {
        let mut fs = MemoryFileSystem::with_files("/p", &["src/a.ts", "shared/b.ts"]);
        fs.add_symlink("/p/src/b.ts", "/p/shared/b.ts");
        let mut scanner = Scanner::new(&fs, "/p");

        let listing = scanner.scan("src").unwrap();
        assert_eq!(listing.all_files, vec!["src/a.ts", "src/b.ts"]);
    }

    #[test]
    fn linked_directories_and_special_entries_abort() {
        let mut fs = MemoryFileSystem::with_files("/p", &["a/x.ts", "b/y.ts", "c/z.ts"]);
        fs.add_symlink("/p/a/linked", "/p/b");
        fs.add_special("/p/c/socket");
        fs.add_unreadable_dir("/p/d");
        let mut scanner = Scanner::new(&fs, "/p");

        assert!(scanner.scan("a").is_none());
        assert!(scanner.scan("b").is_some());
        assert!(scanner.scan("c").is_none());
        assert!(scanner.scan("d").is_none());
    }

    #[test]
    fn broken_link_aborts() {
        let mut fs = MemoryFileSystem::with_files("/p", &["src/a.ts"]);
        fs.add_symlink("/p/src/gone.ts", "/p/missing.ts");
        let mut scanner = Scanner::new(&fs, "/p");
        assert!(scanner.scan("src").is_none());
    }
}
