//! Filesystem capability consumed by the scanner.
//!
//! The compiler never touches `std::fs` directly; it goes through
//! [`FileSystem`] so the rule engine can run against [`MemoryFileSystem`]
//! in tests.

use std::collections::BTreeMap;
use std::io;
use std::path::{Component, Path, PathBuf};

/// What a directory entry is, with symbolic links classified by their target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    /// Symbolic link resolving to a regular file
    FileLink,
    /// Symbolic link resolving to a directory
    DirectoryLink,
    /// Sockets, devices, FIFOs, broken links, non UTF-8 names
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub kind: EntryKind,
}

pub trait FileSystem {
    /// Entries directly inside `path`, in no particular order
    fn list_directory(&self, path: &Path) -> io::Result<Vec<DirEntry>>;

    /// Canonical location of `path` with every link resolved
    fn real_path(&self, path: &Path) -> io::Result<PathBuf>;

    fn exists(&self, path: &Path) -> bool;
}

/// The real filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn list_directory(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            let Ok(name) = entry.file_name().into_string() else {
                entries.push(DirEntry {
                    name: entry.file_name().to_string_lossy().into_owned(),
                    kind: EntryKind::Other,
                });
                continue;
            };

            let kind = if file_type.is_file() {
                EntryKind::File
            } else if file_type.is_dir() {
                EntryKind::Directory
            } else if file_type.is_symlink() {
                match std::fs::metadata(entry.path()) {
                    Ok(meta) if meta.is_file() => EntryKind::FileLink,
                    Ok(meta) if meta.is_dir() => EntryKind::DirectoryLink,
                    _ => EntryKind::Other,
                }
            } else {
                EntryKind::Other
            };
            entries.push(DirEntry { name, kind });
        }
        Ok(entries)
    }

    fn real_path(&self, path: &Path) -> io::Result<PathBuf> {
        std::fs::canonicalize(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum MemNode {
    File,
    Dir,
    Unreadable,
    Special,
    Link(PathBuf),
}

const MAX_LINK_HOPS: usize = 40;

/// In-memory filesystem fixture.
///
/// Paths are absolute; parents are created implicitly.
///
/// ```
/// use context_preset::{FileSystem, MemoryFileSystem};
/// use std::path::Path;
///
/// let fs = MemoryFileSystem::with_files("/project", &["src/lib.rs", "README.md"]);
/// assert!(fs.exists(Path::new("/project/src/lib.rs")));
/// assert_eq!(fs.list_directory(Path::new("/project")).unwrap().len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    nodes: BTreeMap<PathBuf, MemNode>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fixture with `files` (relative to `root`) created under `root`
    pub fn with_files(root: impl AsRef<Path>, files: &[&str]) -> Self {
        let root = root.as_ref();
        let mut fs = Self::new();
        fs.add_dir(root);
        for file in files {
            fs.add_file(root.join(file));
        }
        fs
    }

    pub fn add_file(&mut self, path: impl AsRef<Path>) -> &mut Self {
        self.insert(path.as_ref(), MemNode::File)
    }

    pub fn add_dir(&mut self, path: impl AsRef<Path>) -> &mut Self {
        self.insert(path.as_ref(), MemNode::Dir)
    }

    /// Directory whose listing fails with `PermissionDenied`
    pub fn add_unreadable_dir(&mut self, path: impl AsRef<Path>) -> &mut Self {
        self.insert(path.as_ref(), MemNode::Unreadable)
    }

    /// Socket/device style entry
    pub fn add_special(&mut self, path: impl AsRef<Path>) -> &mut Self {
        self.insert(path.as_ref(), MemNode::Special)
    }

    pub fn add_symlink(&mut self, path: impl AsRef<Path>, target: impl AsRef<Path>) -> &mut Self {
        self.insert(path.as_ref(), MemNode::Link(target.as_ref().to_path_buf()))
    }

    fn insert(&mut self, path: &Path, node: MemNode) -> &mut Self {
        let mut parent = path.parent();
        while let Some(dir) = parent {
            if dir.as_os_str().is_empty() {
                break;
            }
            self.nodes.entry(dir.to_path_buf()).or_insert(MemNode::Dir);
            parent = dir.parent();
        }
        self.nodes.insert(path.to_path_buf(), node);
        self
    }

    /// Follows links in every component of `path`
    fn resolve(&self, path: &Path) -> Option<PathBuf> {
        let mut hops = 0;
        let mut current = PathBuf::new();
        for component in path.components() {
            match component {
                Component::ParentDir => {
                    current.pop();
                }
                Component::CurDir => {}
                other => current.push(other.as_os_str()),
            }
            while let Some(MemNode::Link(target)) = self.nodes.get(&current) {
                hops += 1;
                if hops > MAX_LINK_HOPS {
                    return None;
                }
                current = if target.is_absolute() {
                    target.clone()
                } else {
                    current.parent()?.join(target)
                };
            }
        }
        self.nodes.contains_key(&current).then_some(current)
    }

    fn kind_of(&self, path: &Path) -> EntryKind {
        match self.nodes.get(path) {
            Some(MemNode::File) => EntryKind::File,
            Some(MemNode::Dir) | Some(MemNode::Unreadable) => EntryKind::Directory,
            Some(MemNode::Special) | None => EntryKind::Other,
            Some(MemNode::Link(_)) => match self.resolve(path).and_then(|p| self.nodes.get(&p)) {
                Some(MemNode::File) => EntryKind::FileLink,
                Some(MemNode::Dir) | Some(MemNode::Unreadable) => EntryKind::DirectoryLink,
                _ => EntryKind::Other,
            },
        }
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("{} does not exist", path.display()),
    )
}

impl FileSystem for MemoryFileSystem {
    fn list_directory(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let resolved = self.resolve(path).ok_or_else(|| not_found(path))?;
        match self.nodes.get(&resolved) {
            Some(MemNode::Dir) => {}
            Some(MemNode::Unreadable) => {
                return Err(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    format!("{} is not readable", path.display()),
                ))
            }
            _ => {
                return Err(io::Error::new(
                    io::ErrorKind::Other,
                    format!("{} is not a directory", path.display()),
                ))
            }
        }

        let entries = self
            .nodes
            .keys()
            .filter(|candidate| candidate.parent() == Some(resolved.as_path()))
            .map(|candidate| DirEntry {
                name: candidate
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                kind: self.kind_of(candidate),
            })
            .collect();
        Ok(entries)
    }

    fn real_path(&self, path: &Path) -> io::Result<PathBuf> {
        self.resolve(path).ok_or_else(|| not_found(path))
    }

    fn exists(&self, path: &Path) -> bool {
        self.resolve(path).is_some()
    }
}
