use std::collections::BTreeMap;

/// Tree of selected paths.
///
/// Children are kept in a `BTreeMap`, and every traversal yields directories
/// before files, each group in lexicographic order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionTree {
    root: Node,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Dir(BTreeMap<String, Node>),
}

impl Node {
    fn dir(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: NodeKind::Dir(BTreeMap::new()),
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self.kind, NodeKind::Dir(_))
    }

    /// Children with directories first
    pub fn children(&self) -> impl Iterator<Item = &Node> {
        let children = match &self.kind {
            NodeKind::Dir(children) => Some(children),
            NodeKind::File => None,
        };
        let dirs = children
            .into_iter()
            .flat_map(|c| c.values())
            .filter(|n| n.is_dir());
        let files = children
            .into_iter()
            .flat_map(|c| c.values())
            .filter(|n| !n.is_dir());
        dirs.chain(files)
    }
}

impl Default for SelectionTree {
    fn default() -> Self {
        Self {
            root: Node::dir(""),
        }
    }
}

impl SelectionTree {
    pub fn from_paths<'a>(paths: impl IntoIterator<Item = &'a str>) -> Self {
        let mut tree = Self::default();
        for path in paths {
            tree.insert(path);
        }
        tree
    }

    /// Inserts a normalized relative file path.
    ///
    /// A path that is both a file and a parent of another path is kept as a
    /// directory.
    pub fn insert(&mut self, path: &str) {
        let mut node = &mut self.root;
        let mut segments = path.split('/').peekable();
        while let Some(segment) = segments.next() {
            let is_last = segments.peek().is_none();
            if let NodeKind::File = node.kind {
                node.kind = NodeKind::Dir(BTreeMap::new());
            }
            let NodeKind::Dir(children) = &mut node.kind else {
                unreachable!("converted to a directory above");
            };
            node = children.entry(segment.to_string()).or_insert_with(|| {
                if is_last {
                    Node {
                        name: segment.to_string(),
                        kind: NodeKind::File,
                    }
                } else {
                    Node::dir(segment)
                }
            });
        }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Every directory path below the root, in traversal order
    pub fn directories(&self) -> Vec<String> {
        let mut out = Vec::new();
        collect(&self.root, "", &mut |path: &str, node: &Node| {
            if node.is_dir() {
                out.push(path.to_string());
            }
        });
        out
    }

    /// Every file path, in traversal order
    pub fn files(&self) -> Vec<String> {
        let mut out = Vec::new();
        collect(&self.root, "", &mut |path: &str, node: &Node| {
            if !node.is_dir() {
                out.push(path.to_string());
            }
        });
        out
    }
}

fn collect<F: FnMut(&str, &Node)>(node: &Node, prefix: &str, visit: &mut F) {
    for child in node.children() {
        let path = crate::paths::join(prefix, &child.name);
        visit(&path, child);
        collect(child, &path, &mut *visit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn traversal_puts_directories_before_files() {
        let tree = SelectionTree::from_paths(["src/z.rs", "src/a/b.rs", "README.md", "src/b.rs"]);
        assert_eq!(tree.files(), vec!["src/a/b.rs", "src/b.rs", "src/z.rs", "README.md"]);
        assert_eq!(tree.directories(), vec!["src", "src/a"]);
    }

    #[test]
    fn file_and_directory_conflict_keeps_directory() {
        let tree = SelectionTree::from_paths(["a", "a/b"]);
        assert_eq!(tree.directories(), vec!["a"]);
        assert_eq!(tree.files(), vec!["a/b"]);
    }
}
