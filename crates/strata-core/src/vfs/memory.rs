use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use crate::error::{Result, StrataError};

use super::{normalize, not_found, FileInfo, FileKind, FileTree};

const MAX_SYMLINK_HOPS: usize = 40;

#[derive(Debug, Clone)]
enum Node {
    File { contents: Vec<u8>, executable: bool },
    Dir,
    Symlink(PathBuf),
}

/// A tree held entirely in memory. Parent directories are created implicitly.
#[derive(Debug, Default)]
pub struct MemoryTree {
    nodes: RefCell<BTreeMap<PathBuf, Node>>,
}

impl MemoryTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert used to assemble fixtures.
    pub fn with_file(self, path: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> Self {
        self.insert_file(path.as_ref(), contents.as_ref().to_vec(), false);
        self
    }

    pub fn with_executable(self, path: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> Self {
        self.insert_file(path.as_ref(), contents.as_ref().to_vec(), true);
        self
    }

    pub fn with_symlink(self, link: impl AsRef<Path>, target: impl AsRef<Path>) -> Self {
        let link = normalize(link.as_ref());
        self.insert_parents(&link);
        self.nodes
            .borrow_mut()
            .insert(link, Node::Symlink(target.as_ref().to_path_buf()));
        self
    }

    pub fn len(&self) -> usize {
        self.nodes
            .borrow()
            .values()
            .filter(|n| matches!(n, Node::File { .. }))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert_file(&self, path: &Path, contents: Vec<u8>, executable: bool) {
        let path = normalize(path);
        self.insert_parents(&path);
        self.nodes.borrow_mut().insert(
            path,
            Node::File {
                contents,
                executable,
            },
        );
    }

    fn insert_parents(&self, path: &Path) {
        let mut nodes = self.nodes.borrow_mut();
        for ancestor in path.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            nodes.entry(ancestor.to_path_buf()).or_insert(Node::Dir);
        }
    }

    fn node(&self, path: &Path) -> Option<Node> {
        if path.as_os_str().is_empty() {
            return Some(Node::Dir);
        }
        self.nodes.borrow().get(path).cloned()
    }

    /// Follow symlinks until a non-link node is reached.
    fn resolve(&self, path: &Path) -> Result<(PathBuf, Node)> {
        let mut current = normalize(path);
        for _ in 0..MAX_SYMLINK_HOPS {
            match self.node(&current) {
                Some(Node::Symlink(target)) => {
                    let base = current.parent().unwrap_or(Path::new("")).to_path_buf();
                    current = if target.is_absolute() {
                        normalize(&target)
                    } else {
                        normalize(&base.join(target))
                    };
                }
                Some(node) => return Ok((current, node)),
                None => return not_found(path),
            }
        }
        Err(StrataError::Io {
            context: format!("resolving {}", path.display()),
            source: std::io::Error::other("too many levels of symbolic links"),
        })
    }

    fn info(path: &Path, node: &Node) -> FileInfo {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match node {
            Node::File {
                contents,
                executable,
            } => FileInfo {
                name,
                kind: FileKind::File,
                len: contents.len() as u64,
                executable: *executable,
            },
            Node::Dir => FileInfo {
                name,
                kind: FileKind::Dir,
                len: 0,
                executable: false,
            },
            Node::Symlink(target) => FileInfo {
                name,
                kind: FileKind::Symlink,
                len: target.as_os_str().len() as u64,
                executable: false,
            },
        }
    }

    fn children(&self, dir: &Path) -> Vec<PathBuf> {
        self.nodes
            .borrow()
            .keys()
            .filter(|k| k.parent() == Some(dir))
            .cloned()
            .collect()
    }
}

impl FileTree for MemoryTree {
    fn open(&self, path: &Path) -> Result<Box<dyn Read + '_>> {
        match self.resolve(path)? {
            (_, Node::File { contents, .. }) => Ok(Box::new(Cursor::new(contents))),
            _ => Err(StrataError::Io {
                context: format!("opening {}", path.display()),
                source: std::io::Error::other("is a directory"),
            }),
        }
    }

    fn stat(&self, path: &Path) -> Result<FileInfo> {
        let (_, node) = self.resolve(path)?;
        Ok(Self::info(&normalize(path), &node))
    }

    fn lstat(&self, path: &Path) -> Result<FileInfo> {
        let path = normalize(path);
        match self.node(&path) {
            Some(node) => Ok(Self::info(&path, &node)),
            None => not_found(&path),
        }
    }

    fn read_link(&self, path: &Path) -> Result<PathBuf> {
        match self.node(&normalize(path)) {
            Some(Node::Symlink(target)) => Ok(target),
            Some(_) => Err(StrataError::Io {
                context: format!("reading link {}", path.display()),
                source: std::io::Error::other("not a symbolic link"),
            }),
            None => not_found(path),
        }
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<FileInfo>> {
        let (dir, node) = self.resolve(path)?;
        if !matches!(node, Node::Dir) {
            return Err(StrataError::Io {
                context: format!("listing {}", path.display()),
                source: std::io::Error::other("not a directory"),
            });
        }
        let nodes = self.nodes.borrow();
        Ok(self
            .children(&dir)
            .iter()
            .filter_map(|child| nodes.get(child).map(|n| Self::info(child, n)))
            .collect())
    }

    fn chroot(&self, path: &Path) -> Result<Box<dyn FileTree>> {
        let (root, node) = self.resolve(path)?;
        if !matches!(node, Node::Dir) {
            return Err(StrataError::Io {
                context: format!("chroot to {}", path.display()),
                source: std::io::Error::other("not a directory"),
            });
        }
        let sub = MemoryTree::new();
        {
            let nodes = self.nodes.borrow();
            let mut sub_nodes = sub.nodes.borrow_mut();
            for (key, node) in nodes.iter() {
                if let Ok(rel) = key.strip_prefix(&root) {
                    if !rel.as_os_str().is_empty() {
                        sub_nodes.insert(rel.to_path_buf(), node.clone());
                    }
                }
            }
        }
        Ok(Box::new(sub))
    }
}
