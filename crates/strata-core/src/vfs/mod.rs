//! Read-only file trees and the layered view built on top of them.
//!
//! A [`FileTree`] is one template repository's contents: an in-memory tree in
//! tests, an on-disk checkout otherwise. [`MergedTree`] stacks several trees so
//! that later layers shadow earlier ones path by path.

pub mod local;
pub mod memory;
pub mod merged;
pub mod walk;

use std::fmt;
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use crate::error::{Result, StrataError};

pub use local::LocalTree;
pub use memory::MemoryTree;
pub use merged::MergedTree;
pub use walk::walk_files;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    File,
    Dir,
    Symlink,
}

/// Metadata for a single entry of a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// Final path component; empty for the root.
    pub name: String,
    pub kind: FileKind,
    pub len: u64,
    pub executable: bool,
}

impl FileInfo {
    pub fn is_dir(&self) -> bool {
        self.kind == FileKind::Dir
    }

    pub fn is_file(&self) -> bool {
        self.kind == FileKind::File
    }

    pub fn is_symlink(&self) -> bool {
        self.kind == FileKind::Symlink
    }
}

/// A read-only tree of files addressed by relative, `/`-separated paths.
///
/// The lookup methods are required. The mutating methods always fail with
/// [`StrataError::UnsupportedOperation`].
pub trait FileTree: fmt::Debug {
    fn open(&self, path: &Path) -> Result<Box<dyn Read + '_>>;

    /// Metadata, following symlinks.
    fn stat(&self, path: &Path) -> Result<FileInfo>;

    /// Metadata of the entry itself, without following symlinks.
    fn lstat(&self, path: &Path) -> Result<FileInfo>;

    fn read_link(&self, path: &Path) -> Result<PathBuf>;

    fn read_dir(&self, path: &Path) -> Result<Vec<FileInfo>>;

    /// A new tree rooted at `path`.
    fn chroot(&self, path: &Path) -> Result<Box<dyn FileTree>>;

    /// Convenience over [`FileTree::open`] that reads the whole file.
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let mut reader = self.open(path)?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).map_err(|e| StrataError::Io {
            context: format!("reading {}", path.display()),
            source: e,
        })?;
        Ok(buf)
    }

    fn exists(&self, path: &Path) -> bool {
        self.stat(path).is_ok()
    }

    fn create(&self, path: &Path, _contents: &[u8]) -> Result<()> {
        unsupported("create", path)
    }

    /// Open `path` for writing.
    fn open_file(&self, path: &Path) -> Result<Box<dyn std::io::Write + '_>> {
        unsupported("open_file", path)
    }

    fn rename(&self, from: &Path, _to: &Path) -> Result<()> {
        unsupported("rename", from)
    }

    fn remove(&self, path: &Path) -> Result<()> {
        unsupported("remove", path)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        unsupported("create_dir_all", path)
    }

    fn symlink(&self, _target: &Path, link: &Path) -> Result<()> {
        unsupported("symlink", link)
    }

    fn chmod(&self, path: &Path, _executable: bool) -> Result<()> {
        unsupported("chmod", path)
    }

    fn chown(&self, path: &Path, _uid: u32, _gid: u32) -> Result<()> {
        unsupported("chown", path)
    }

    fn chtimes(&self, path: &Path, _accessed: SystemTime, _modified: SystemTime) -> Result<()> {
        unsupported("chtimes", path)
    }

    fn temp_file(&self, dir: &Path, _prefix: &str) -> Result<PathBuf> {
        unsupported("temp_file", dir)
    }
}

fn unsupported<T>(operation: &'static str, path: &Path) -> Result<T> {
    Err(StrataError::UnsupportedOperation {
        operation,
        path: path.to_path_buf(),
    })
}

/// Reduce a path to its normal components: `./a/../b/` and `/b` both become `b`.
/// The root is the empty path.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }
    out
}

pub(crate) fn not_found<T>(path: &Path) -> Result<T> {
    Err(StrataError::NotFound {
        path: path.to_path_buf(),
    })
}
