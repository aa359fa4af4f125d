use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Result, StrataError};

use super::{normalize, not_found, FileInfo, FileKind, FileTree};

/// A directory on disk exposed as a read-only [`FileTree`].
///
/// When the directory is a temporary checkout, the tree keeps the
/// [`tempfile::TempDir`] alive; it is removed once the last tree (including
/// chrooted views) referencing it is dropped.
#[derive(Debug, Clone)]
pub struct LocalTree {
    root: PathBuf,
    _checkout: Option<Arc<tempfile::TempDir>>,
}

impl LocalTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            _checkout: None,
        }
    }

    /// Take ownership of a temporary checkout and expose it as a tree.
    pub fn from_tempdir(dir: tempfile::TempDir) -> Self {
        Self {
            root: dir.path().to_path_buf(),
            _checkout: Some(Arc::new(dir)),
        }
    }

    fn full_path(&self, path: &Path) -> PathBuf {
        self.root.join(normalize(path))
    }

    fn map_io(&self, path: &Path, context: &str, e: std::io::Error) -> StrataError {
        if e.kind() == std::io::ErrorKind::NotFound {
            StrataError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            StrataError::Io {
                context: format!("{context} {}", path.display()),
                source: e,
            }
        }
    }
}

fn info_from_metadata(name: String, meta: &fs::Metadata) -> FileInfo {
    let file_type = meta.file_type();
    let kind = if file_type.is_symlink() {
        FileKind::Symlink
    } else if file_type.is_dir() {
        FileKind::Dir
    } else {
        FileKind::File
    };

    #[cfg(unix)]
    let executable = {
        use std::os::unix::fs::PermissionsExt;
        kind == FileKind::File && meta.permissions().mode() & 0o111 != 0
    };
    #[cfg(not(unix))]
    let executable = false;

    FileInfo {
        name,
        kind,
        len: meta.len(),
        executable,
    }
}

fn file_name(path: &Path) -> String {
    normalize(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

impl FileTree for LocalTree {
    fn open(&self, path: &Path) -> Result<Box<dyn Read + '_>> {
        let file = fs::File::open(self.full_path(path)).map_err(|e| self.map_io(path, "opening", e))?;
        Ok(Box::new(file))
    }

    fn stat(&self, path: &Path) -> Result<FileInfo> {
        let meta = fs::metadata(self.full_path(path)).map_err(|e| self.map_io(path, "stat", e))?;
        Ok(info_from_metadata(file_name(path), &meta))
    }

    fn lstat(&self, path: &Path) -> Result<FileInfo> {
        let meta = fs::symlink_metadata(self.full_path(path))
            .map_err(|e| self.map_io(path, "lstat", e))?;
        Ok(info_from_metadata(file_name(path), &meta))
    }

    fn read_link(&self, path: &Path) -> Result<PathBuf> {
        fs::read_link(self.full_path(path)).map_err(|e| self.map_io(path, "reading link", e))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<FileInfo>> {
        let entries = fs::read_dir(self.full_path(path)).map_err(|e| self.map_io(path, "listing", e))?;

        let mut infos = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| self.map_io(path, "listing", e))?;
            let meta = entry
                .metadata()
                .map_err(|e| self.map_io(&entry.path(), "stat", e))?;
            infos.push(info_from_metadata(
                entry.file_name().to_string_lossy().into_owned(),
                &meta,
            ));
        }
        Ok(infos)
    }

    fn chroot(&self, path: &Path) -> Result<Box<dyn FileTree>> {
        let info = self.stat(path)?;
        if !info.is_dir() {
            return not_found(path);
        }
        Ok(Box::new(LocalTree {
            root: self.full_path(path),
            _checkout: self._checkout.clone(),
        }))
    }
}
