use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::Result;

use super::{not_found, FileInfo, FileTree};

/// A read-only union of trees. Index 0 has the lowest priority; lookups
/// search from the last layer down and the first layer holding the path wins.
///
/// Mutating operations keep the trait's `UnsupportedOperation` defaults.
#[derive(Debug, Default)]
pub struct MergedTree {
    layers: Vec<Box<dyn FileTree>>,
}

impl MergedTree {
    pub fn new(layers: Vec<Box<dyn FileTree>>) -> Self {
        Self { layers }
    }

    pub fn layers(&self) -> &[Box<dyn FileTree>] {
        &self.layers
    }

    /// The highest-priority layer where `path` exists, following symlinks.
    fn find(&self, path: &Path) -> Option<&dyn FileTree> {
        self.layers
            .iter()
            .rev()
            .map(|layer| layer.as_ref())
            .find(|layer| layer.stat(path).is_ok())
    }

    /// Same as [`MergedTree::find`] but a dangling symlink still counts as present.
    fn find_entry(&self, path: &Path) -> Option<&dyn FileTree> {
        self.layers
            .iter()
            .rev()
            .map(|layer| layer.as_ref())
            .find(|layer| layer.lstat(path).is_ok())
    }
}

impl FileTree for MergedTree {
    fn open(&self, path: &Path) -> Result<Box<dyn Read + '_>> {
        match self.find(path) {
            Some(layer) => layer.open(path),
            None => not_found(path),
        }
    }

    fn stat(&self, path: &Path) -> Result<FileInfo> {
        match self.find(path) {
            Some(layer) => layer.stat(path),
            None => not_found(path),
        }
    }

    fn lstat(&self, path: &Path) -> Result<FileInfo> {
        match self.find_entry(path) {
            Some(layer) => layer.lstat(path),
            None => not_found(path),
        }
    }

    fn read_link(&self, path: &Path) -> Result<PathBuf> {
        match self.find_entry(path) {
            Some(layer) => layer.read_link(path),
            None => not_found(path),
        }
    }

    /// Union of every layer's listing, one entry per name. When several layers
    /// list the same name, the highest-priority layer's metadata is kept.
    fn read_dir(&self, path: &Path) -> Result<Vec<FileInfo>> {
        let mut entries: BTreeMap<String, FileInfo> = BTreeMap::new();
        let mut found = false;

        for layer in &self.layers {
            match layer.read_dir(path) {
                Ok(listing) => {
                    found = true;
                    for info in listing {
                        entries.insert(info.name.clone(), info);
                    }
                }
                Err(e) => {
                    tracing::trace!(path = %path.display(), error = %e, "layer has no such directory");
                }
            }
        }

        if !found {
            return not_found(path);
        }
        Ok(entries.into_values().collect())
    }

    /// Delegates to the layer owning `path`; layers below it are not visible
    /// in the returned tree.
    fn chroot(&self, path: &Path) -> Result<Box<dyn FileTree>> {
        match self.find(path) {
            Some(layer) => layer.chroot(path),
            None => not_found(path),
        }
    }
}
