use std::path::{Path, PathBuf};

use crate::error::Result;

use super::{normalize, FileTree};

/// Collect every file below `dir`, depth first, in name order.
///
/// Symlinks to files are reported; symlinks to directories are not descended
/// into.
pub fn walk_files(tree: &dyn FileTree, dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    walk_into(tree, &normalize(dir), &mut files)?;
    Ok(files)
}

fn walk_into(tree: &dyn FileTree, dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let mut entries = tree.read_dir(dir)?;
    entries.sort_by(|a, b| a.name.cmp(&b.name));

    for entry in entries {
        let path = dir.join(&entry.name);
        if entry.is_dir() {
            walk_into(tree, &path, files)?;
        } else if entry.is_symlink() {
            if tree.stat(&path).map(|i| i.is_file()).unwrap_or(false) {
                files.push(path);
            }
        } else {
            files.push(path);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::{MemoryTree, MergedTree};

    #[test]
    fn walks_nested_files_in_order() {
        let tree = MemoryTree::new()
            .with_file("z.txt", "z")
            .with_file("a/b/c.txt", "c")
            .with_file("a/a.txt", "a");

        let files = walk_files(&tree, Path::new("")).unwrap();
        assert_eq!(
            files,
            vec![
                PathBuf::from("a/a.txt"),
                PathBuf::from("a/b/c.txt"),
                PathBuf::from("z.txt"),
            ]
        );
    }

    #[test]
    fn walks_merged_tree_once_per_path() {
        let tree = MergedTree::new(vec![
            Box::new(MemoryTree::new().with_file("src/main.go.tpl", "low").with_file("go.mod.tpl", "m")),
            Box::new(MemoryTree::new().with_file("src/main.go.tpl", "high")),
        ]);
        let files = walk_files(&tree, Path::new("")).unwrap();
        assert_eq!(
            files,
            vec![PathBuf::from("go.mod.tpl"), PathBuf::from("src/main.go.tpl")]
        );
    }

    #[test]
    fn skips_directory_symlinks() {
        let tree = MemoryTree::new()
            .with_file("real/file.txt", "f")
            .with_symlink("loop", "")
            .with_symlink("alias.txt", "real/file.txt");
        let files = walk_files(&tree, Path::new("")).unwrap();
        assert_eq!(
            files,
            vec![PathBuf::from("alias.txt"), PathBuf::from("real/file.txt")]
        );
    }
}
