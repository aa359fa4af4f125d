//! Choosing which templates a run renders, and where each one is written.

use std::path::{Path, PathBuf};

use crate::error::{Result, StrataError};
use crate::manifest::generate::TEMPLATE_SUFFIX;
use crate::manifest::{parse_template_list, Template, TemplateList, TEMPLATE_LIST, TEMPLATE_LIST_TEMPLATE};
use crate::render::pipeline::Renderer;
use crate::render::report::WriteAction;
use crate::vfs::{walk_files, FileTree};

/// Where the worklist of a run comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorklistSource {
    /// `files.yaml.tpl` is rendered first and its output is the worklist.
    Bootstrap,
    /// A literal `files.yaml`.
    Listed,
    /// Every `*.tpl` file in the tree.
    Walk,
}

impl WorklistSource {
    pub fn detect(tree: &dyn FileTree) -> Self {
        if tree.exists(Path::new(TEMPLATE_LIST_TEMPLATE)) {
            WorklistSource::Bootstrap
        } else if tree.exists(Path::new(TEMPLATE_LIST)) {
            WorklistSource::Listed
        } else {
            WorklistSource::Walk
        }
    }
}

/// Build the worklist for the tree behind `renderer`.
pub fn build_worklist(renderer: &Renderer<'_>) -> Result<TemplateList> {
    let tree = renderer.tree();
    let source = WorklistSource::detect(tree);
    tracing::debug!(?source, "selecting worklist");

    match source {
        WorklistSource::Bootstrap => bootstrap_template_list(renderer),
        WorklistSource::Listed => {
            let path = Path::new(TEMPLATE_LIST);
            parse_template_list(&tree.read(path)?, path)
        }
        WorklistSource::Walk => walk_template_list(tree),
    }
}

/// Render `files.yaml.tpl` into the target directory, parse the result and
/// remove it again.
///
/// The template may suppress itself with `writeIf`, in which case nothing is
/// generated.
pub fn bootstrap_template_list(renderer: &Renderer<'_>) -> Result<TemplateList> {
    let bootstrap = Template {
        source: TEMPLATE_LIST_TEMPLATE.to_string(),
        is_static: false,
    };

    let (path, action) = renderer.render_file(Path::new(TEMPLATE_LIST), &bootstrap)?;
    if action == WriteAction::Skipping {
        tracing::warn!(template = TEMPLATE_LIST_TEMPLATE, "worklist template produced no output; nothing to render");
        return Ok(TemplateList::default());
    }

    let output = RemoveOnDrop(renderer.target_dir().join(&path));
    let bytes = std::fs::read(&output.0).map_err(|e| StrataError::Io {
        context: format!("reading {}", output.0.display()),
        source: e,
    })?;
    parse_template_list(&bytes, &path)
}

/// Every `*.tpl` file in the tree, written to its own path minus the suffix.
pub fn walk_template_list(tree: &dyn FileTree) -> Result<TemplateList> {
    let mut list = TemplateList::default();

    for path in walk_files(tree, Path::new(""))? {
        if path.starts_with(".git") || path == Path::new(TEMPLATE_LIST_TEMPLATE) {
            continue;
        }
        let source = path.to_string_lossy();
        let Some(write_path) = source.strip_suffix(TEMPLATE_SUFFIX) else {
            continue;
        };
        list.templates.insert(
            write_path.to_string(),
            Template {
                source: source.to_string(),
                is_static: false,
            },
        );
    }

    Ok(list)
}

/// Deletes the intermediate worklist file however the run ends.
struct RemoveOnDrop(PathBuf);

impl Drop for RemoveOnDrop {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.0) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %self.0.display(), error = %e, "failed to remove intermediate worklist");
            }
        }
    }
}
