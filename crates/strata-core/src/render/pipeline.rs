use std::path::{Path, PathBuf};

use tera::Context;

use crate::error::Result;
use crate::manifest::{ServiceManifest, Template, TemplateList};
use crate::render::blocks::{read_preserved_blocks, BlockMap};
use crate::render::engine::TemplateEngine;
use crate::render::report::{RunReport, WriteAction};
use crate::render::writer::OutputWriter;
use crate::vfs::{normalize, FileTree};

/// Renders templates from the layered tree into the target directory.
#[derive(Debug)]
pub struct Renderer<'a> {
    tree: &'a dyn FileTree,
    manifest: &'a ServiceManifest,
    engine: TemplateEngine,
    writer: &'a OutputWriter,
    target_dir: &'a Path,
}

impl<'a> Renderer<'a> {
    pub fn new(
        tree: &'a dyn FileTree,
        manifest: &'a ServiceManifest,
        writer: &'a OutputWriter,
        target_dir: &'a Path,
    ) -> Self {
        Self {
            tree,
            manifest,
            engine: TemplateEngine::new(manifest.arguments.clone()),
            writer,
            target_dir,
        }
    }

    pub fn tree(&self) -> &dyn FileTree {
        self.tree
    }

    pub fn target_dir(&self) -> &Path {
        self.target_dir
    }

    /// Render every entry of `list`, in path order.
    pub fn render_all(&self, list: &TemplateList) -> Result<RunReport> {
        let mut report = RunReport::default();
        for (write_path, template) in &list.templates {
            let (path, action) = self.render_file(Path::new(write_path), template)?;
            report.push(path, action);
        }
        Ok(report)
    }

    /// Render one template whose declared output is `write_path`.
    ///
    /// Returns the path actually targeted (after any `setOutputName`) and
    /// what was done with it.
    pub fn render_file(&self, write_path: &Path, template: &Template) -> Result<(PathBuf, WriteAction)> {
        let source = Path::new(&template.source);
        let write_path = normalize(write_path);

        // Load the template from the layered tree
        let body = self.tree.read(source)?;
        let body = String::from_utf8_lossy(&body);

        // Render against the blocks of the declared output
        let blocks = read_preserved_blocks(&self.target_dir.join(&write_path))?;
        let mut rendered = self.engine.render(source, &body, &self.context(&blocks), &write_path)?;

        // Redirected by setOutputName: blocks come from the file being overwritten
        let mut output_path = normalize(&rendered.session.output_path);
        if output_path != write_path {
            let blocks = read_preserved_blocks(&self.target_dir.join(&output_path))?;
            rendered = self.engine.render(source, &body, &self.context(&blocks), &output_path)?;
            output_path = normalize(&rendered.session.output_path);
        }
        let session = rendered.session;

        let target = self.target_dir.join(&output_path);
        let existed = target.exists();

        // Decide what to do with the rendered body
        let action = if (template.is_static || session.is_static) && existed {
            WriteAction::Skipping
        } else if !session.write_allowed {
            WriteAction::Skipping
        } else {
            self.writer.write(&target, rendered.body.as_bytes())?;
            if existed {
                WriteAction::Updated
            } else {
                WriteAction::Created
            }
        };

        tracing::info!(path = %output_path.display(), action = %action, template = %source.display(), "processed template");
        Ok((output_path, action))
    }

    fn context(&self, blocks: &BlockMap) -> Context {
        let mut context = Context::new();
        context.insert("manifest", self.manifest);
        for (name, value) in &self.manifest.arguments {
            context.insert(name.as_str(), value);
        }
        for (name, content) in blocks {
            context.insert(name.as_str(), content);
        }
        context
    }
}
