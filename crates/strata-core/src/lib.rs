pub mod check;
pub mod config;
pub mod error;
pub mod fetch;
pub mod manifest;
pub mod render;
pub mod resolve;
pub mod vfs;

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::{Result, StrataError};
use crate::fetch::RepositoryFetcher;
use crate::manifest::{validate_arguments, ServiceManifest};
use crate::render::{build_worklist, OutputWriter, Renderer, RunReport};
use crate::resolve::resolve_service;

/// Options for [`render_service`].
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Directory the service is generated into.
    pub target_dir: PathBuf,
    /// Output extension to formatter command line.
    pub formatters: BTreeMap<String, Vec<String>>,
}

impl RenderOptions {
    pub fn new(target_dir: impl Into<PathBuf>) -> Self {
        Self {
            target_dir: target_dir.into(),
            formatters: BTreeMap::new(),
        }
    }

    pub fn with_formatters(mut self, formatters: BTreeMap<String, Vec<String>>) -> Self {
        self.formatters = formatters;
        self
    }
}

/// Main entry point: render a service from its template repositories.
///
/// Nothing is written unless every repository resolves and every declared
/// argument validates.
pub fn render_service(
    manifest: &ServiceManifest,
    fetcher: &dyn RepositoryFetcher,
    options: &RenderOptions,
) -> Result<RunReport> {
    // 1. Resolve the layer stack and argument schema
    if manifest.repositories.is_empty() {
        return Err(StrataError::NoRepositories);
    }
    let (tree, declared) = resolve_service(fetcher, manifest)?;

    // 2. Validate supplied arguments
    validate_arguments(&declared, &manifest.arguments)?;

    // 3. Prepare output
    std::fs::create_dir_all(&options.target_dir).map_err(|e| StrataError::Io {
        context: format!("creating output directory {}", options.target_dir.display()),
        source: e,
    })?;
    let writer = OutputWriter::from_commands(&options.formatters);
    let renderer = Renderer::new(&tree, manifest, &writer, &options.target_dir);

    // 4. Select and render the worklist
    let worklist = build_worklist(&renderer)?;
    tracing::info!(templates = worklist.templates.len(), layers = tree.layers().len(), "rendering service {}", manifest.name);
    let report = renderer.render_all(&worklist)?;

    tracing::info!(%report, "render complete");
    Ok(report)
}
