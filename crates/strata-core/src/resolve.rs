//! Dependency resolution over template repositories.
//!
//! Each repository URL is fetched at most once per run. The first reference
//! to a URL wins, even when a later one asks for a different version.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use crate::error::{Result, StrataError};
use crate::fetch::RepositoryFetcher;
use crate::manifest::{load_repository_manifest, Argument, ServiceManifest, TemplateRepositoryManifest};
use crate::vfs::{FileTree, MergedTree};

/// Layers ordered lowest priority first, plus every argument declared along the way.
#[derive(Debug, Default)]
pub struct Resolution {
    pub layers: Vec<Box<dyn FileTree>>,
    pub arguments: BTreeMap<String, Argument>,
}

/// Resolve `manifest`'s dependencies depth first.
///
/// Every dependency contributes its sub-dependencies' layers followed by its
/// own, so a dependency always sits below whatever declared it. Argument
/// declarations are merged last-write-wins: a dependency's own declarations
/// first, then those gathered from its sub-dependencies.
pub fn resolve_dependencies(
    fetcher: &dyn RepositoryFetcher,
    visited: &mut HashSet<String>,
    manifest: &TemplateRepositoryManifest,
) -> Result<Resolution> {
    let mut resolution = Resolution::default();

    for dependency in &manifest.dependencies {
        if visited.contains(&dependency.git_url) {
            tracing::debug!(url = %dependency.git_url, "repository already resolved, skipping");
            continue;
        }

        let wrap = |e: StrataError| StrataError::Repository {
            url: dependency.git_url.clone(),
            source: Box::new(e),
        };

        let tree = fetcher.fetch(dependency).map_err(wrap)?;
        visited.insert(dependency.git_url.clone());

        let dep_manifest = load_repository_manifest(tree.as_ref()).map_err(wrap)?;
        resolution.arguments.extend(dep_manifest.arguments.clone());

        let layer = match dep_manifest.template_dir.as_deref() {
            Some(dir) => tree.chroot(Path::new(dir)).map_err(wrap)?,
            None => tree,
        };

        let nested = resolve_dependencies(fetcher, visited, &dep_manifest)?;
        resolution.arguments.extend(nested.arguments);
        resolution.layers.extend(nested.layers);
        resolution.layers.push(layer);
    }

    Ok(resolution)
}

/// Resolve every repository a service lists into one layered tree and the
/// complete argument schema.
pub fn resolve_service(
    fetcher: &dyn RepositoryFetcher,
    service: &ServiceManifest,
) -> Result<(MergedTree, BTreeMap<String, Argument>)> {
    let root = TemplateRepositoryManifest {
        name: service.name.clone(),
        dependencies: service.repositories.clone(),
        ..Default::default()
    };

    let resolution = resolve_dependencies(fetcher, &mut HashSet::new(), &root)?;
    tracing::debug!(layers = resolution.layers.len(), arguments = resolution.arguments.len(), "resolved template repositories");

    Ok((MergedTree::new(resolution.layers), resolution.arguments))
}
