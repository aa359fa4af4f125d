pub mod git;
pub mod source;

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::Result;
use crate::manifest::TemplateRepository;
use crate::vfs::{FileTree, LocalTree};

pub use git::{clone_repository, ensure_git_repository};
pub use source::{resolve_source, RepositorySource};

/// Turns a repository reference into its file tree.
pub trait RepositoryFetcher {
    fn fetch(&self, repository: &TemplateRepository) -> Result<Box<dyn FileTree>>;
}

/// Fetches repositories from git remotes or local directories.
///
/// `overrides` maps a repository URL to a local checkout, so templates can be
/// developed without pushing them first.
#[derive(Debug, Default, Clone)]
pub struct Fetcher {
    overrides: BTreeMap<String, PathBuf>,
}

impl Fetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_overrides(overrides: BTreeMap<String, PathBuf>) -> Self {
        Self { overrides }
    }
}

impl RepositoryFetcher for Fetcher {
    fn fetch(&self, repository: &TemplateRepository) -> Result<Box<dyn FileTree>> {
        if let Some(local) = self.overrides.get(&repository.git_url) {
            tracing::info!(url = %repository.git_url, path = %local.display(), "using local override");
            return Ok(Box::new(LocalTree::new(local.clone())));
        }

        match resolve_source(&repository.git_url, repository.version.as_deref())? {
            RepositorySource::Local(path) => {
                tracing::info!(path = %path.display(), "using local repository");
                Ok(Box::new(LocalTree::new(path)))
            }
            RepositorySource::Git { url, git_ref } => {
                tracing::info!(url = %url, version = git_ref.as_deref().unwrap_or("HEAD"), "downloading repository");
                Ok(Box::new(clone_repository(&url, git_ref.as_deref())?))
            }
        }
    }
}
