use std::path::Path;

use crate::error::{Result, StrataError};
use crate::vfs::LocalTree;

/// Clone a git repository into a temporary directory and expose it as a tree.
///
/// If `git_ref` is provided the repository is checked out at that tag or
/// branch. The checkout is deleted when the returned tree is dropped.
///
/// Rejects `file://` URLs; local directories are referenced by plain path instead.
pub fn clone_repository(url: &str, git_ref: Option<&str>) -> Result<LocalTree> {
    // Reject file:// URLs
    if url.starts_with("file://") {
        return Err(StrataError::UnsafeUrl {
            url: url.to_string(),
            reason: "file:// URLs are not allowed; use a plain directory path".into(),
        });
    }

    if url.starts_with("http://") {
        tracing::warn!(url, "using insecure http:// URL; consider https:// instead");
    }

    // Clone into a temp dir owned by the returned tree
    let tmp_dir = tempfile::tempdir().map_err(|e| StrataError::Io {
        context: "creating temporary directory for git clone".into(),
        source: e,
    })?;

    let mut prepare =
        gix::prepare_clone(url, tmp_dir.path()).map_err(|e| StrataError::FetchFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    // Pin to the requested tag or branch
    if let Some(ref_name) = git_ref {
        prepare = prepare
            .with_ref_name(Some(ref_name))
            .map_err(|e| StrataError::GitCheckout {
                url: url.to_string(),
                git_ref: ref_name.to_string(),
                reason: e.to_string(),
            })?;
    }

    // Fetch and prepare for checkout
    let (mut checkout, _outcome) = prepare
        .fetch_then_checkout(gix::progress::Discard, &gix::interrupt::IS_INTERRUPTED)
        .map_err(|e| StrataError::FetchFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    // Checkout the main worktree
    let (repo, _outcome) = checkout
        .main_worktree(gix::progress::Discard, &gix::interrupt::IS_INTERRUPTED)
        .map_err(|e| StrataError::FetchFailed {
            url: url.to_string(),
            reason: format!("worktree checkout failed: {e}"),
        })?;

    if let Ok(id) = repo.head_id() {
        tracing::debug!(url, commit = %id, "checked out repository");
    }

    Ok(LocalTree::from_tempdir(tmp_dir))
}

/// Initialise a git repository in `dir` unless it already sits inside one.
///
/// Returns `true` when a new repository was created.
pub fn ensure_git_repository(dir: &Path) -> Result<bool> {
    // Already inside a repository
    if gix::discover(dir).is_ok() {
        return Ok(false);
    }

    tracing::info!(path = %dir.display(), "running git init");
    gix::init(dir).map_err(|e| StrataError::GitInit {
        path: dir.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(true)
}
