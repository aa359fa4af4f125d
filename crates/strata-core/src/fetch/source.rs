use std::path::{Path, PathBuf};

use crate::error::{Result, StrataError};

/// Where a template repository's contents come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositorySource {
    Local(PathBuf),
    Git {
        url: String,
        git_ref: Option<String>,
    },
}

/// Built-in abbreviation prefixes and their expansion targets.
const ABBREVIATIONS: &[(&str, &str, &str)] = &[
    ("gh:", "https://github.com/", ".git"),
    ("gl:", "https://gitlab.com/", ".git"),
    ("bb:", "https://bitbucket.org/", ".git"),
    ("sr:", "https://git.sr.ht/", ""),
];

/// Expand a shorthand abbreviation (e.g. `gh:user/repo`) into a full git URL.
///
/// Returns `Ok(None)` when the input is not an abbreviation at all.
fn expand_abbreviation(input: &str) -> Result<Option<String>> {
    for &(prefix, base_url, suffix) in ABBREVIATIONS {
        if let Some(rest) = input.strip_prefix(prefix) {
            if rest.is_empty() {
                return Err(StrataError::InvalidAbbreviation {
                    input: input.to_string(),
                });
            }
            return Ok(Some(format!("{base_url}{rest}{suffix}")));
        }
    }
    Ok(None)
}

fn is_git_url(input: &str) -> bool {
    input.starts_with("https://")
        || input.starts_with("http://")
        || input.starts_with("ssh://")
        || input.starts_with("git@")
        || input.ends_with(".git")
}

/// Classify a repository URL.
///
/// Detection order:
/// 1. Known abbreviation prefix (`gh:`, `gl:`, `bb:`, `sr:`) -> expand -> Git
/// 2. Explicit git URL (`https://`, `ssh://`, `git@`, or `.git` suffix) -> Git
/// 3. Otherwise an existing local directory
pub fn resolve_source(url: &str, git_ref: Option<&str>) -> Result<RepositorySource> {
    if let Some(expanded) = expand_abbreviation(url)? {
        return Ok(RepositorySource::Git {
            url: expanded,
            git_ref: git_ref.map(String::from),
        });
    }

    if is_git_url(url) {
        return Ok(RepositorySource::Git {
            url: url.to_string(),
            git_ref: git_ref.map(String::from),
        });
    }

    let path = Path::new(url);
    if path.is_dir() {
        let canonical = path.canonicalize().map_err(|e| StrataError::Io {
            context: format!("resolving path {}", path.display()),
            source: e,
        })?;
        Ok(RepositorySource::Local(canonical))
    } else {
        Err(StrataError::NotFound {
            path: path.to_path_buf(),
        })
    }
}
