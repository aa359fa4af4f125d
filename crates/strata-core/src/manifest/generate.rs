use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Result, StrataError};

use super::schema::{ServiceManifest, Template, TemplateList};
use super::{SERVICE_MANIFEST, TEMPLATE_LIST_TEMPLATE};

pub(crate) const TEMPLATE_SUFFIX: &str = ".tpl";

/// Write a starter `service.yaml` named after the directory.
pub fn generate_service_manifest(dir: &Path) -> Result<PathBuf> {
    let path = dir.join(SERVICE_MANIFEST);
    if path.exists() {
        return Err(StrataError::Io {
            context: format!("refusing to overwrite {}", path.display()),
            source: std::io::Error::from(std::io::ErrorKind::AlreadyExists),
        });
    }

    let name = dir
        .canonicalize()
        .ok()
        .and_then(|d| d.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "service".to_string());

    let manifest = ServiceManifest {
        name,
        ..Default::default()
    };
    let yaml = serde_yaml::to_string(&manifest).map_err(|e| StrataError::Serialize {
        what: SERVICE_MANIFEST.into(),
        source: e,
    })?;

    std::fs::write(&path, yaml).map_err(|e| StrataError::WriteFailed {
        path: path.clone(),
        source: e,
    })?;
    Ok(path)
}

/// Rebuild `files.yaml.tpl` in a template directory from the `*.tpl` files it holds.
///
/// Entries already present in an existing `files.yaml.tpl` are kept as they are;
/// new templates are added with their write path set to the source path minus
/// the `.tpl` suffix.
pub fn generate_template_list(template_dir: &Path) -> Result<PathBuf> {
    if !template_dir.is_dir() {
        return Err(StrataError::NotFound {
            path: template_dir.to_path_buf(),
        });
    }

    let list_path = template_dir.join(TEMPLATE_LIST_TEMPLATE);
    let mut list = if list_path.exists() {
        let bytes = std::fs::read(&list_path).map_err(|e| StrataError::Io {
            context: format!("reading {}", list_path.display()),
            source: e,
        })?;
        super::parse_template_list(&bytes, &list_path)?
    } else {
        TemplateList::default()
    };

    for entry in WalkDir::new(template_dir)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(template_dir) else {
            continue;
        };
        let source = rel.to_string_lossy().replace('\\', "/");
        if source == TEMPLATE_LIST_TEMPLATE {
            continue;
        }
        let Some(write_path) = source.strip_suffix(TEMPLATE_SUFFIX) else {
            continue;
        };

        list.templates
            .entry(write_path.to_string())
            .or_insert_with(|| Template {
                source: source.clone(),
                is_static: false,
            });
    }

    let yaml = serde_yaml::to_string(&list).map_err(|e| StrataError::Serialize {
        what: TEMPLATE_LIST_TEMPLATE.into(),
        source: e,
    })?;
    std::fs::write(&list_path, yaml).map_err(|e| StrataError::WriteFailed {
        path: list_path.clone(),
        source: e,
    })?;

    tracing::info!(path = %list_path.display(), templates = list.templates.len(), "generated template list");
    Ok(list_path)
}
