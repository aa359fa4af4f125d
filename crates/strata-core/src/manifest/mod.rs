pub mod generate;
pub mod schema;
pub mod validate;

use std::path::{Path, PathBuf};

use crate::error::{Result, StrataError};
use crate::vfs::FileTree;

pub use generate::{generate_service_manifest, generate_template_list};
pub use schema::{
    Argument, ServiceManifest, Template, TemplateList, TemplateRepository,
    TemplateRepositoryManifest,
};
pub use validate::validate_arguments;

pub const SERVICE_MANIFEST: &str = "service.yaml";
pub const REPOSITORY_MANIFEST: &str = "manifest.yaml";
pub const TEMPLATE_LIST: &str = "files.yaml";
pub const TEMPLATE_LIST_TEMPLATE: &str = "files.yaml.tpl";

/// Load the service manifest from a directory (or a direct path to `service.yaml`).
pub fn load_service_manifest(path: &Path) -> Result<ServiceManifest> {
    let manifest_path = if path.ends_with(SERVICE_MANIFEST) {
        path.to_path_buf()
    } else {
        path.join(SERVICE_MANIFEST)
    };

    if !manifest_path.exists() {
        return Err(StrataError::ServiceManifestNotFound {
            path: manifest_path,
        });
    }

    let content = std::fs::read_to_string(&manifest_path).map_err(|e| StrataError::Io {
        context: format!("reading {}", manifest_path.display()),
        source: e,
    })?;

    serde_yaml::from_str(&content).map_err(|e| StrataError::ManifestParse {
        path: manifest_path,
        source: e,
    })
}

/// Read `manifest.yaml` from the root of a fetched repository tree.
pub fn load_repository_manifest(tree: &dyn FileTree) -> Result<TemplateRepositoryManifest> {
    let path = PathBuf::from(REPOSITORY_MANIFEST);
    let bytes = tree.read(&path)?;
    serde_yaml::from_slice(&bytes).map_err(|e| StrataError::ManifestParse { path, source: e })
}

/// Parse a worklist document; `path` is only used for error reporting.
pub fn parse_template_list(bytes: &[u8], path: &Path) -> Result<TemplateList> {
    serde_yaml::from_slice(bytes).map_err(|e| StrataError::ManifestParse {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::MemoryTree;

    #[test]
    fn load_service_manifest_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(SERVICE_MANIFEST),
            "name: api\nrepositories:\n  - gitUrl: gh:acme/base\n",
        )
        .unwrap();

        let manifest = load_service_manifest(dir.path()).unwrap();
        assert_eq!(manifest.name, "api");
        assert_eq!(manifest.repositories[0].git_url, "gh:acme/base");

        let direct = load_service_manifest(&dir.path().join(SERVICE_MANIFEST)).unwrap();
        assert_eq!(direct, manifest);
    }

    #[test]
    fn missing_service_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_service_manifest(dir.path()).unwrap_err();
        assert!(matches!(err, StrataError::ServiceManifestNotFound { .. }));
    }

    #[test]
    fn malformed_service_manifest() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SERVICE_MANIFEST), "name: [unclosed").unwrap();
        let err = load_service_manifest(dir.path()).unwrap_err();
        assert!(matches!(err, StrataError::ManifestParse { .. }));
    }

    #[test]
    fn repository_manifest_from_tree() {
        let tree = MemoryTree::new().with_file(
            REPOSITORY_MANIFEST,
            "name: base\narguments:\n  owner:\n    required: true\n",
        );
        let manifest = load_repository_manifest(&tree).unwrap();
        assert_eq!(manifest.name, "base");
        assert!(manifest.arguments["owner"].required);
    }

    #[test]
    fn repository_manifest_missing() {
        let tree = MemoryTree::new();
        assert!(load_repository_manifest(&tree).unwrap_err().is_not_found());
    }

    #[test]
    fn template_list_parse_error_names_path() {
        let err = parse_template_list(b"files: [", Path::new("files.yaml")).unwrap_err();
        match err {
            StrataError::ManifestParse { path, .. } => assert_eq!(path, PathBuf::from("files.yaml")),
            other => panic!("expected ManifestParse, got: {other:?}"),
        }
    }
}
