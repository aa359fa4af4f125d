#![allow(unused_assignments)]

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum StrataError {
    #[error("No such file or directory in any layer: {path}")]
    NotFound { path: PathBuf },

    #[error("Operation '{operation}' is not supported on {path}")]
    #[diagnostic(help("The layered template tree is read-only; output is written to the target directory"))]
    UnsupportedOperation {
        operation: &'static str,
        path: PathBuf,
    },

    #[error("Service manifest not found at {path}")]
    #[diagnostic(help("A service.yaml can be generated with `strata generate`"))]
    ServiceManifestNotFound { path: PathBuf },

    #[error("Failed to parse {path}")]
    #[diagnostic(help("Check the YAML syntax and field names"))]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to parse user config {path}")]
    #[diagnostic(help("Check the TOML syntax in your strata config.toml"))]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize {what}")]
    Serialize {
        what: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Missing template repositories")]
    #[diagnostic(help("List at least one entry under 'repositories' in service.yaml"))]
    NoRepositories,

    #[error("Missing required argument '{name}'")]
    #[diagnostic(help("Add '{name}' under 'arguments' in service.yaml"))]
    MissingRequiredArgument { name: String },

    #[error("Invalid value for argument '{name}', expected one of {expected:?}, got '{got}'")]
    InvalidArgumentValue {
        name: String,
        expected: Vec<String>,
        got: String,
    },

    #[error("Malformed block markers at {path}:{line}: {reason}")]
    #[diagnostic(help(
        "Blocks cannot be nested and every EndBlock must close the open StartBlock of the same name"
    ))]
    MalformedBlockMarkers {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Failed to render template {path}")]
    #[diagnostic(help("Check your Tera template syntax"))]
    TemplateRender {
        path: PathBuf,
        #[source]
        source: tera::Error,
    },

    #[error("Failed to write {path}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid repository abbreviation: {input}")]
    #[diagnostic(help(
        "Supported abbreviations: gh:user/repo, gl:user/repo, bb:user/repo, sr:~user/repo"
    ))]
    InvalidAbbreviation { input: String },

    #[error("Unsafe URL scheme in '{url}': {reason}")]
    #[diagnostic(help("Use https:// or ssh URLs for template repositories"))]
    UnsafeUrl { url: String, reason: String },

    #[error("Failed to download repository '{url}'")]
    #[diagnostic(help("Check the URL and your network connection"))]
    FetchFailed { url: String, reason: String },

    #[error("Git checkout failed for ref '{git_ref}' of '{url}'")]
    #[diagnostic(help("Ensure the tag or branch exists in the repository"))]
    GitCheckout {
        url: String,
        git_ref: String,
        reason: String,
    },

    #[error("Failed to load template repository '{url}'")]
    Repository {
        url: String,
        #[source]
        source: Box<StrataError>,
    },

    #[error("Failed to initialize git repository in {path}")]
    GitInit { path: PathBuf, reason: String },
}

impl StrataError {
    /// Returns `true` when the error means "no such path".
    pub fn is_not_found(&self) -> bool {
        match self {
            StrataError::NotFound { .. } => true,
            StrataError::Io { source, .. } => source.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, StrataError>;
