use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Root document of a service's `service.yaml`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ServiceManifest {
    pub name: String,

    /// Template repositories in declaration order. Later repositories are
    /// layered above earlier ones.
    #[serde(default)]
    pub repositories: Vec<TemplateRepository>,

    /// Values supplied for the arguments declared by the template repositories.
    #[serde(default, deserialize_with = "scalar_map")]
    pub arguments: BTreeMap<String, String>,
}

/// A reference to a fetchable template repository.
///
/// Identity is the URL alone; `version` does not take part in deduplication.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct TemplateRepository {
    #[serde(rename = "gitUrl")]
    pub git_url: String,

    /// Tag or branch to check out. Defaults to the remote HEAD.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl TemplateRepository {
    pub fn new(git_url: impl Into<String>) -> Self {
        Self {
            git_url: git_url.into(),
            version: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

/// `manifest.yaml` at the root of a template repository.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct TemplateRepositoryManifest {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub dependencies: Vec<TemplateRepository>,

    #[serde(default)]
    pub arguments: BTreeMap<String, Argument>,

    /// Subdirectory holding the templates. The repository root when absent.
    #[serde(
        rename = "templateDir",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub template_dir: Option<String>,
}

/// Declaration of an argument a template repository understands.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct Argument {
    #[serde(default)]
    pub required: bool,

    /// Advisory only; values are always handled as strings.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub arg_type: Option<String>,

    /// Allowed values. Empty means unconstrained.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Worklist document (`files.yaml`, or the output of `files.yaml.tpl`).
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct TemplateList {
    /// Keyed by the path the template is written to, relative to the target directory.
    #[serde(rename = "files", default)]
    pub templates: BTreeMap<String, Template>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct Template {
    /// Location of the template inside the layered tree.
    #[serde(rename = "templatePath")]
    pub source: String,

    /// Write only when the output does not exist yet.
    #[serde(rename = "static", default)]
    pub is_static: bool,
}

/// Accept YAML scalars of any kind (`port: 8080`, `debug: true`) and keep them as strings.
fn scalar_map<'de, D>(deserializer: D) -> std::result::Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    use serde_yaml::Value;

    let raw: Option<BTreeMap<String, Value>> = Option::deserialize(deserializer)?;
    let mut out = BTreeMap::new();
    for (key, value) in raw.unwrap_or_default() {
        let text = match value {
            Value::String(s) => s,
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            Value::Null => String::new(),
            other => {
                return Err(D::Error::custom(format!(
                    "argument '{key}' must be a scalar, got {other:?}"
                )))
            }
        };
        out.insert(key, text);
    }
    Ok(out)
}
