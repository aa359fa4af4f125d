use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, StrataError};

/// Environment variable naming an alternative config file.
pub const CONFIG_ENV: &str = "STRATA_CONFIG";

/// User-level configuration loaded from `~/.config/strata/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserConfig {
    /// Output extension (without the dot) to a formatter command line. The
    /// file content is written to the command's stdin and the formatted
    /// content read from its stdout.
    #[serde(default = "default_formatters")]
    pub formatters: BTreeMap<String, Vec<String>>,

    /// Repository URL to a local checkout used in its place.
    #[serde(default)]
    pub overrides: BTreeMap<String, PathBuf>,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            formatters: default_formatters(),
            overrides: BTreeMap::new(),
        }
    }
}

fn default_formatters() -> BTreeMap<String, Vec<String>> {
    BTreeMap::from([("go".to_string(), vec!["goimports".to_string()])])
}

/// Get the path to the user config file.
pub fn config_path() -> Option<PathBuf> {
    // Explicit override wins over the XDG location
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|d| d.join("strata").join("config.toml"))
}

/// Load user configuration from `$STRATA_CONFIG` or the XDG config directory.
///
/// A missing file yields the defaults.
/// Returns `Err` if the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<UserConfig> {
    match config_path() {
        Some(path) => load_user_config_from(&path),
        None => Ok(UserConfig::default()),
    }
}

pub fn load_user_config_from(path: &Path) -> Result<UserConfig> {
    // No config file: use defaults
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(path).map_err(|e| StrataError::Io {
        context: format!("reading user config {}", path.display()),
        source: e,
    })?;

    // Parse, filling unset tables with defaults
    let config: UserConfig = toml::from_str(&content).map_err(|e| StrataError::ConfigParse {
        path: path.to_path_buf(),
        source: e,
    })?;

    tracing::debug!(path = %path.display(), formatters = config.formatters.len(), overrides = config.overrides.len(), "loaded user config");
    Ok(config)
}
