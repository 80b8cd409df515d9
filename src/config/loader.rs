//! Configuration loading from a file or from literal text.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::schema::RelayConfig;
use crate::config::validation::validate_config;
use crate::error::ConfigError;

/// Where the configuration comes from. Exactly one origin is used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Text(String),
}

impl ConfigSource {
    /// Pick the origin from the command-line values.
    ///
    /// A non-empty file path wins and the text is ignored. Otherwise the text
    /// is used, and a missing text becomes the empty string: there is no
    /// default configuration, so that case fails at [`ConfigSource::load`].
    pub fn select(file: Option<&Path>, text: Option<&str>) -> Self {
        match file {
            Some(path) if !path.as_os_str().is_empty() => ConfigSource::File(path.to_path_buf()),
            _ => ConfigSource::Text(text.unwrap_or_default().to_string()),
        }
    }

    pub fn load(&self) -> Result<RelayConfig, ConfigError> {
        match self {
            ConfigSource::File(path) => load_from_file(path),
            ConfigSource::Text(text) => load_from_text(text),
        }
    }

    /// Short description for logs. Never includes the config text itself.
    pub fn describe(&self) -> String {
        match self {
            ConfigSource::File(path) => format!("file {}", path.display()),
            ConfigSource::Text(text) => format!("inline JSON ({} bytes)", text.len()),
        }
    }
}

/// Parse and validate a JSON configuration string.
pub fn load_from_text(text: &str) -> Result<RelayConfig, ConfigError> {
    let config: RelayConfig = serde_json::from_str(text)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Read, parse and validate a configuration file.
///
/// Files are JSON unless the extension is `.toml`.
pub fn load_from_file(path: &Path) -> Result<RelayConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    if is_toml(path) {
        let config: RelayConfig = toml::from_str(&content)?;
        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    } else {
        load_from_text(&content)
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("toml"))
        .unwrap_or(false)
}
