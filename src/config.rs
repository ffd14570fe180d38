use crate::constants::default_extensions;
use crate::options::CssSourcemapOptions;
use crate::{CssSourcemapError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::warn;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = ".css-sourcemap.toml";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub sourcemap: SourcemapConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourcemapConfig {
    /// Module suffixes whose maps are merged
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    /// Set to false to register the plugin without any effect
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Map subdirectory relative to each stylesheet
    #[serde(default)]
    pub folder: String,
    /// Prepended to the map file name in `sourceMappingURL` comments
    #[serde(default)]
    pub url_prefix: String,
}

fn default_enabled() -> bool {
    true
}

impl Default for SourcemapConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            enabled: default_enabled(),
            folder: String::new(),
            url_prefix: String::new(),
        }
    }
}

impl Config {
    /// Load configuration from a file in the project root
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(DEFAULT_CONFIG_FILE))
    }

    /// Load configuration from `config_path`, defaulting when it does not exist
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| {
            CssSourcemapError::FileError(format!(
                "Failed to read config file {:?}: {}",
                config_path, e
            ))
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| {
            CssSourcemapError::ConfigError(format!(
                "Failed to parse TOML config from {:?}: {}",
                config_path, e
            ))
        })?;

        Ok(config)
    }

    /// Load default config if file is missing, otherwise return error on parse failure
    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(config) => config,
            Err(e) => {
                warn!("Warning: Failed to load config: {}. Using defaults.", e);
                Config::default()
            }
        }
    }

    /// Plugin options described by this configuration
    pub fn into_options(self) -> CssSourcemapOptions {
        let SourcemapConfig {
            extensions,
            enabled,
            folder,
            url_prefix,
        } = self.sourcemap;

        let options = CssSourcemapOptions::new()
            .extensions(extensions)
            .enabled(enabled)
            .folder(folder);

        if url_prefix.is_empty() {
            options
        } else {
            options.get_url(move |file_name| format!("{}{}", url_prefix, file_name))
        }
    }
}
