//! Global configuration (~/.lip/config.json)

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

/// Default GitHub download host
pub const DEFAULT_GITHUB_MIRROR_URL: &str = "https://github.com";

/// Default Go module proxy
pub const DEFAULT_GO_MODULE_PROXY_URL: &str = "https://goproxy.io";

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read or write the config file
    #[error("Failed to access config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Config file is not valid JSON
    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] serde_json::Error),

    /// A configured URL does not parse
    #[error("Invalid URL for {key}: {value}")]
    InvalidUrl { key: &'static str, value: String },

    /// Home directory cannot be determined
    #[error("Could not determine home directory")]
    NoHomeDir,
}

/// User configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL that GitHub downloads are redirected to
    pub github_mirror_url: String,

    /// Module proxy used for version lists and archives
    pub go_module_proxy_url: String,

    /// HTTP proxy for all downloads; empty for none
    pub proxy_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            github_mirror_url: DEFAULT_GITHUB_MIRROR_URL.to_string(),
            go_module_proxy_url: DEFAULT_GO_MODULE_PROXY_URL.to_string(),
            proxy_url: String::new(),
        }
    }
}

impl Config {
    /// Load the config file, writing the defaults if it does not exist
    pub fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let config = Self::default();
            config.save(path)?;
            tracing::info!("Created default config at {}", path.display());
            return Ok(config);
        }

        let content = fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Write the config as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn github_mirror_url(&self) -> Result<Url, ConfigError> {
        parse_url("github_mirror_url", &self.github_mirror_url)
    }

    pub fn go_module_proxy_url(&self) -> Result<Url, ConfigError> {
        parse_url("go_module_proxy_url", &self.go_module_proxy_url)
    }

    /// The HTTP proxy, or `None` when unset
    pub fn proxy_url(&self) -> Result<Option<Url>, ConfigError> {
        if self.proxy_url.trim().is_empty() {
            return Ok(None);
        }
        parse_url("proxy_url", &self.proxy_url).map(Some)
    }
}

fn parse_url(key: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|_| ConfigError::InvalidUrl {
        key,
        value: value.to_string(),
    })
}

/// The global `.lip` directory (~/.lip)
pub fn global_dir() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|home| home.join(".lip"))
        .ok_or(ConfigError::NoHomeDir)
}

/// The download cache directory (~/.lip/cache)
pub fn cache_dir() -> Result<PathBuf, ConfigError> {
    Ok(global_dir()?.join("cache"))
}

/// The config file path (~/.lip/config.json)
pub fn config_path() -> Result<PathBuf, ConfigError> {
    Ok(global_dir()?.join("config.json"))
}
