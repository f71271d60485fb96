use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Page shown at startup and whenever navigation has nowhere valid to go.
pub const DEFAULT_HOME_PAGE: &str = "Index";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

/// How raw HTML written inside page markup is treated when rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RawHtml {
    /// Show raw HTML as literal text.
    #[default]
    Escape,
    /// Keep safe elements (links, emphasis, ...) and strip the rest.
    Sanitize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    pub pages_path: PathBuf,
    #[serde(default = "default_home_page")]
    pub home_page: String,
    #[serde(default)]
    pub raw_html: RawHtml,
}

fn default_home_page() -> String {
    DEFAULT_HOME_PAGE.to_string()
}

impl Config {
    /// Config used when no config file exists: pages under the user data directory.
    pub fn with_pages_path(pages_path: PathBuf) -> Self {
        Self {
            pages_path,
            home_page: default_home_page(),
            raw_html: RawHtml::default(),
        }
    }

    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        // Expand shell variables and tilde in the loaded pages path
        config.pages_path = Self::expand_path(&config.pages_path).unwrap_or(config.pages_path);

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    /// Load the config file, falling back to the default pages directory when absent.
    pub fn load_or_default() -> Result<Self, ConfigError> {
        Ok(Self::load()?.unwrap_or_else(|| Self::with_pages_path(Self::default_pages_path())))
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/eliki");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    pub fn default_pages_path() -> PathBuf {
        let data_dir = shellexpand::tilde("~/.local/share/eliki");
        PathBuf::from(data_dir.as_ref()).join("pages")
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}
