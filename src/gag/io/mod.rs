use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::LevelFilter;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::gag::catalog::{default_variants, Catalog, MediaVariant, DEFAULT_BASE_URL};
use crate::gag::sanitize::CacheKey;

pub mod directory;

/// Name of the configuration file.
pub const CONFIG_NAME: &str = "config.toml";

/// A desktop Chrome user agent; the CDN refuses requests that do not look like a browser.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

// Define error types for config loading
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(String),

    #[error("Invalid media catalog: {0}")]
    InvalidCatalog(String),

    #[error("Invalid log level: {0}")]
    InvalidLogLevel(String),
}

// Result type alias for config operations
pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Paths {
    /// The 9GAG HTML export to read.
    pub source_file: String,
    /// Folder that receives the `gags/` tree.
    pub destination: String,
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            source_file: String::new(),
            destination: "./downloads".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Selection {
    pub upvoted: bool,
    pub saved: bool,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            upvoted: true,
            saved: false,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Http {
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for Http {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 10,
        }
    }
}

impl Http {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Validation {
    /// Video bodies smaller than this without a video content type are treated as error pages.
    pub min_video_bytes: usize,
}

impl Default for Validation {
    fn default() -> Self {
        Self {
            min_video_bytes: 10 * 1024,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Cache {
    pub key: CacheKey,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Logging {
    pub log_level: String,
    pub log_to_file: bool,
    pub log_file: String,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_to_file: true,
            log_file: "9gag_downloader.log".to_string(),
        }
    }
}

impl Logging {
    /// Parses `log_level` into a filter for the file logger.
    pub fn level_filter(&self) -> ConfigResult<LevelFilter> {
        self.log_level
            .parse::<LevelFilter>()
            .map_err(|_| ConfigError::InvalidLogLevel(self.log_level.clone()))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct CatalogConfig {
    pub base_url: String,
    pub variants: Vec<MediaVariant>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            variants: default_variants(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct AppConfig {
    pub paths: Paths,
    pub selection: Selection,
    pub http: Http,
    pub validation: Validation,
    pub cache: Cache,
    pub logging: Logging,
    pub catalog: CatalogConfig,
}

impl AppConfig {
    /// Builds the validated media catalog from the `[catalog]` section.
    pub fn catalog(&self) -> ConfigResult<Catalog> {
        Catalog::new(self.catalog.base_url.clone(), self.catalog.variants.clone())
    }
}

/// Loads, creates and saves `config.toml`.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: AppConfig,
    config_path: PathBuf,
    /// Where an unreadable config was moved to during [ConfigManager::load].
    backup_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Loads the config at `config_path`, falling back to defaults when it is missing.
    pub fn load(config_path: impl AsRef<Path>) -> ConfigResult<Self> {
        let config_path = config_path.as_ref().to_path_buf();
        let (config, backup_path) = Self::load_app_config(&config_path)?;

        Ok(Self {
            config,
            config_path,
            backup_path,
        })
    }

    /// A manager holding the default config for `config_path`, without reading it.
    pub fn with_defaults(config_path: impl AsRef<Path>) -> Self {
        Self {
            config: AppConfig::default(),
            config_path: config_path.as_ref().to_path_buf(),
            backup_path: None,
        }
    }

    fn load_app_config(config_path: &Path) -> ConfigResult<(AppConfig, Option<PathBuf>)> {
        if !config_path.exists() {
            warn!("Config file not found: {}", config_path.display());
            return Ok((AppConfig::default(), None));
        }

        let content = fs::read_to_string(config_path)?;
        match toml::from_str(&content) {
            Ok(config) => Ok((config, None)),
            Err(e) => {
                error!("Failed to parse {}: {}", config_path.display(), e);
                info!("Backing up old config and creating new one with default values");

                let backup = config_path.with_extension("toml.backup");
                let backup_path = match fs::rename(config_path, &backup) {
                    Ok(()) => Some(backup),
                    Err(backup_err) => {
                        warn!("Failed to backup old config: {}", backup_err);
                        None
                    }
                };

                let default_config = AppConfig::default();
                match toml::to_string_pretty(&default_config) {
                    Ok(toml_string) => {
                        if let Err(write_err) = fs::write(config_path, toml_string) {
                            error!("Failed to write new config file: {}", write_err);
                        } else {
                            info!("Created new {} with default values", config_path.display());
                        }
                    }
                    Err(ser_err) => error!("Failed to serialize default config: {}", ser_err),
                }

                Ok((default_config, backup_path))
            }
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Set when the config on disk could not be parsed and was moved aside.
    pub fn backup_path(&self) -> Option<&Path> {
        self.backup_path.as_deref()
    }

    /// Checks config and ensure it isn't missing.
    pub fn config_exists(&self) -> bool {
        if !self.config_path.exists() {
            trace!("{}: does not exist!", self.config_path.display());
            return false;
        }

        true
    }

    /// Writes the default config if no file exists yet.
    pub fn create_default_config(&mut self) -> ConfigResult<()> {
        if !self.config_exists() {
            self.save(AppConfig::default())?;
        }
        Ok(())
    }

    /// Saves `config` to disk and makes it the current config.
    pub fn save(&mut self, config: AppConfig) -> ConfigResult<()> {
        if let Some(parent) = self.config_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let toml_string =
            toml::to_string_pretty(&config).map_err(|e| ConfigError::TomlSer(e.to_string()))?;
        fs::write(&self.config_path, toml_string)?;
        self.config = config;

        Ok(())
    }
}
