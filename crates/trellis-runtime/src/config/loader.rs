//! Configuration loader using figment.
//!
//! Layered configuration with TOML files, environment variables, and
//! programmatic overrides.
//!
//! # Configuration Priority (lowest to highest)
//!
//! 1. Built-in defaults
//! 2. Profile-specific config file (`trellis.{profile}.toml`)
//! 3. Main config file (`trellis.toml`)
//! 4. Environment variables (`TRELLIS_*`)
//! 5. Programmatic overrides
//!
//! # Environment Variable Mapping
//!
//! Environment variables use the `TRELLIS_` prefix with `__` as separator:
//!
//! - `TRELLIS_LOGGING__LEVEL=debug` → `logging.level = "debug"`
//! - `TRELLIS_APPLICATION__NAME=shop` → `application.name = "shop"`
//!
//! # Example
//!
//! ```rust,ignore
//! use trellis_runtime::config::ConfigLoader;
//!
//! // Search the current directory for trellis.toml.
//! let config = ConfigLoader::new().with_current_dir().load()?;
//!
//! // Load a specific file with env overrides.
//! let config = ConfigLoader::new()
//!     .file("./config/trellis.toml")
//!     .load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use tracing::debug;

use super::error::{ConfigError, ConfigResult};
use super::schema::TrellisConfig;

/// Configuration profile for environment-specific settings.
#[derive(Debug, Clone, Default)]
pub enum Profile {
    /// Development profile (default).
    #[default]
    Development,
    /// Production profile.
    Production,
    /// Custom profile name.
    Custom(String),
}

impl Profile {
    /// Returns the profile name as a string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Custom(name) => name,
        }
    }

    /// Creates a profile from `TRELLIS_PROFILE` or defaults to Development.
    pub fn from_env() -> Self {
        std::env::var("TRELLIS_PROFILE")
            .map(|p| match p.to_lowercase().as_str() {
                "production" | "prod" => Self::Production,
                "development" | "dev" => Self::Development,
                other => Self::Custom(other.to_string()),
            })
            .unwrap_or_default()
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration loader with figment-based multi-source support.
pub struct ConfigLoader {
    profile: Profile,
    search_paths: Vec<PathBuf>,
    load_env: bool,
    config_file: Option<PathBuf>,
    overrides: Option<TrellisConfig>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a new configuration loader with defaults.
    pub fn new() -> Self {
        Self {
            profile: Profile::from_env(),
            search_paths: Vec::new(),
            load_env: true,
            config_file: None,
            overrides: None,
        }
    }

    /// Adds the current directory to the search paths.
    pub fn with_current_dir(mut self) -> Self {
        self.search_paths.push(PathBuf::from("."));
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Sets a specific configuration file to load, bypassing the search.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the configuration profile (e.g., "development", "production").
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        let name = profile.into();
        self.profile = match name.as_str() {
            "production" => Profile::Production,
            "development" => Profile::Development,
            _ => Profile::Custom(name),
        };
        self
    }

    /// Enables loading environment variables (enabled by default).
    pub fn with_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Merges additional configuration programmatically, at the highest
    /// priority.
    pub fn merge(mut self, config: TrellisConfig) -> Self {
        self.overrides = Some(config);
        self
    }

    /// Loads the configuration from all configured sources.
    pub fn load(self) -> ConfigResult<TrellisConfig> {
        let mut figment = Figment::from(Serialized::defaults(TrellisConfig::default()));

        if let Some(file) = &self.config_file {
            if !file.exists() {
                return Err(ConfigError::FileNotFound(file.clone()));
            }
            debug!(file = %file.display(), "Loading configuration file");
            figment = figment.merge(Toml::file(file));
        } else {
            for dir in self.search_dirs() {
                let profile_file = dir.join(format!("trellis.{}.toml", self.profile));
                let main_file = dir.join("trellis.toml");
                if !profile_file.exists() && !main_file.exists() {
                    continue;
                }
                if profile_file.exists() {
                    debug!(file = %profile_file.display(), "Loading profile configuration file");
                    figment = figment.merge(Toml::file(profile_file));
                }
                if main_file.exists() {
                    debug!(file = %main_file.display(), "Loading configuration file");
                    figment = figment.merge(Toml::file(main_file));
                }
                break;
            }
        }

        if self.load_env {
            figment = figment.merge(Env::prefixed("TRELLIS_").split("__"));
        }

        if let Some(overrides) = self.overrides {
            figment = figment.merge(Serialized::defaults(overrides));
        }

        Ok(figment.extract()?)
    }

    /// Directories searched for `trellis.toml`, in priority order.
    fn search_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = self.search_paths.clone();
        if let Some(config_dir) = dirs::config_dir() {
            dirs.push(config_dir.join("trellis"));
        }
        dirs
    }
}

/// Loads configuration from default locations (current directory, then the
/// user config directory).
pub fn load_config() -> ConfigResult<TrellisConfig> {
    ConfigLoader::new().with_current_dir().load()
}

/// Loads configuration from a specific file.
pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<TrellisConfig> {
    ConfigLoader::new().file(path).load()
}
