//! Configuration module for the trellis runtime.
//!
//! TOML-based, layered configuration loading for the application identity
//! and logging settings.

pub mod error;
pub mod loader;
pub mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{ApplicationConfig, LogFormat, LogOutput, LoggingConfig, TrellisConfig};
