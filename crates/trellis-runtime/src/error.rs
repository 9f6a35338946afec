//! Runtime error types.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur during host operations.
#[derive(Error, Debug)]
pub enum HostError {
    /// Configuration loading failed.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Feature installation failed.
    #[error("Feature installation failed: {0}")]
    Install(#[from] trellis_core::InstallError),

    /// A feature was installed after the application left the `Created`
    /// state; installation must complete before traffic begins.
    #[error("Features must be installed before the host starts")]
    AlreadyStarted,
}

/// Result type for host operations.
pub type HostResult<T> = Result<T, HostError>;
