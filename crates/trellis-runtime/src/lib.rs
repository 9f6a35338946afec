//! # Trellis Runtime
//!
//! Runtime orchestration for the trellis framework: layered configuration
//! loading, `tracing` subscriber setup, and the [`Host`] that owns an
//! application and drives its lifecycle from startup to shutdown.
//!
//! ```rust,ignore
//! use trellis_runtime::Host;
//! use trellis_features::{CallLogging, LogLevel};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let host = Host::new(); // loads trellis.toml, initializes logging
//!     host.install::<CallLogging>(|config| config.level = LogLevel::Info)?;
//!     host.run().await?;     // start → wait for Ctrl+C → stop
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod host;
pub mod logging;

pub use config::{ConfigError, ConfigLoader, ConfigResult, TrellisConfig, load_config};
pub use error::{HostError, HostResult};
pub use host::{Host, HostBuilder};
pub use logging::{LoggingBuilder, init_from_config};
