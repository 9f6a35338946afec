//! Host orchestration: configuration, logging, application lifecycle.
//!
//! The [`Host`] owns an [`Application`] and drives its lifecycle from
//! configuration to shutdown. It is also where the install-then-traffic
//! discipline is enforced: [`Host::install`] refuses to attach features once
//! the application has left the `Created` state, so pipeline mutation can
//! never race live calls.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use trellis_runtime::Host;
//!
//! // Simplest way — auto-loads trellis.toml from the current directory.
//! let host = Host::new();
//! host.install::<CallLogging>(|config| config.level = LogLevel::Info)?;
//! host.run().await?;
//! ```
//!
//! # Custom Configuration
//!
//! ```rust,ignore
//! let host = Host::builder()
//!     .config_file("config/trellis.toml")
//!     .profile("production")
//!     .build()?;
//! ```

use std::sync::Arc;

use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use trellis_core::{Application, ApplicationState, BoxError, BoxedCall, Feature};

use crate::config::{ConfigLoader, ConfigResult, TrellisConfig, load_config};
use crate::error::{HostError, HostResult};
use crate::logging;

/// The runtime host for one trellis [`Application`].
pub struct Host {
    config: TrellisConfig,
    application: Arc<Application>,
    shutdown: CancellationToken,
}

impl Host {
    /// Creates a host with automatic configuration loading.
    ///
    /// Searches the current directory (then the user config directory) for
    /// `trellis.toml`; falls back to defaults when nothing is found.
    pub fn new() -> Self {
        let config = load_config().unwrap_or_else(|e| {
            eprintln!("Warning: Failed to load config ({e}), using defaults");
            TrellisConfig::default()
        });
        Self::from_config(&config)
    }

    /// Creates a host builder for custom configuration.
    pub fn builder() -> HostBuilder {
        HostBuilder::new()
    }

    /// Creates a host from configuration.
    ///
    /// Initializes logging from the config (`try_init`, so an existing
    /// subscriber is left alone) and builds the named application.
    pub fn from_config(config: &TrellisConfig) -> Self {
        logging::init_from_config(&config.logging);

        let application = Arc::new(Application::new(config.application.name.clone()));
        info!(
            application = %application,
            log_level = %config.logging.level,
            "Host initialized from configuration"
        );

        Self {
            config: config.clone(),
            application,
            shutdown: CancellationToken::new(),
        }
    }

    /// Returns a reference to the configuration.
    pub fn config(&self) -> &TrellisConfig {
        &self.config
    }

    /// Returns the hosted application.
    pub fn application(&self) -> &Arc<Application> {
        &self.application
    }

    /// Installs a feature into the hosted application.
    ///
    /// Fails with [`HostError::AlreadyStarted`] once the application has left
    /// the `Created` state: all installation must precede call traffic.
    pub fn install<F: Feature>(
        &self,
        configure: impl FnOnce(&mut F::Config),
    ) -> HostResult<Arc<F>> {
        if self.application.state() != ApplicationState::Created {
            return Err(HostError::AlreadyStarted);
        }
        Ok(self.application.install(configure)?)
    }

    /// Drives one call through the hosted application's pipeline.
    pub async fn handle(&self, call: BoxedCall) -> Result<(), BoxError> {
        self.application.execute(call).await
    }

    /// Returns a token that cancels [`run`](Self::run) when triggered.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Runs the host until a shutdown signal is received.
    ///
    /// Starts the application lifecycle, waits for Ctrl-C / SIGTERM / the
    /// [shutdown token](Self::shutdown_token), then stops the lifecycle.
    pub async fn run(&self) -> HostResult<()> {
        self.start();
        info!("Trellis host is now running. Press Ctrl+C to stop.");
        self.wait_for_shutdown().await;
        self.stop();
        Ok(())
    }

    /// Runs the host with a custom shutdown future.
    pub async fn run_until<F>(&self, shutdown: F) -> HostResult<()>
    where
        F: Future<Output = ()>,
    {
        self.start();
        shutdown.await;
        self.stop();
        Ok(())
    }

    fn start(&self) {
        if self.application.state() != ApplicationState::Created {
            warn!(application = %self.application, "Host is already running");
            return;
        }
        info!(
            application = %self.application,
            features = self.application.attributes().len(),
            interceptors = self.application.pipeline().interceptor_count(),
            "Starting trellis host"
        );
        self.application.start();
    }

    fn stop(&self) {
        if self.application.state() != ApplicationState::Started {
            warn!(application = %self.application, "Host is not running");
            return;
        }
        info!(application = %self.application, "Stopping trellis host");
        self.application.stop();
    }

    /// Waits for shutdown signals (Ctrl-C, SIGTERM, or the shutdown token).
    async fn wait_for_shutdown(&self) {
        #[cfg(unix)]
        {
            let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("Failed to register SIGTERM handler");

            tokio::select! {
                _ = signal::ctrl_c() => {
                    info!("Received Ctrl+C, shutting down");
                }
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down");
                }
                _ = self.shutdown.cancelled() => {
                    info!("Shutdown requested, shutting down");
                }
            }
        }

        #[cfg(not(unix))]
        {
            tokio::select! {
                _ = signal::ctrl_c() => {
                    info!("Received Ctrl+C, shutting down");
                }
                _ = self.shutdown.cancelled() => {
                    info!("Shutdown requested, shutting down");
                }
            }
        }
    }
}

impl Default for Host {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// HostBuilder
// =============================================================================

/// Builder for creating a [`Host`] with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// let host = Host::builder()
///     .config_file("config/production.toml")
///     .profile("production")
///     .build()?;
/// ```
pub struct HostBuilder {
    config_loader: ConfigLoader,
}

impl HostBuilder {
    /// Creates a new host builder searching the current directory.
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new().with_current_dir(),
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g., "development", "production").
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges additional configuration programmatically.
    pub fn merge(mut self, config: TrellisConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Builds the host.
    pub fn build(self) -> ConfigResult<Host> {
        let config = self.config_loader.load()?;
        Ok(Host::from_config(&config))
    }
}

impl Default for HostBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_core::{AttributeKey, InstallResult, LifecycleStage};

    #[derive(Debug)]
    struct Probe;

    impl Feature for Probe {
        type Config = ();

        fn key() -> &'static AttributeKey<Probe> {
            static KEY: AttributeKey<Probe> = AttributeKey::new("probe");
            &KEY
        }

        fn install(_application: &Application, _config: ()) -> InstallResult<Self> {
            Ok(Probe)
        }
    }

    fn quiet_host(name: &str) -> Host {
        let config = TrellisConfig {
            application: crate::config::ApplicationConfig {
                name: name.to_string(),
            },
            ..TrellisConfig::default()
        };
        Host::from_config(&config)
    }

    #[tokio::test]
    async fn run_until_drives_the_full_lifecycle() {
        let host = quiet_host("lifecycle");
        let stages = Arc::new(std::sync::Mutex::new(Vec::new()));

        for stage in LifecycleStage::ALL {
            let stages = Arc::clone(&stages);
            host.application().events().subscribe(stage, move |_| {
                stages.lock().unwrap().push(stage);
            });
        }

        host.run_until(async {}).await.unwrap();

        assert_eq!(
            host.application().state(),
            trellis_core::ApplicationState::Stopped
        );
        assert_eq!(stages.lock().unwrap().as_slice(), &LifecycleStage::ALL);
    }

    #[tokio::test]
    async fn install_after_start_is_rejected() {
        let host = quiet_host("late-install");
        host.run_until(async {}).await.unwrap();

        let err = host.install::<Probe>(|_| {}).unwrap_err();
        assert!(matches!(err, HostError::AlreadyStarted));
        assert!(host.application().feature::<Probe>().is_none());
    }

    #[tokio::test]
    async fn install_before_run_succeeds() {
        let host = quiet_host("early-install");
        host.install::<Probe>(|_| {}).unwrap();
        assert!(host.application().feature::<Probe>().is_some());
    }

    #[tokio::test]
    async fn shutdown_token_ends_run() {
        let host = quiet_host("token");
        let token = host.shutdown_token();
        tokio::spawn(async move {
            token.cancel();
        });

        host.run().await.unwrap();
        assert_eq!(
            host.application().state(),
            trellis_core::ApplicationState::Stopped
        );
    }
}
