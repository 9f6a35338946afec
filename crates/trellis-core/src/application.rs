//! The application object: pipeline, attribute store, and lifecycle bus.
//!
//! An [`Application`] is the host that features attach to. It owns the call
//! [`Pipeline`] (seeded with the well-known phases in [`phases`]), the
//! [`Attributes`] store holding one instance per installed feature, and the
//! [`LifecycleEvents`] bus whose transitions drive feature setup and
//! teardown.
//!
//! Its lifecycle is linear — `Created → Starting → Started → Stopping →
//! Stopped` — with no re-entry; a repeated `start` or `stop` warns and does
//! nothing.

use std::fmt;

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::attributes::{AttributeKey, Attributes};
use crate::call::BoxedCall;
use crate::error::{BoxError, InstallError, InstallResult};
use crate::events::{LifecycleEvents, LifecycleStage};
use crate::pipeline::Pipeline;

/// Well-known phase names present in every application pipeline.
///
/// Features anchor their own phases relative to these. Order:
/// `setup → infrastructure → call → fallback`.
pub mod phases {
    /// Before anything else: per-call preparation.
    pub const SETUP: &str = "setup";
    /// Cross-cutting machinery that wraps the actual handling.
    pub const INFRASTRUCTURE: &str = "infrastructure";
    /// The actual request handling.
    pub const CALL: &str = "call";
    /// Runs only when nothing upstream produced a response.
    pub const FALLBACK: &str = "fallback";
}

/// Lifecycle position of an [`Application`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationState {
    Created,
    Starting,
    Started,
    Stopping,
    Stopped,
}

/// A self-contained unit of pipeline behavior installed under a unique key.
///
/// Implementors provide a default-constructible configuration, a `'static`
/// key constant, and a build step that attaches the feature to the
/// application — inserting phases, registering interceptors, subscribing to
/// lifecycle events. Installation goes through [`Application::install`],
/// which is the only attachment path.
pub trait Feature: Send + Sync + Sized + 'static {
    /// Mutable configuration applied before the feature is built.
    type Config: Default;

    /// The feature's attribute key; one instance per key per application.
    fn key() -> &'static AttributeKey<Self>;

    /// Builds the feature and registers its pipeline and lifecycle hooks.
    ///
    /// A failing build must leave the application untouched: validate first,
    /// register afterwards.
    fn install(application: &Application, config: Self::Config) -> InstallResult<Self>;
}

/// The host object features attach to and calls flow through.
///
/// `Display` renders the application's identity, which is what lifecycle log
/// lines show.
pub struct Application {
    name: String,
    pipeline: Pipeline,
    attributes: Attributes,
    events: LifecycleEvents,
    state: Mutex<ApplicationState>,
}

impl Application {
    /// Creates an application with the well-known phases already registered.
    pub fn new(name: impl Into<String>) -> Self {
        let pipeline = Pipeline::new();
        for phase in [
            phases::SETUP,
            phases::INFRASTRUCTURE,
            phases::CALL,
            phases::FALLBACK,
        ] {
            // A fresh pipeline cannot already contain these.
            pipeline
                .register_phase(phase)
                .unwrap_or_else(|_| unreachable!("well-known phase registered twice"));
        }
        Self {
            name: name.into(),
            pipeline,
            attributes: Attributes::new(),
            events: LifecycleEvents::new(),
            state: Mutex::new(ApplicationState::Created),
        }
    }

    /// The application's human-readable identity.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The call pipeline.
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// The feature-instance store.
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// The lifecycle event bus.
    pub fn events(&self) -> &LifecycleEvents {
        &self.events
    }

    /// Current lifecycle position.
    pub fn state(&self) -> ApplicationState {
        *self.state.lock()
    }

    // ─── Feature installation ────────────────────────────────────────────────

    /// Installs a feature: default config, `configure` applied, feature
    /// built, instance stored under its key, instance returned.
    ///
    /// Duplicate keys are rejected before the build step runs, so a rejected
    /// install registers nothing. Installation must complete before call
    /// traffic reaches the affected phases; that ordering is the host's
    /// responsibility.
    pub fn install<F: Feature>(
        &self,
        configure: impl FnOnce(&mut F::Config),
    ) -> InstallResult<std::sync::Arc<F>> {
        let key = F::key();
        if self.attributes.contains(key) {
            return Err(InstallError::DuplicateFeature(key.name()));
        }

        let mut config = F::Config::default();
        configure(&mut config);

        let feature = std::sync::Arc::new(F::install(self, config)?);
        self.attributes.insert(key, std::sync::Arc::clone(&feature))?;
        info!(feature = key.name(), application = %self, "Feature installed");
        Ok(feature)
    }

    /// Looks up an installed feature by its key type.
    pub fn feature<F: Feature>(&self) -> Option<std::sync::Arc<F>> {
        self.attributes.get(F::key())
    }

    // ─── Lifecycle ───────────────────────────────────────────────────────────

    /// Drives `Created → Starting → Started`, firing both transitions'
    /// subscribers in order.
    pub fn start(&self) {
        {
            let mut state = self.state.lock();
            if *state != ApplicationState::Created {
                warn!(application = %self, state = ?*state, "Application cannot start from this state");
                return;
            }
            *state = ApplicationState::Starting;
        }
        self.events.fire(LifecycleStage::Starting, self);

        *self.state.lock() = ApplicationState::Started;
        self.events.fire(LifecycleStage::Started, self);
        info!(application = %self, "Application started");
    }

    /// Drives `Started → Stopping → Stopped`, firing both transitions'
    /// subscribers in order.
    pub fn stop(&self) {
        {
            let mut state = self.state.lock();
            if *state != ApplicationState::Started {
                warn!(application = %self, state = ?*state, "Application cannot stop from this state");
                return;
            }
            *state = ApplicationState::Stopping;
        }
        self.events.fire(LifecycleStage::Stopping, self);

        *self.state.lock() = ApplicationState::Stopped;
        self.events.fire(LifecycleStage::Stopped, self);
        info!(application = %self, "Application stopped");
    }

    /// Drives one call through the pipeline.
    pub async fn execute(&self, call: BoxedCall) -> Result<(), BoxError> {
        self.pipeline.execute(call).await
    }
}

impl fmt::Display for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Application")
            .field("name", &self.name)
            .field("state", &self.state())
            .field("features", &self.attributes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[derive(Debug)]
    struct Marker {
        configured: usize,
    }

    #[derive(Default)]
    struct MarkerConfig {
        value: usize,
        fail: bool,
        builds: Option<Arc<AtomicUsize>>,
    }

    impl Feature for Marker {
        type Config = MarkerConfig;

        fn key() -> &'static AttributeKey<Marker> {
            static KEY: AttributeKey<Marker> = AttributeKey::new("marker");
            &KEY
        }

        fn install(application: &Application, config: MarkerConfig) -> InstallResult<Self> {
            if config.fail {
                return Err(InstallError::UnsupportedLevel("TEST"));
            }
            application
                .pipeline()
                .insert_phase_before(phases::INFRASTRUCTURE, "marker")?;
            if let Some(builds) = &config.builds {
                builds.fetch_add(1, Ordering::SeqCst);
            }
            Ok(Marker {
                configured: config.value,
            })
        }
    }

    #[test]
    fn well_known_phases_are_seeded_in_order() {
        let application = Application::new("app");
        assert_eq!(
            application.pipeline().phase_names(),
            ["setup", "infrastructure", "call", "fallback"]
        );
    }

    #[test]
    fn install_applies_configure_and_stores_instance() {
        let application = Application::new("app");
        let feature = application
            .install::<Marker>(|config| config.value = 42)
            .unwrap();
        assert_eq!(feature.configured, 42);
        assert!(Arc::ptr_eq(
            &feature,
            &application.feature::<Marker>().unwrap()
        ));
        assert!(application.pipeline().has_phase("marker"));
    }

    #[test]
    fn duplicate_install_is_rejected_before_building() {
        let application = Application::new("app");
        let builds = Arc::new(AtomicUsize::new(0));
        {
            let builds = Arc::clone(&builds);
            application
                .install::<Marker>(move |config| config.builds = Some(builds))
                .unwrap();
        }

        let probe = Arc::clone(&builds);
        let err = application
            .install::<Marker>(move |config| config.builds = Some(probe))
            .unwrap_err();
        assert!(matches!(err, InstallError::DuplicateFeature("marker")));
        // The second build step never ran.
        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_install_stores_nothing() {
        let application = Application::new("app");
        let err = application
            .install::<Marker>(|config| config.fail = true)
            .unwrap_err();
        assert!(matches!(err, InstallError::UnsupportedLevel(_)));
        assert!(application.feature::<Marker>().is_none());
    }

    #[test]
    fn lifecycle_is_linear_and_fires_in_order() {
        let application = Application::new("app");
        let stages = Arc::new(parking_lot::Mutex::new(Vec::new()));
        for stage in LifecycleStage::ALL {
            let stages = Arc::clone(&stages);
            application.events().subscribe(stage, move |_| {
                stages.lock().push(stage);
            });
        }

        application.start();
        assert_eq!(application.state(), ApplicationState::Started);
        application.stop();
        assert_eq!(application.state(), ApplicationState::Stopped);
        assert_eq!(stages.lock().as_slice(), &LifecycleStage::ALL);

        // No re-entry: neither call fires anything further.
        application.start();
        application.stop();
        assert_eq!(stages.lock().len(), 4);
        assert_eq!(application.state(), ApplicationState::Stopped);
    }

    #[test]
    fn stop_before_start_is_a_no_op() {
        let application = Application::new("app");
        application.stop();
        assert_eq!(application.state(), ApplicationState::Created);
    }
}
