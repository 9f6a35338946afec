//! Call-completion and lifecycle logging.
//!
//! [`CallLogging`] registers one interceptor in a `logging` phase inserted
//! immediately before the well-known `infrastructure` phase. The interceptor
//! proceeds first — letting the rest of the chain, including the actual
//! handler, run — and then logs one line for the finished call:
//!
//! ```text
//! OK: POST - /submit
//! Found: GET - /items -> /items/1        (redirects append the Location)
//! Unhandled: GET - /missing              (no status was set)
//! ```
//!
//! The feature also subscribes to all four lifecycle slots, emitting
//! `Application starting: <app>` (and so on) lines that name the application
//! instance, and unsubscribes itself from every slot when `stopped` fires.
//!
//! The verbosity level is fixed at install time. If the requested level is
//! not enabled on the underlying logger, installation fails with
//! [`InstallError::UnsupportedLevel`] and registers nothing.

use std::sync::Arc;

use parking_lot::Mutex;

use trellis_core::{
    Application, AttributeKey, Call, Feature, InstallError, InstallResult, LifecycleStage,
    Subscription, phases,
};

use crate::logger::{CallLogger, LogLevel, TracingLogger};

/// Name of the phase this feature inserts before `infrastructure`.
pub const LOGGING_PHASE: &str = "logging";

/// Configuration for [`CallLogging`].
pub struct CallLoggingConfig {
    /// Minimum severity at which call-completion and lifecycle messages are
    /// emitted. Validated against the logger at install time.
    pub level: LogLevel,
    /// Logger to emit through; defaults to [`TracingLogger`].
    pub logger: Option<Arc<dyn CallLogger>>,
}

impl Default for CallLoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Trace,
            logger: None,
        }
    }
}

struct Inner {
    logger: Arc<dyn CallLogger>,
    level: LogLevel,
}

impl Inner {
    fn emit(&self, message: &str) {
        self.logger.log(self.level, message);
    }

    fn log_completion(&self, call: &dyn Call) {
        self.emit(&completion_line(call));
    }
}

/// The installed call-logging feature.
pub struct CallLogging {
    inner: Arc<Inner>,
}

impl CallLogging {
    /// The level this instance emits at.
    pub fn level(&self) -> LogLevel {
        self.inner.level
    }
}

impl std::fmt::Debug for CallLogging {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallLogging")
            .field("level", &self.inner.level)
            .finish_non_exhaustive()
    }
}

impl Feature for CallLogging {
    type Config = CallLoggingConfig;

    fn key() -> &'static AttributeKey<CallLogging> {
        static KEY: AttributeKey<CallLogging> = AttributeKey::new("call-logging");
        &KEY
    }

    fn install(application: &Application, config: Self::Config) -> InstallResult<Self> {
        let logger = config
            .logger
            .unwrap_or_else(|| Arc::new(TracingLogger::new()));
        if !logger.enabled(config.level) {
            return Err(InstallError::UnsupportedLevel(config.level.as_str()));
        }
        let inner = Arc::new(Inner {
            logger,
            level: config.level,
        });

        application
            .pipeline()
            .insert_phase_before(phases::INFRASTRUCTURE, LOGGING_PHASE)?;
        {
            let inner = Arc::clone(&inner);
            application.pipeline().intercept(
                LOGGING_PHASE,
                Arc::new(move |call, next| {
                    let inner = Arc::clone(&inner);
                    Box::pin(async move {
                        let result = next.proceed(Arc::clone(&call)).await;
                        if result.is_ok() {
                            inner.log_completion(call.as_ref());
                        }
                        result
                    })
                }),
            )?;
        }

        // Handle vector shared into the `stopped` handler so the feature can
        // remove every subscription, its own included, during that firing.
        let subscriptions: Arc<Mutex<Vec<Subscription>>> = Arc::new(Mutex::new(Vec::new()));
        let events = application.events();
        let mut handles = Vec::with_capacity(4);
        for stage in [
            LifecycleStage::Starting,
            LifecycleStage::Started,
            LifecycleStage::Stopping,
        ] {
            let inner = Arc::clone(&inner);
            handles.push(events.subscribe(stage, move |application| {
                inner.emit(&format!("Application {stage}: {application}"));
            }));
        }
        {
            let inner = Arc::clone(&inner);
            let subscriptions = Arc::clone(&subscriptions);
            handles.push(events.subscribe(LifecycleStage::Stopped, move |application| {
                inner.emit(&format!("Application stopped: {application}"));
                for subscription in subscriptions.lock().drain(..) {
                    application.events().unsubscribe(subscription);
                }
            }));
        }
        *subscriptions.lock() = handles;

        Ok(CallLogging { inner })
    }
}

/// Formats the completion line for a finished call.
fn completion_line(call: &dyn Call) -> String {
    match call.status() {
        Some(status) if status.is_redirection() => {
            let location = call.header("Location").unwrap_or_default();
            format!(
                "{status}: {} - {} -> {location}",
                call.method(),
                call.path()
            )
        }
        Some(status) => format!("{status}: {} - {}", call.method(), call.path()),
        None => format!("Unhandled: {} - {}", call.method(), call.path()),
    }
}
