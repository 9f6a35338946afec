//! Wall-clock timing for each call.
//!
//! [`CallTiming`] inserts a `timing` phase immediately after the well-known
//! `setup` phase and measures the duration of everything downstream across
//! its `proceed`. Completed calls are logged at debug with structured
//! fields; calls slower than the configured threshold are logged at warn.
//! Errors are observed for timing purposes and re-returned unchanged.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use trellis_core::{Application, AttributeKey, Feature, InstallResult, phases};

/// Name of the phase this feature inserts after `setup`.
pub const TIMING_PHASE: &str = "timing";

/// Configuration for [`CallTiming`].
pub struct CallTimingConfig {
    /// Calls taking at least this long are logged at warn.
    pub slow_threshold: Duration,
}

impl Default for CallTimingConfig {
    fn default() -> Self {
        Self {
            slow_threshold: Duration::from_secs(1),
        }
    }
}

/// The installed call-timing feature.
pub struct CallTiming {
    slow_threshold: Duration,
}

impl CallTiming {
    /// The threshold above which calls are logged as slow.
    pub fn slow_threshold(&self) -> Duration {
        self.slow_threshold
    }
}

impl Feature for CallTiming {
    type Config = CallTimingConfig;

    fn key() -> &'static AttributeKey<CallTiming> {
        static KEY: AttributeKey<CallTiming> = AttributeKey::new("call-timing");
        &KEY
    }

    fn install(application: &Application, config: Self::Config) -> InstallResult<Self> {
        let slow_threshold = config.slow_threshold;

        application
            .pipeline()
            .insert_phase_after(phases::SETUP, TIMING_PHASE)?;
        application.pipeline().intercept(
            TIMING_PHASE,
            Arc::new(move |call, next| {
                Box::pin(async move {
                    let started = Instant::now();
                    let result = next.proceed(Arc::clone(&call)).await;
                    let elapsed = started.elapsed();
                    if elapsed >= slow_threshold {
                        warn!(
                            method = %call.method(),
                            path = %call.path(),
                            elapsed_ms = elapsed.as_millis() as u64,
                            "Slow call"
                        );
                    } else {
                        debug!(
                            method = %call.method(),
                            path = %call.path(),
                            elapsed_ms = elapsed.as_millis() as u64,
                            failed = result.is_err(),
                            "Call timed"
                        );
                    }
                    result
                })
            }),
        )?;

        Ok(CallTiming { slow_threshold })
    }
}
