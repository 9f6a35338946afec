//! Call Logging Demo
//!
//! A small end-to-end run of the trellis pipeline: a host is built from
//! configuration, the call-timing and call-logging features install
//! themselves, a handler interceptor is registered in the `call` phase, and
//! a few simulated calls are driven through the chain before a clean
//! shutdown.
//!
//! Expected log lines (among the lifecycle ones):
//!
//! ```text
//! Application starting: demo-shop
//! Application started: demo-shop
//! Found: GET - /items -> /items/1
//! OK: POST - /submit
//! Unhandled: GET - /unknown
//! Application stopping: demo-shop
//! Application stopped: demo-shop
//! ```
//!
//! # Usage
//!
//! ```bash
//! cargo run --package call-logging-demo
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use tracing::error;

use trellis::prelude::*;
use trellis::runtime::config::{ApplicationConfig, LoggingConfig};

// ============================================================================
// Demo call type
// ============================================================================

/// An in-memory call standing in for a real transport's request context.
struct DemoCall {
    method: &'static str,
    path: &'static str,
    response: Mutex<(Option<StatusCode>, HashMap<String, String>)>,
    state: CallState,
}

impl DemoCall {
    fn new(method: &'static str, path: &'static str) -> Arc<Self> {
        Arc::new(Self {
            method,
            path,
            response: Mutex::new((None, HashMap::new())),
            state: CallState::new(),
        })
    }

    fn respond(&self, status: StatusCode) {
        self.response.lock().unwrap().0 = Some(status);
    }

    fn set_header(&self, name: &str, value: &str) {
        self.response
            .lock()
            .unwrap()
            .1
            .insert(name.to_string(), value.to_string());
    }
}

impl Call for DemoCall {
    fn method(&self) -> &str {
        self.method
    }

    fn path(&self) -> &str {
        self.path
    }

    fn status(&self) -> Option<StatusCode> {
        self.response.lock().unwrap().0
    }

    fn header(&self, name: &str) -> Option<String> {
        self.response.lock().unwrap().1.get(name).cloned()
    }

    fn state(&self) -> &CallState {
        &self.state
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

// ============================================================================
// Routes
// ============================================================================

/// Registers the demo's "routing" as a single `call`-phase interceptor.
///
/// Real routing is a transport concern; the pipeline only sees an
/// interceptor that fills in the response.
fn register_routes(application: &Application) -> Result<()> {
    application.pipeline().intercept(
        phases::CALL,
        Arc::new(|call, next| {
            Box::pin(async move {
                if let Some(demo) = call.as_any().downcast_ref::<DemoCall>() {
                    match demo.path() {
                        "/items" => {
                            demo.respond(StatusCode::FOUND);
                            demo.set_header("Location", "/items/1");
                        }
                        "/submit" => demo.respond(StatusCode::OK),
                        _ => {}
                    }
                }
                next.proceed(call).await
            })
        }),
    )?;
    Ok(())
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let host = Host::builder()
        .merge(TrellisConfig {
            application: ApplicationConfig {
                name: "demo-shop".to_string(),
            },
            logging: LoggingConfig {
                level: "debug".to_string(),
                ..LoggingConfig::default()
            },
        })
        .build()?;

    // A failed install must abort startup, hence the `?`s.
    host.install::<CallTiming>(|config| config.slow_threshold = Duration::from_millis(500))?;
    host.install::<CallLogging>(|config| config.level = LogLevel::Debug)?;
    register_routes(host.application())?;

    let traffic = async {
        for (method, path) in [("GET", "/items"), ("POST", "/submit"), ("GET", "/unknown")] {
            let call = DemoCall::new(method, path);
            if let Err(e) = host.handle(call).await {
                error!("Call failed: {e}");
            }
        }
    };

    host.run_until(traffic).await?;
    Ok(())
}
