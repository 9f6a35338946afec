//! # Trellis Features
//!
//! Pipeline consumers for the trellis framework, built on the installation
//! contract from `trellis-core`: each feature here is installed through
//! [`Application::install`], inserts its own phase relative to a well-known
//! anchor, and attaches interceptors and lifecycle handlers without the core
//! knowing it exists.
//!
//! - [`CallLogging`] — logs one line per finished call
//!   (`OK: POST - /submit`) plus application lifecycle transitions; the
//!   verbosity level is validated against the logger at install time.
//! - [`CallTiming`] — measures wall-clock duration across the rest of the
//!   chain and flags slow calls.
//!
//! The logger boundary is the [`CallLogger`] trait; production code uses the
//! `tracing`-backed [`TracingLogger`], tests substitute a recorder.
//!
//! [`Application::install`]: trellis_core::Application::install

pub mod call_logging;
pub mod call_timing;
pub mod logger;

pub use call_logging::{CallLogging, CallLoggingConfig, LOGGING_PHASE};
pub use call_timing::{CallTiming, CallTimingConfig, TIMING_PHASE};
pub use logger::{CallLogger, LogLevel, TracingLogger};
