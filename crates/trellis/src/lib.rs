//! # Trellis
//!
//! A phased request-interception pipeline with pluggable features and
//! lifecycle events.
//!
//! ## Overview
//!
//! Trellis lets independently-authored *features* attach behavior at
//! well-defined points in the handling of a call, and react to coarse
//! application lifecycle transitions, without the core dispatch engine
//! knowing about any specific feature.
//!
//! ```text
//! ┌────────┐   ┌───────────────────── Pipeline ─────────────────────┐
//! │  Host  │──▶│ [setup] → [timing] → [logging] → [infrastructure]  │
//! │        │   │        → [call] → [fallback]                       │
//! └────────┘   └────────────────────────────────────────────────────┘
//!      │             ▲ phases inserted by installed features
//!      │
//!      └──▶ lifecycle: starting → started → stopping → stopped
//! ```
//!
//! - **Core**: phase graph, continuation-passing execution engine, keyed
//!   attribute store, lifecycle event bus (`trellis-core`).
//! - **Features**: call logging and call timing, installed under unique keys
//!   (`trellis-features`).
//! - **Runtime**: configuration, logging setup, and the host loop
//!   (`trellis-runtime`).
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use trellis::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let host = Host::new();
//!     host.install::<CallLogging>(|config| config.level = LogLevel::Info)?;
//!     host.run().await?;
//!     Ok(())
//! }
//! ```

pub use trellis_core as core;
pub use trellis_features as features;
pub use trellis_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use trellis::prelude::*;
/// ```
pub mod prelude {
    // Runtime — main entry point
    pub use trellis_runtime::{Host, HostBuilder, HostError, TrellisConfig};

    // Core — application, pipeline, and the feature contract
    pub use trellis_core::{
        Application, AttributeKey, BoxedCall, Call, CallState, Feature, InstallError,
        LifecycleStage, Next, Pipeline, StatusCode, phases,
    };

    // Features — shipped pipeline consumers
    pub use trellis_features::{CallLogger, CallLogging, CallTiming, LogLevel, TracingLogger};
}
