//! # Trellis Core
//!
//! The core engine of the trellis framework: a phased request-interception
//! pipeline and an application lifecycle event bus that independently
//! authored *features* attach to, without the dispatch core knowing about
//! any specific feature.
//!
//! ## Architecture
//!
//! Everything hangs off an [`Application`]:
//!
//! ```text
//! ┌──────────────────────── Application ("my-app") ───────────────────────┐
//! │                                                                       │
//! │  Pipeline    [setup] → [infrastructure] → [call] → [fallback]         │
//! │              ▲ features insert phases + interceptors relative to      │
//! │              │ these well-known anchors                               │
//! │                                                                       │
//! │  Attributes  key → installed feature instance (at most one per key)   │
//! │                                                                       │
//! │  Lifecycle   starting / started / stopping / stopped subscriber lists │
//! └───────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **Pipeline** ([`pipeline`]): ordered named phases with relative
//!   insertion, per-phase interceptor lists, and a continuation-passing
//!   execution engine — each interceptor may run code before *and after* the
//!   rest of the chain via [`Next::proceed`], or short-circuit by never
//!   proceeding.
//! - **Attributes** ([`attributes`]): the keyed singleton store tying a
//!   feature's [`AttributeKey`] to its installed instance.
//! - **Lifecycle events** ([`events`]): four ordered subscriber lists fired
//!   on `start`/`stop`, with handle-based unsubscription that is safe during
//!   firing.
//! - **Feature contract** ([`Feature`], [`Application::install`]): default
//!   config → configure closure → build → store under key → return.
//!
//! ## Example
//!
//! ```rust,ignore
//! use trellis_core::{Application, phases};
//! use std::sync::Arc;
//!
//! let app = Application::new("my-app");
//!
//! // Attach behavior around the actual handling.
//! app.pipeline().intercept(phases::INFRASTRUCTURE, Arc::new(|call, next| {
//!     Box::pin(async move {
//!         // before downstream
//!         let result = next.proceed(Arc::clone(&call)).await;
//!         // after downstream — the response is now in place
//!         result
//!     })
//! }))?;
//!
//! app.start();
//! app.execute(call).await?;
//! app.stop();
//! ```
//!
//! ## Concurrency model
//!
//! Each call's chain execution is independent; the only shared state is the
//! read-only concatenated chain and the read-mostly attribute store.
//! `proceed` is the chain's sole suspension point. Pipeline mutation must
//! finish before concurrent traffic begins — the core does not lock the
//! graph against a mid-flight install; that discipline belongs to the host.

pub mod application;
pub mod attributes;
pub mod call;
pub mod error;
pub mod events;
pub mod pipeline;

pub use application::{Application, ApplicationState, Feature, phases};
pub use attributes::{AttributeKey, Attributes};
pub use call::{BoxedCall, Call, CallState, StatusCode};
pub use error::{BoxError, InstallError, InstallResult, PipelineError};
pub use events::{LifecycleEvents, LifecycleStage, Subscription};
pub use pipeline::{Interceptor, Next, Phase, PhaseGraph, Pipeline};
