//! Error types for the trellis core.

use thiserror::Error;

/// Type-erased error carried through the interceptor chain.
///
/// Interceptor failures travel up the chain as ordinary return values — every
/// upstream interceptor that already called `proceed` observes the error at
/// its own `proceed` call site and may recover, wrap, or re-return it.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised by phase-graph mutation and chain execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// A relative insertion or interception referenced a phase that does not
    /// exist in the graph.
    #[error("phase not found: '{0}'")]
    PhaseNotFound(String),

    /// A phase with this name is already registered in the graph.
    #[error("phase already registered: '{0}'")]
    DuplicatePhase(String),

    /// The call was already driven through a pipeline once.
    ///
    /// The engine guarantees at-most-one execution of the chain per call; a
    /// second `execute` with the same call is rejected rather than re-run.
    #[error("call has already been executed")]
    CallAlreadyExecuted,
}

/// Errors surfaced synchronously by [`Application::install`].
///
/// A failed installation registers nothing: no phases, no interceptors, no
/// lifecycle subscriptions. Callers in a startup sequence must not swallow
/// these — an application missing a requested feature should not start.
///
/// [`Application::install`]: crate::Application::install
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstallError {
    /// Phase-graph mutation performed by the feature failed.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// A feature is already installed under this key.
    ///
    /// Re-installation is rejected rather than silently replacing the
    /// existing instance; see DESIGN.md for the policy rationale.
    #[error("feature already installed: '{0}'")]
    DuplicateFeature(&'static str),

    /// The requested log level is not enabled on the underlying logger.
    ///
    /// Raised at install time, never deferred to the first call.
    #[error("the {0} log level is not enabled on the underlying logger")]
    UnsupportedLevel(&'static str),
}

/// Result type for installation operations.
pub type InstallResult<T> = Result<T, InstallError>;
