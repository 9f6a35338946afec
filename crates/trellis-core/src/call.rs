//! Call abstraction for the trellis pipeline.
//!
//! The pipeline core never parses HTTP. It sees an in-flight request only
//! through the [`Call`] trait: request method, request path and, once
//! downstream processing has run, a response status and response headers.
//! Transports, test doubles, and demos provide the concrete type.
//!
//! Every call embeds a [`CallState`], which the execution engine uses to
//! enforce its at-most-once guarantee and to record a failed outcome.

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Per-call execution flags shared between the engine and the call owner.
///
/// Concrete call types embed one `CallState` and hand it out via
/// [`Call::state`]. The flags are written by the engine only.
#[derive(Debug, Default)]
pub struct CallState {
    /// Set when the call enters chain execution; never cleared.
    executed: AtomicBool,
    /// Set when the chain finished with an unhandled error.
    failed: AtomicBool,
}

impl CallState {
    /// Creates a fresh state for a new call.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the call as entering chain execution.
    ///
    /// Returns `false` if the chain already ran for this call.
    pub(crate) fn try_begin(&self) -> bool {
        !self.executed.swap(true, Ordering::SeqCst)
    }

    /// Returns `true` once the call has entered chain execution.
    pub fn is_executed(&self) -> bool {
        self.executed.load(Ordering::SeqCst)
    }

    pub(crate) fn mark_failed(&self) {
        self.failed.store(true, Ordering::SeqCst);
    }

    /// Returns `true` if the chain finished with an unhandled error.
    pub fn is_failed(&self) -> bool {
        self.failed.load(Ordering::SeqCst)
    }
}

/// An HTTP response status: numeric code plus canonical reason phrase.
///
/// `Display` renders the reason phrase alone — that is the form log lines
/// show (`Found: GET - /items`), matching how completion logging names a
/// status. The numeric code is available through [`code`](Self::code) and is
/// included in `Debug` output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCode {
    code: u16,
    reason: &'static str,
}

impl StatusCode {
    pub const OK: StatusCode = StatusCode::new(200, "OK");
    pub const CREATED: StatusCode = StatusCode::new(201, "Created");
    pub const NO_CONTENT: StatusCode = StatusCode::new(204, "No Content");
    pub const MOVED_PERMANENTLY: StatusCode = StatusCode::new(301, "Moved Permanently");
    pub const FOUND: StatusCode = StatusCode::new(302, "Found");
    pub const SEE_OTHER: StatusCode = StatusCode::new(303, "See Other");
    pub const BAD_REQUEST: StatusCode = StatusCode::new(400, "Bad Request");
    pub const NOT_FOUND: StatusCode = StatusCode::new(404, "Not Found");
    pub const INTERNAL_SERVER_ERROR: StatusCode = StatusCode::new(500, "Internal Server Error");

    /// Creates a status from a numeric code and reason phrase.
    pub const fn new(code: u16, reason: &'static str) -> Self {
        Self { code, reason }
    }

    /// Returns the numeric status code.
    pub const fn code(&self) -> u16 {
        self.code
    }

    /// Returns the canonical reason phrase.
    pub const fn reason(&self) -> &'static str {
        self.reason
    }

    /// Returns `true` for 3xx statuses.
    pub const fn is_redirection(&self) -> bool {
        self.code >= 300 && self.code < 400
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason)
    }
}

/// The in-flight request context driven through a [`Pipeline`].
///
/// Request data is fixed at creation; the response side fills in as
/// downstream interceptors run, which is why [`status`](Self::status) and
/// [`header`](Self::header) return owned snapshots rather than borrows.
///
/// One instance exists per request. It is shared across interceptor frames
/// as a [`BoxedCall`] and dropped by the owner after the chain finishes —
/// whether by success, short-circuit, or an unhandled error.
///
/// [`Pipeline`]: crate::Pipeline
pub trait Call: Send + Sync + 'static {
    /// The request method, e.g. `GET`.
    fn method(&self) -> &str;

    /// The request path, e.g. `/items`.
    fn path(&self) -> &str;

    /// The response status, once set by downstream processing.
    fn status(&self) -> Option<StatusCode>;

    /// Looks up a response header by name.
    fn header(&self, name: &str) -> Option<String>;

    /// The engine-facing execution flags for this call.
    fn state(&self) -> &CallState;

    /// Access to the concrete call type, for handlers that know it.
    fn as_any(&self) -> &dyn Any;
}

/// A shared, type-erased call.
pub type BoxedCall = Arc<dyn Call>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_display_is_reason_phrase() {
        assert_eq!(StatusCode::OK.to_string(), "OK");
        assert_eq!(StatusCode::FOUND.to_string(), "Found");
        assert_eq!(StatusCode::new(418, "I'm a teapot").to_string(), "I'm a teapot");
    }

    #[test]
    fn redirection_covers_3xx_only() {
        assert!(StatusCode::FOUND.is_redirection());
        assert!(StatusCode::MOVED_PERMANENTLY.is_redirection());
        assert!(!StatusCode::OK.is_redirection());
        assert!(!StatusCode::NOT_FOUND.is_redirection());
    }

    #[test]
    fn call_state_begins_once() {
        let state = CallState::new();
        assert!(!state.is_executed());
        assert!(state.try_begin());
        assert!(state.is_executed());
        assert!(!state.try_begin());
    }
}
