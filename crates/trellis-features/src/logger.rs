//! The logger seam used by call-completion and lifecycle logging.
//!
//! The pipeline core requires nothing from a logging backend beyond two
//! operations: report whether a level is enabled, and accept a message at
//! that level. [`CallLogger`] captures exactly that boundary;
//! [`TracingLogger`] is the default implementation over the `tracing`
//! macros. Tests substitute a recording implementation to assert on exact
//! output lines.

use tracing::{Level, debug, info, trace};

/// Verbosity at which a feature emits its messages.
///
/// Chosen once at install time; the feature validates the requested level
/// against the logger then, not per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
}

impl LogLevel {
    /// Upper-case level name, as used in error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A leveled string-message logger, as the features see it.
pub trait CallLogger: Send + Sync + 'static {
    /// Whether messages at `level` would currently be recorded.
    fn enabled(&self, level: LogLevel) -> bool;

    /// Records `message` at `level`.
    fn log(&self, level: LogLevel, message: &str);
}

/// The default [`CallLogger`], emitting through `tracing` under the
/// `trellis::call` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl TracingLogger {
    pub fn new() -> Self {
        Self
    }
}

impl CallLogger for TracingLogger {
    fn enabled(&self, level: LogLevel) -> bool {
        match level {
            LogLevel::Trace => tracing::enabled!(target: "trellis::call", Level::TRACE),
            LogLevel::Debug => tracing::enabled!(target: "trellis::call", Level::DEBUG),
            LogLevel::Info => tracing::enabled!(target: "trellis::call", Level::INFO),
        }
    }

    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Trace => trace!(target: "trellis::call", "{message}"),
            LogLevel::Debug => debug!(target: "trellis::call", "{message}"),
            LogLevel::Info => info!(target: "trellis::call", "{message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_names_match_error_wording() {
        assert_eq!(LogLevel::Trace.to_string(), "TRACE");
        assert_eq!(LogLevel::Debug.as_str(), "DEBUG");
        assert_eq!(LogLevel::Info.as_str(), "INFO");
    }
}
