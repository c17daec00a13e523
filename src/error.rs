//! Error types used by the gracevisor controller and its callbacks.
//!
//! This module defines two main error enums:
//!
//! - [`ControllerError`]: errors returned by controller operations (`start`, `stop`, `restart`, `force_shutdown`).
//! - [`CallbackError`]: errors returned by user-supplied lifecycle callbacks.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging/metrics.

use thiserror::Error;

use crate::callbacks::Phase;

/// # Errors produced by controller operations.
///
/// Misuse that the controller tolerates (a second concurrent `start`) is not an
/// error; an idle `stop` is one only when the log level is `Warn` or above.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ControllerError {
    /// `stop` was called while the run loop was not running.
    #[error("service was not running: {service}")]
    NotRunning {
        /// Name of the service.
        service: String,
    },

    /// `restart` was called after (or while waiting when) an interrupt was latched.
    #[error("restart refused, process is interrupted: {service}")]
    RestartRefused {
        /// Name of the service.
        service: String,
    },

    /// A lifecycle callback failed; the remaining phases were skipped.
    #[error("{phase} callback failed: {source}")]
    Callback {
        /// Phase whose callback failed.
        phase: Phase,
        /// The error returned by the callback.
        #[source]
        source: CallbackError,
    },
}

impl ControllerError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use gracevisor::ControllerError;
    ///
    /// let err = ControllerError::NotRunning { service: "svc".into() };
    /// assert_eq!(err.as_label(), "controller_not_running");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ControllerError::NotRunning { .. } => "controller_not_running",
            ControllerError::RestartRefused { .. } => "controller_restart_refused",
            ControllerError::Callback { .. } => "controller_callback_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ControllerError::NotRunning { service } => format!("not running: {service}"),
            ControllerError::RestartRefused { service } => {
                format!("restart refused (interrupted): {service}")
            }
            ControllerError::Callback { phase, source } => {
                format!("{phase} failed: {}", source.as_message())
            }
        }
    }

    /// Returns the callback error if this error wraps one.
    pub fn callback_error(&self) -> Option<&CallbackError> {
        match self {
            ControllerError::Callback { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// # Errors produced by lifecycle callbacks.
///
/// The controller never retries a failed callback; the variant only changes
/// how the failure is labelled.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CallbackError {
    /// The callback failed.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The callback hit a condition it considers unrecoverable.
    #[error("fatal error: {error}")]
    Fatal {
        /// The underlying error message.
        error: String,
    },
}

impl CallbackError {
    /// Shorthand for [`CallbackError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        CallbackError::Fail {
            error: error.into(),
        }
    }

    /// Shorthand for [`CallbackError::Fatal`].
    pub fn fatal(error: impl Into<String>) -> Self {
        CallbackError::Fatal {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use gracevisor::CallbackError;
    ///
    /// assert_eq!(CallbackError::fail("boom").as_label(), "callback_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            CallbackError::Fail { .. } => "callback_failed",
            CallbackError::Fatal { .. } => "callback_fatal",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            CallbackError::Fail { error } => format!("error: {error}"),
            CallbackError::Fatal { error } => format!("fatal: {error}"),
        }
    }

    /// Indicates whether the callback flagged the failure as unrecoverable.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CallbackError::Fatal { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_callback_error_keeps_source() {
        let err = ControllerError::Callback {
            phase: Phase::Run,
            source: CallbackError::fail("boom"),
        };
        assert_eq!(err.to_string(), "run callback failed: execution failed: boom");
        assert_eq!(err.callback_error(), Some(&CallbackError::fail("boom")));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_labels() {
        let refused = ControllerError::RestartRefused {
            service: "svc".into(),
        };
        assert_eq!(refused.as_label(), "controller_restart_refused");
        assert_eq!(CallbackError::fatal("x").as_label(), "callback_fatal");
        assert!(CallbackError::fatal("x").is_fatal());
        assert!(!CallbackError::fail("x").is_fatal());
    }
}
