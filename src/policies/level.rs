//! # Diagnostic verbosity.
//!
//! [`LogLevel`] is an ordered gate: a diagnostic tagged with level `L` is emitted
//! only when the configured level is `>= L`.
//!
//! ```text
//! None < Error < Warn < Info < All
//! ```
//!
//! The gate also decides whether `Controller::stop` on an idle controller is
//! reported as an error (`Warn` and above) or silently accepted.
//!
//! # Example
//! ```rust
//! use gracevisor::LogLevel;
//!
//! assert!(LogLevel::Info.allows(LogLevel::Warn));
//! assert!(!LogLevel::Error.allows(LogLevel::Warn));
//! assert!(!LogLevel::None.allows(LogLevel::Error));
//! ```

/// Ordered diagnostic verbosity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    /// Nothing is reported.
    None,
    /// Only errors (forced shutdown, failing force-shutdown callbacks).
    Error,
    /// Errors and warnings (interrupts, misuse such as double start or idle stop).
    Warn,
    /// Errors, warnings and lifecycle transitions (starting, stopping, stopped).
    Info,
    /// Everything (default).
    #[default]
    All,
}

impl LogLevel {
    /// Returns `true` when a diagnostic at `at` passes this gate.
    #[inline]
    pub fn allows(self, at: LogLevel) -> bool {
        at != LogLevel::None && self >= at
    }

    /// Returns a short stable label for logs.
    pub fn as_label(self) -> &'static str {
        match self {
            LogLevel::None => "none",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::All => "all",
        }
    }
}

impl From<u8> for LogLevel {
    /// Maps the numeric levels `0..=4`; anything above `4` saturates to [`LogLevel::All`].
    fn from(n: u8) -> Self {
        match n {
            0 => LogLevel::None,
            1 => LogLevel::Error,
            2 => LogLevel::Warn,
            3 => LogLevel::Info,
            _ => LogLevel::All,
        }
    }
}
