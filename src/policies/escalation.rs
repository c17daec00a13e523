//! # Escalation policy for interrupt-driven shutdown.
//!
//! When an interrupt is observed the controller stops the service and arms a
//! timer of `Config::grace`. [`EscalationPolicy`] decides what a clean exit of
//! the running `start` does to that timer.
//!
//! ```text
//! interrupt ─► stop() ─► arm timer(grace)
//!                            │
//!   Always:                  └─► fires, always
//!   CancelOnCleanStop:       ├─► start() returned Ok first → disarmed
//!                            └─► otherwise fires
//! ```

/// Policy controlling whether a graceful completion disarms the forced-shutdown timer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EscalationPolicy {
    /// The timer is never cancelled; the process is shutting down regardless (default).
    #[default]
    Always,
    /// The timer belongs to the `start` invocation active at interrupt time and is
    /// disarmed when that invocation returns cleanly.
    CancelOnCleanStop,
}

impl EscalationPolicy {
    /// Returns `true` if a clean `start` return disarms the timer.
    #[inline]
    pub fn cancels_on_clean_stop(self) -> bool {
        matches!(self, EscalationPolicy::CancelOnCleanStop)
    }
}
