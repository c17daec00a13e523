//! # Service configuration.
//!
//! Provides [`Config`] the identity and timing settings of one controlled service.
//!
//! Config is used in two ways:
//! 1. **Controller creation**: `Controller::with_config(config)` / `Controller::builder(config)`
//! 2. **Live tuning**: `Controller::set_grace`, `set_run_interval`, `set_log_level`
//!    (read on each use, so changes made before `start` always apply)
//!
//! ## Sentinel values
//! - `run_interval <= 1ms` → no pause between run iterations
//! - `grace = 0s` → escalate right after the interrupt-triggered stop
//! - `bus_capacity = 0` → clamped to 1

use std::borrow::Cow;
use std::time::Duration;

use crate::policies::{EscalationPolicy, LogLevel};

/// Smallest run interval that actually suspends the run loop.
const MIN_RUN_PAUSE: Duration = Duration::from_millis(1);

/// Configuration of a single controlled service.
///
/// ## Field semantics
/// - `name`: identity used in diagnostics and events only
/// - `grace`: upper bound between "interrupt observed" and "force shutdown triggered"
/// - `run_interval`: pause between run-callback invocations (`<= 1ms` = none)
/// - `log_level`: diagnostic gate
/// - `escalation`: whether a clean stop disarms the force-shutdown timer
/// - `os_signals`: listen for SIGINT/SIGTERM/SIGQUIT (Ctrl-C on Windows)
/// - `exit_code`: status passed to the terminator on forced shutdown
/// - `bus_capacity`: event bus ring buffer size (min 1)
///
/// ## Notes
/// All fields are public for flexibility. Prefer the helper accessors to avoid
/// sprinkling sentinel checks across the codebase.
#[derive(Clone, Debug)]
pub struct Config {
    /// Service name, used for diagnostics.
    pub name: Cow<'static, str>,

    /// Graceful-shutdown timeout.
    ///
    /// When an interrupt arrives the service is asked to stop and a timer of
    /// `grace` is armed; when it elapses the force-shutdown path runs.
    pub grace: Duration,

    /// Pause between successive run-callback invocations.
    ///
    /// - `<= 1ms` = back-to-back invocations
    /// - `> 1ms` = the run loop suspends for this long after each iteration
    pub run_interval: Duration,

    /// Which diagnostics are emitted.
    pub log_level: LogLevel,

    /// Fate of the armed force-shutdown timer when the service stops cleanly.
    pub escalation: EscalationPolicy,

    /// Whether the interrupt listener subscribes to OS termination signals.
    ///
    /// With `false` only [`Controller::interrupt`](crate::Controller::interrupt)
    /// can trigger the interrupt path.
    pub os_signals: bool,

    /// Process exit status used by forced shutdown.
    pub exit_code: i32,

    /// Capacity of the event bus broadcast channel.
    pub bus_capacity: usize,
}

impl Config {
    /// Creates a configuration with defaults for everything but the name.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            grace: Duration::from_secs(5),
            run_interval: Duration::ZERO,
            log_level: LogLevel::default(),
            escalation: EscalationPolicy::default(),
            os_signals: true,
            exit_code: 1,
            bus_capacity: 1024,
        }
    }

    /// Creates a configuration with the timing and verbosity given inline.
    pub fn with_timings(
        name: impl Into<Cow<'static, str>>,
        grace: Duration,
        run_interval: Duration,
        log_level: LogLevel,
    ) -> Self {
        Self {
            grace,
            run_interval,
            log_level,
            ..Self::new(name)
        }
    }

    /// Returns the pause between run iterations as an `Option`.
    ///
    /// - `None` → no pause (`run_interval <= 1ms`)
    /// - `Some(d)` → suspend for `d` after each iteration
    #[inline]
    pub fn run_pause(&self) -> Option<Duration> {
        if self.run_interval > MIN_RUN_PAUSE {
            Some(self.run_interval)
        } else {
            None
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns a copy with the given escalation policy.
    pub fn with_escalation(mut self, escalation: EscalationPolicy) -> Self {
        self.escalation = escalation;
        self
    }

    /// Returns a copy with OS signal listening switched on or off.
    pub fn with_os_signals(mut self, enabled: bool) -> Self {
        self.os_signals = enabled;
        self
    }

    /// Returns a copy with the given forced-shutdown exit status.
    pub fn with_exit_code(mut self, code: i32) -> Self {
        self.exit_code = code;
        self
    }
}
