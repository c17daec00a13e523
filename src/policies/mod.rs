//! Diagnostic and shutdown policies.
//!
//! This module groups the knobs that control **what** the controller reports
//! and **whether** a pending forced shutdown may be called off.
//!
//! ## Contents
//! - [`LogLevel`] ordered verbosity gate for diagnostics (none / error / warn / info / all)
//! - [`EscalationPolicy`] whether the post-interrupt force-shutdown timer can be cancelled
//!
//! ## Quick wiring
//! ```text
//! Config { log_level: LogLevel, escalation: EscalationPolicy, .. }
//!      └─► core::Controller uses:
//!           - log_level.allows(..) before every diagnostic and for Stop's "not running" error
//!           - escalation to decide if a clean start() return disarms the timer
//! ```
//!
//! ## Defaults
//! - `LogLevel::All` (everything is reported).
//! - `EscalationPolicy::Always` (the timer, once armed, always fires).

mod escalation;
mod level;

pub use escalation::EscalationPolicy;
pub use level::LogLevel;
