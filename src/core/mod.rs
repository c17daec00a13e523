//! Controller core: lifecycle state machine and interrupt handling.
//!
//! The only public API from this module is [`Controller`] (with its builder and
//! state snapshot), which runs one service's lifecycle and reacts to termination
//! signals.
//!
//! Internal modules:
//! - [`controller`]: lifecycle operations, diagnostics and event publishing;
//! - [`state`]: state cell with compare-and-swap transitions;
//! - [`listener`]: interrupt listener and graceful-to-forced escalation;
//! - [`shutdown`]: cross-platform termination signal handling;
//! - [`builder`]: controller construction.

mod builder;
mod controller;
mod listener;
mod shutdown;
mod state;

#[cfg(test)]
mod tests;

pub use builder::ControllerBuilder;
pub use controller::{Controller, Terminator};
pub use state::Status;
