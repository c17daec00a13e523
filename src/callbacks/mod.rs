//! # Lifecycle callbacks.
//!
//! This module provides the callback-related types:
//! - [`Callback`] - trait for one async lifecycle step
//! - [`CallbackFn`] - closure-backed implementation
//! - [`CallbackRef`] - shared reference to a callback (`Arc<dyn Callback>`)
//! - [`Hooks`] - the four optional slots handed to `Controller::start`
//! - [`Phase`] - which slot a callback occupies

mod callback;
mod callback_fn;
mod hooks;
mod phase;

pub use callback::{BoxCallbackFuture, Callback, CallbackRef};
pub use callback_fn::CallbackFn;
pub use hooks::Hooks;
pub use phase::Phase;
