//! # Callback abstraction.
//!
//! A [`Callback`] produces a fresh future each time the controller invokes it.
//! The run callback is invoked once per loop iteration, so implementations must
//! be callable repeatedly; the others are invoked once per `start`.
//!
//! Callbacks are never cancelled by the controller. A callback that blocks
//! forever keeps `start` from returning; long-running bodies should consult
//! `Controller::is_running` (or their own flag) and return promptly.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::CallbackError;

/// Boxed future returned by [`Callback::call`].
pub type BoxCallbackFuture = Pin<Box<dyn Future<Output = Result<(), CallbackError>> + Send + 'static>>;

/// Shared handle to a callback.
pub type CallbackRef = Arc<dyn Callback>;

/// # One asynchronous lifecycle step.
///
/// # Example
/// ```
/// use gracevisor::{BoxCallbackFuture, Callback};
///
/// struct Flush;
///
/// impl Callback for Flush {
///     fn call(&self) -> BoxCallbackFuture {
///         Box::pin(async {
///             // flush buffers...
///             Ok(())
///         })
///     }
/// }
/// ```
pub trait Callback: Send + Sync + 'static {
    /// Creates the future for one invocation.
    fn call(&self) -> BoxCallbackFuture;
}
