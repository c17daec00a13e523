//! # Function-backed callback (`CallbackFn`)
//!
//! [`CallbackFn`] wraps a closure `F: Fn() -> Fut`, producing a fresh future per
//! invocation. State shared between invocations (or with the controller) must be
//! captured explicitly, e.g. through an `Arc`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use gracevisor::{CallbackError, CallbackFn, CallbackRef};
//!
//! let ticks = Arc::new(AtomicU32::new(0));
//! let t = Arc::clone(&ticks);
//! let run: CallbackRef = CallbackFn::arc(move || {
//!     let t = Arc::clone(&t);
//!     async move {
//!         t.fetch_add(1, Ordering::Relaxed);
//!         Ok::<_, CallbackError>(())
//!     }
//! });
//! # let _ = run;
//! ```

use std::future::Future;
use std::sync::Arc;

use crate::callbacks::callback::{BoxCallbackFuture, Callback};
use crate::error::CallbackError;

/// Function-backed callback implementation.
pub struct CallbackFn<F> {
    f: F,
}

impl<F> CallbackFn<F> {
    /// Creates a new function-backed callback.
    ///
    /// Prefer [`CallbackFn::arc`] when you immediately need a [`CallbackRef`](crate::CallbackRef).
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the callback and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

impl<F, Fut> Callback for CallbackFn<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), CallbackError>> + Send + 'static,
{
    fn call(&self) -> BoxCallbackFuture {
        Box::pin((self.f)())
    }
}

impl<F> std::fmt::Debug for CallbackFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackFn").finish_non_exhaustive()
    }
}
