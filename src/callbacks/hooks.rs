//! # Lifecycle hooks for one `start` invocation.
//!
//! Defines [`Hooks`], the four optional callback slots a service hands to
//! [`Controller::start`](crate::Controller::start). An empty slot skips its phase.
//!
//! ```text
//! start ─► [start] ─► loop while running { [run]; pause } ─► [stop]
//!                                        ▲
//! interrupt ─► stop() ─► grace elapses ─► [force_shutdown] (or controller default)
//! ```
//!
//! The controller keeps the most recent `Hooks` so that `restart` can replay them.
//!
//! ## Example
//! ```rust
//! use gracevisor::{CallbackError, Hooks};
//!
//! let hooks = Hooks::new()
//!     .on_start(|| async { Ok::<_, CallbackError>(()) })
//!     .on_run(|| async {
//!         tokio::time::sleep(std::time::Duration::from_millis(10)).await;
//!         Ok(())
//!     })
//!     .on_stop(|| async { Ok(()) });
//!
//! assert!(hooks.run().is_some());
//! assert!(hooks.force_shutdown().is_none());
//! ```

use std::future::Future;

use crate::callbacks::{CallbackFn, CallbackRef, Phase};
use crate::error::CallbackError;

/// Four optional lifecycle callbacks.
#[derive(Clone, Default)]
pub struct Hooks {
    start: Option<CallbackRef>,
    run: Option<CallbackRef>,
    stop: Option<CallbackRef>,
    force_shutdown: Option<CallbackRef>,
}

impl Hooks {
    /// Creates hooks with every slot empty.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates hooks from explicit slots.
    pub fn from_parts(
        start: Option<CallbackRef>,
        run: Option<CallbackRef>,
        stop: Option<CallbackRef>,
        force_shutdown: Option<CallbackRef>,
    ) -> Self {
        Self {
            start,
            run,
            stop,
            force_shutdown,
        }
    }

    /// Sets the start callback from a closure.
    pub fn on_start<F, Fut>(self, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), CallbackError>> + Send + 'static,
    {
        self.with_start(CallbackFn::arc(f))
    }

    /// Sets the run callback from a closure.
    pub fn on_run<F, Fut>(self, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), CallbackError>> + Send + 'static,
    {
        self.with_run(CallbackFn::arc(f))
    }

    /// Sets the stop callback from a closure.
    pub fn on_stop<F, Fut>(self, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), CallbackError>> + Send + 'static,
    {
        self.with_stop(CallbackFn::arc(f))
    }

    /// Sets the force-shutdown callback from a closure.
    ///
    /// When present it replaces the controller's default (process exit) after
    /// the grace period of an interrupt elapses. Its error is logged and discarded.
    pub fn on_force_shutdown<F, Fut>(self, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), CallbackError>> + Send + 'static,
    {
        self.with_force_shutdown(CallbackFn::arc(f))
    }

    /// Returns hooks with the given start callback.
    pub fn with_start(mut self, cb: CallbackRef) -> Self {
        self.start = Some(cb);
        self
    }

    /// Returns hooks with the given run callback.
    pub fn with_run(mut self, cb: CallbackRef) -> Self {
        self.run = Some(cb);
        self
    }

    /// Returns hooks with the given stop callback.
    pub fn with_stop(mut self, cb: CallbackRef) -> Self {
        self.stop = Some(cb);
        self
    }

    /// Returns hooks with the given force-shutdown callback.
    pub fn with_force_shutdown(mut self, cb: CallbackRef) -> Self {
        self.force_shutdown = Some(cb);
        self
    }

    /// Returns the start callback, if any.
    pub fn start(&self) -> Option<&CallbackRef> {
        self.start.as_ref()
    }

    /// Returns the run callback, if any.
    pub fn run(&self) -> Option<&CallbackRef> {
        self.run.as_ref()
    }

    /// Returns the stop callback, if any.
    pub fn stop(&self) -> Option<&CallbackRef> {
        self.stop.as_ref()
    }

    /// Returns the force-shutdown callback, if any.
    pub fn force_shutdown(&self) -> Option<&CallbackRef> {
        self.force_shutdown.as_ref()
    }

    /// Returns the callback occupying `phase`, if any.
    pub fn get(&self, phase: Phase) -> Option<&CallbackRef> {
        match phase {
            Phase::Start => self.start(),
            Phase::Run => self.run(),
            Phase::Stop => self.stop(),
            Phase::ForceShutdown => self.force_shutdown(),
        }
    }
}

impl std::fmt::Debug for Hooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hooks")
            .field("start", &self.start.is_some())
            .field("run", &self.run.is_some())
            .field("stop", &self.stop.is_some())
            .field("force_shutdown", &self.force_shutdown.is_some())
            .finish()
    }
}
