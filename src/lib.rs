//! # gracevisor
//!
//! **Gracevisor** is a small lifecycle controller for long-running async services.
//!
//! A service hands the [`Controller`] up to four callbacks (start, run, stop and
//! an optional forced-shutdown) and the controller drives them: start once, run
//! in a loop until stopped, stop once. A termination signal (or
//! [`Controller::interrupt`]) stops the service gracefully and, if the grace
//! period elapses, escalates to a forced shutdown of the process.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!        ┌──────────────────────────────────────┐
//!        │ Hooks { start, run, stop, force }    │
//!        └──────────────────┬───────────────────┘
//!                           ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Controller                                                       │
//! │  - Config (name, grace, run_interval, log_level, escalation)      │
//! │  - Lifecycle (watch cell: initialized/running/can_restart/...)    │
//! │  - Bus (broadcast events)                                         │
//! └──────┬──────────────────────────┬─────────────────────────┬───────┘
//!        ▼                          ▼                         ▼
//!   start().await            interrupt listener          event fan-out
//!   (caller's task)          (spawned on 1st start)      (spawned on 1st start)
//!        │                          │                         │
//!        │ Publishes:               │ Publishes:              ▼
//!        │ - ServiceStarting        │ - InterruptReceived   SubscriberSet
//!        │ - CallbackFailed         │ - GraceExceeded       (per-sub queues)
//!        │ - ServiceStopped         │ - ForceShutdown
//!        ▼                          ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! │                   (capacity: Config::bus_capacity)                │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ### Lifecycle
//! ```text
//! start(hooks)
//!   ├─► reject if another start is in flight (warn, Ok)
//!   ├─► hooks.start ──────────── Err ─► abort, Err
//!   ├─► while running {
//!   │     hooks.run ──────────── Err ─► abort, Err (stop is skipped)
//!   │     pause(run_interval)            (woken early by stop)
//!   │   }
//!   ├─► hooks.stop ───────────── Err ─► abort, Err
//!   └─► can_restart = true, Ok
//!
//! SIGINT | SIGTERM | SIGQUIT | interrupt()
//!   ├─► latch interrupted (restart refused from now on)
//!   ├─► stop()
//!   └─► after grace: hooks.force_shutdown, or terminate(exit_code)
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                    |
//! |-------------------|--------------------------------------------------------------|---------------------------------------|
//! | **Lifecycle**     | Start/run/stop loop, restart, interrupt escalation.          | [`Controller`], [`Status`]            |
//! | **Callbacks**     | Async lifecycle steps as closures or trait objects.          | [`Hooks`], [`Callback`], [`CallbackFn`] |
//! | **Policies**      | Diagnostic verbosity and escalation behaviour.               | [`LogLevel`], [`EscalationPolicy`]    |
//! | **Subscriber API**| Hook into lifecycle events (audit, metrics, alerts).         | [`Subscribe`], [`Event`]              |
//! | **Errors**        | Typed errors for controller misuse and callback failures.    | [`ControllerError`], [`CallbackError`] |
//! | **Configuration** | Centralize controller settings.                              | [`Config`]                            |
//!
//! Diagnostics are emitted through [`tracing`]; install any subscriber to see them.
//!
//! ## Example
//! ```rust,no_run
//! use std::time::Duration;
//! use gracevisor::{CallbackError, Config, Controller, Hooks, LogLevel};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = Config::with_timings(
//!         "worker",
//!         Duration::from_secs(3),
//!         Duration::from_millis(500),
//!         LogLevel::Info,
//!     );
//!     let ctl = Controller::with_config(cfg);
//!
//!     let hooks = Hooks::new()
//!         .on_start(|| async { Ok::<_, CallbackError>(()) })
//!         .on_run(|| async {
//!             println!("working...");
//!             Ok(())
//!         })
//!         .on_stop(|| async { Ok(()) });
//!
//!     // Returns after Ctrl-C (or `ctl.stop()` from another task).
//!     ctl.start(hooks).await?;
//!     Ok(())
//! }
//! ```
mod callbacks;
mod config;
mod core;
mod error;
mod events;
mod policies;
mod subscribers;

// ---- Public re-exports ----

pub use crate::core::{Controller, ControllerBuilder, Status, Terminator};
pub use callbacks::{BoxCallbackFuture, Callback, CallbackFn, CallbackRef, Hooks, Phase};
pub use config::Config;
pub use error::{CallbackError, ControllerError};
pub use events::{Bus, Event, EventKind};
pub use policies::{EscalationPolicy, LogLevel};
pub use subscribers::{Subscribe, SubscriberSet};
