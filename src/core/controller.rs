//! # Controller: lifecycle of one service.
//!
//! The [`Controller`] owns the service configuration, the lifecycle state cell,
//! the event bus and the (lazily started) interrupt listener.
//!
//! ## Key responsibilities
//! - run `start → run* → stop` for the supplied [`Hooks`], blocking the caller's task
//! - cooperative [`stop`](Controller::stop): the current run iteration always completes
//! - [`restart`](Controller::restart) that defers re-entry until the previous `start` unwound
//! - interrupt handling with a graceful-shutdown timeout escalating to forced shutdown
//!
//! ## High-level flow
//! ```text
//! start(hooks)
//!   ├─ begin() CAS ── already initialized ─► warn + StartRejected, Ok(())
//!   ├─ info "starting" ─► install listener (once) ─► ServiceStarting
//!   ├─ hooks.start ─────────────── Err ─► CallbackFailed, Err(Callback{Start})
//!   ├─ while running { hooks.run; pause } ─ Err ─► CallbackFailed, Err(Callback{Run})
//!   ├─ hooks.stop ──────────────── Err ─► CallbackFailed, Err(Callback{Stop})
//!   └─ info "stopped gracefully" ─► ServiceStopped ─► finish() (can_restart)
//!
//! interrupt listener (one per controller)
//!   signal | interrupt() ─► latch ─► warn ─► stop() ─► sleep(grace)
//!                                                    └─► hooks.force_shutdown | force shutdown
//! ```
//!
//! ## Example
//! ```rust,no_run
//! use std::time::Duration;
//! use gracevisor::{CallbackError, Controller, Hooks};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let ctl = Controller::new("ticker");
//!     ctl.set_run_interval(Duration::from_millis(250));
//!
//!     let hooks = Hooks::new()
//!         .on_start(|| async { println!("up"); Ok::<_, CallbackError>(()) })
//!         .on_run(|| async { println!("tick"); Ok(()) })
//!         .on_stop(|| async { println!("down"); Ok(()) });
//!
//!     // Ctrl-C stops the loop; the process is force-exited 5s later.
//!     ctl.start(hooks).await?;
//!     Ok(())
//! }
//! ```

use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use super::builder::ControllerBuilder;
use super::listener;
use super::state::{Lifecycle, Status};
use crate::callbacks::{CallbackRef, Hooks, Phase};
use crate::config::Config;
use crate::error::ControllerError;
use crate::events::{Bus, Event, EventKind};
use crate::policies::LogLevel;
use crate::subscribers::{Subscribe, SubscriberSet};

/// Process terminator invoked by forced shutdown with the configured exit code.
pub type Terminator = Arc<dyn Fn(i32) + Send + Sync>;

/// What the listener does with the timer armed after an interrupt.
pub(crate) enum Escalation {
    /// Fires when the grace period elapses.
    Armed,
    /// Fires unless the token is cancelled first.
    DisarmOn(CancellationToken),
    /// No `start` was in flight; nothing to escalate.
    NotNeeded,
}

/// Lifecycle controller for a single service instance.
pub struct Controller {
    name: Arc<str>,
    settings: RwLock<Config>,
    lifecycle: Lifecycle,
    bus: Bus,
    /// Handed to the fan-out on the first `start`.
    pending_subscribers: Mutex<Vec<Arc<dyn Subscribe>>>,
    terminator: Terminator,
    /// Programmatic interrupt, observed by the listener like an OS signal.
    interrupt: CancellationToken,
    /// Cancelled on drop; stops the background tasks.
    closed: CancellationToken,
}

impl Controller {
    /// Creates a controller with default configuration.
    ///
    /// No background work starts until the first [`start`](Controller::start).
    pub fn new(name: impl Into<std::borrow::Cow<'static, str>>) -> Arc<Self> {
        Self::builder(Config::new(name)).build()
    }

    /// Creates a controller from an explicit configuration.
    pub fn with_config(cfg: Config) -> Arc<Self> {
        Self::builder(cfg).build()
    }

    /// Returns a builder for subscribers and a custom terminator.
    pub fn builder(cfg: Config) -> ControllerBuilder {
        ControllerBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        cfg: Config,
        subscribers: Vec<Arc<dyn Subscribe>>,
        terminator: Terminator,
    ) -> Self {
        Self {
            name: Arc::from(&*cfg.name),
            bus: Bus::new(cfg.bus_capacity_clamped()),
            settings: RwLock::new(cfg),
            lifecycle: Lifecycle::new(),
            pending_subscribers: Mutex::new(subscribers),
            terminator,
            interrupt: CancellationToken::new(),
            closed: CancellationToken::new(),
        }
    }

    // ---- configuration ----

    /// Service name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Snapshot of the current configuration.
    pub fn config(&self) -> Config {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Reads one setting under the lock without cloning the whole config.
    fn setting<T>(&self, f: impl FnOnce(&Config) -> T) -> T {
        f(&self.settings.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn update(&self, f: impl FnOnce(&mut Config)) {
        f(&mut self.settings.write().unwrap_or_else(PoisonError::into_inner));
    }

    /// Graceful-shutdown timeout.
    pub fn grace(&self) -> Duration {
        self.setting(|c| c.grace)
    }

    /// Sets the graceful-shutdown timeout used by the next interrupt.
    pub fn set_grace(&self, grace: Duration) {
        self.update(|c| c.grace = grace);
    }

    /// Pause between run iterations.
    pub fn run_interval(&self) -> Duration {
        self.setting(|c| c.run_interval)
    }

    /// Sets the pause between run iterations (`<= 1ms` = none).
    pub fn set_run_interval(&self, interval: Duration) {
        self.update(|c| c.run_interval = interval);
    }

    /// Diagnostic verbosity.
    pub fn log_level(&self) -> LogLevel {
        self.setting(|c| c.log_level)
    }

    /// Sets the diagnostic verbosity.
    pub fn set_log_level(&self, level: LogLevel) {
        self.update(|c| c.log_level = level);
    }

    fn allows(&self, at: LogLevel) -> bool {
        self.log_level().allows(at)
    }

    // ---- observation ----

    /// `true` while a `start` is in flight and its run loop has not been told to stop.
    pub fn is_running(&self) -> bool {
        let st = self.lifecycle.status();
        st.initialized && st.running
    }

    /// Snapshot of the lifecycle flags.
    pub fn status(&self) -> Status {
        self.lifecycle.status()
    }

    /// Receiver for lifecycle events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    fn event(&self, kind: EventKind) -> Event {
        Event::new(kind).with_service(Arc::clone(&self.name))
    }

    // ---- lifecycle operations ----

    /// Runs the service until it is stopped.
    ///
    /// Invokes `hooks.start` once, `hooks.run` while running (pausing
    /// `run_interval` between iterations), then `hooks.stop` once. The returned
    /// future resolves only when this lifecycle ends; spawn it to keep going.
    ///
    /// ### Errors
    /// The first callback error aborts the remaining phases (including `stop`)
    /// and is returned as [`ControllerError::Callback`]. The controller then
    /// stays initialized: later starts are rejected.
    ///
    /// A call made while another `start` is in flight is rejected with `Ok(())`
    /// and a warning; it does not queue.
    pub async fn start(self: &Arc<Self>, hooks: Hooks) -> Result<(), ControllerError> {
        let Some(cycle) = self.lifecycle.begin(hooks.clone()) else {
            if self.allows(LogLevel::Warn) {
                tracing::warn!(service = %self.name, "already started");
            }
            self.bus.publish(self.event(EventKind::StartRejected));
            return Ok(());
        };
        self.run_cycle(hooks, cycle).await
    }

    async fn run_cycle(
        self: &Arc<Self>,
        hooks: Hooks,
        cycle: CancellationToken,
    ) -> Result<(), ControllerError> {
        if self.allows(LogLevel::Info) {
            tracing::info!(service = %self.name, "starting service");
        }
        self.install_listener();
        self.bus.publish(self.event(EventKind::ServiceStarting));

        if let Some(cb) = hooks.start() {
            self.invoke(Phase::Start, cb).await?;
        }

        if let Some(cb) = hooks.run() {
            while self.lifecycle.status().running {
                self.invoke(Phase::Run, cb).await?;

                if let Some(pause) = self.setting(Config::run_pause) {
                    tokio::select! {
                        _ = tokio::time::sleep(pause) => {}
                        _ = self.lifecycle.stopped() => {}
                    }
                }
            }
        }

        if let Some(cb) = hooks.stop() {
            self.invoke(Phase::Stop, cb).await?;
        }

        if self.allows(LogLevel::Info) {
            tracing::info!(service = %self.name, "stopped gracefully");
        }
        self.bus.publish(self.event(EventKind::ServiceStopped));
        self.lifecycle.finish();
        cycle.cancel();
        Ok(())
    }

    async fn invoke(&self, phase: Phase, cb: &CallbackRef) -> Result<(), ControllerError> {
        cb.call().await.map_err(|source| {
            self.lifecycle.fail();
            if self.allows(LogLevel::All) {
                tracing::debug!(service = %self.name, %phase, error = %source, "callback failed");
            }
            self.bus.publish(
                self.event(EventKind::CallbackFailed)
                    .with_phase(phase)
                    .with_reason(source.to_string()),
            );
            ControllerError::Callback { phase, source }
        })
    }

    /// Asks the run loop to exit after its current iteration.
    ///
    /// ### Errors
    /// [`ControllerError::NotRunning`] if nothing is running and the log level is
    /// `Warn` or above; below that the call is a silent no-op.
    pub fn stop(&self) -> Result<(), ControllerError> {
        if self.lifecycle.request_stop() {
            if self.allows(LogLevel::Info) {
                tracing::info!(service = %self.name, "stopping service");
            }
            self.bus.publish(self.event(EventKind::StopRequested));
            return Ok(());
        }

        self.bus.publish(self.event(EventKind::StopRejected));
        if self.allows(LogLevel::Warn) {
            return Err(ControllerError::NotRunning {
                service: self.name.to_string(),
            });
        }
        Ok(())
    }

    /// Stops the service (if running) and starts it again with the stored hooks.
    ///
    /// Waits, without polling, until the previous `start` has fully returned,
    /// then re-enters the lifecycle and resolves with its result. Like `start`,
    /// the returned future lives as long as the new lifecycle.
    ///
    /// ### Errors
    /// [`ControllerError::RestartRefused`] if an interrupt is latched before or
    /// while waiting; otherwise whatever the new lifecycle returns.
    pub async fn restart(self: &Arc<Self>) -> Result<(), ControllerError> {
        if self.lifecycle.status().interrupted {
            return Err(self.refuse_restart());
        }

        if self.allows(LogLevel::Info) {
            tracing::info!(service = %self.name, "calling for restart of service");
        }
        self.bus.publish(self.event(EventKind::RestartRequested));

        if self.lifecycle.status().running {
            if let Err(err) = self.stop() {
                tracing::debug!(service = %self.name, error = %err, "stop before restart");
            }
        }

        match self.lifecycle.begin_restart().await {
            Some(cycle) => self.run_cycle(cycle.hooks, cycle.token).await,
            None => Err(self.refuse_restart()),
        }
    }

    fn refuse_restart(&self) -> ControllerError {
        if self.allows(LogLevel::Warn) {
            tracing::warn!(service = %self.name, "restart refused, process is interrupted");
        }
        self.bus.publish(self.event(EventKind::RestartRefused));
        ControllerError::RestartRefused {
            service: self.name.to_string(),
        }
    }

    /// Stops the service and terminates the process with `Config::exit_code`.
    ///
    /// Does not return unless a custom terminator was installed through
    /// [`ControllerBuilder::with_terminator`] and it returned.
    ///
    /// ### Errors
    /// The error of [`stop`](Controller::stop), in which case nothing is terminated.
    pub fn force_shutdown(&self) -> Result<(), ControllerError> {
        self.stop()?;
        self.terminate();
        Ok(())
    }

    fn terminate(&self) {
        if self.allows(LogLevel::Error) {
            tracing::error!(
                service = %self.name,
                "(timeout) forced shutdown of program with all its running services"
            );
        }
        self.bus.publish(self.event(EventKind::ForceShutdown));
        (self.terminator)(self.setting(|c| c.exit_code));
    }

    /// Triggers the interrupt path as if the process received a termination signal.
    ///
    /// The interrupt is latched immediately, so `restart` is refused from now on.
    /// Stop and escalation run in the listener, which is installed by the first
    /// `start`: an interrupt raised before it stops that first `start` right away.
    /// A second interrupt is ignored.
    pub fn interrupt(&self) {
        self.lifecycle.latch_interrupt();
        self.interrupt.cancel();
    }

    // ---- interrupt handling (driven by the listener task) ----

    fn install_listener(self: &Arc<Self>) {
        if !self.lifecycle.install_listener() {
            return;
        }
        self.spawn_fanout();
        tokio::spawn(listener::listen(
            Arc::downgrade(self),
            self.interrupt.clone(),
            self.closed.clone(),
            self.setting(|c| c.os_signals),
        ));
    }

    fn spawn_fanout(&self) {
        let subs = std::mem::take(
            &mut *self
                .pending_subscribers
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        if subs.is_empty() {
            return;
        }

        let set = SubscriberSet::new(subs, self.bus.clone());
        let mut rx = self.bus.subscribe();
        let closed = self.closed.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = closed.cancelled() => break,
                    msg = rx.recv() => match msg {
                        Ok(ev) => set.emit_arc(Arc::new(ev)),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "event fan-out lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            }
            set.shutdown().await;
        });
    }

    pub(crate) fn report_signal_error(&self, err: &std::io::Error) {
        if self.allows(LogLevel::Error) {
            tracing::error!(service = %self.name, error = %err, "cannot listen for termination signals");
        }
    }

    /// Latches the interrupt, stops the service and decides how to escalate.
    pub(crate) fn on_interrupt(&self, source: &str) -> (Duration, Escalation) {
        let (grace, level, policy) = self.setting(|c| (c.grace, c.log_level, c.escalation));
        self.lifecycle.latch_interrupt();

        if level.allows(LogLevel::Warn) {
            tracing::warn!(
                service = %self.name,
                signal = source,
                timeout = ?grace,
                "received interrupt signal, initiating graceful shutdown"
            );
        }
        self.bus
            .publish(self.event(EventKind::InterruptReceived).with_grace(grace));

        let escalation = if policy.cancels_on_clean_stop() {
            match self.lifecycle.cycle_token() {
                Some(token) => Escalation::DisarmOn(token),
                None => Escalation::NotNeeded,
            }
        } else {
            Escalation::Armed
        };

        let _ = self.stop();
        (grace, escalation)
    }

    /// No `start` was in flight at interrupt time, so no timer was armed.
    pub(crate) fn on_escalation_not_needed(&self) {
        if self.allows(LogLevel::Info) {
            tracing::info!(service = %self.name, "no service in flight, forced shutdown not armed");
        }
    }

    pub(crate) fn on_escalation_cancelled(&self) {
        if self.allows(LogLevel::Info) {
            tracing::info!(service = %self.name, "stopped within grace period, forced shutdown cancelled");
        }
        self.bus
            .publish(self.event(EventKind::EscalationCancelled).with_grace(self.grace()));
    }

    /// Runs the force-shutdown path after the grace period elapsed.
    pub(crate) async fn escalate(&self) {
        let grace = self.grace();
        let hooks = self.lifecycle.hooks();

        match hooks.force_shutdown() {
            Some(cb) => {
                self.bus.publish(
                    self.event(EventKind::GraceExceeded)
                        .with_grace(grace)
                        .with_phase(Phase::ForceShutdown),
                );
                if let Err(err) = cb.call().await {
                    if self.allows(LogLevel::Error) {
                        tracing::error!(service = %self.name, error = %err, "force shutdown callback failed");
                    }
                }
            }
            None => {
                self.bus
                    .publish(self.event(EventKind::GraceExceeded).with_grace(grace));
                // The listener already stopped the service; "not running" is expected here.
                let _ = self.stop();
                self.terminate();
            }
        }
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.closed.cancel();
    }
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("name", &self.name)
            .field("status", &self.lifecycle.status())
            .finish_non_exhaustive()
    }
}
