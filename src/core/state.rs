//! # Lifecycle state cell.
//!
//! All mutable controller state lives in one [`LifecycleState`] held by a
//! `tokio::sync::watch::Sender`. Every transition is a single `send_if_modified`
//! closure, so each one is an atomic compare-and-swap over the whole struct and
//! waiters (`restart`, the run-loop pause) wake exactly when something changed.
//!
//! ## Transitions
//! ```text
//!              begin()                         finish()
//!   idle ───────────────► initialized,running ─────────► idle (can_restart)
//!    ▲                         │    │
//!    │ begin_restart()         │    └─ request_stop() ─► initialized,!running
//!    └── (can_restart) ────────┘                              │
//!                                            fail() ─► initialized (stuck until interrupt)
//!
//!   latch_interrupt(): interrupted = true, forever
//! ```
//!
//! ## Invariants
//! - `initialized` and `can_restart` are never both true.
//! - `running` implies `initialized`.
//! - `interrupted` never reverts.
//! - The interrupt listener is installed at most once.

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::callbacks::Hooks;

/// Snapshot of the lifecycle flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Status {
    /// A `start` call is executing.
    pub initialized: bool,
    /// The run loop should keep iterating.
    pub running: bool,
    /// No `start` is in flight; `restart` may proceed.
    pub can_restart: bool,
    /// An interrupt was observed (latched).
    pub interrupted: bool,
}

pub(crate) struct LifecycleState {
    status: Status,
    listener_installed: bool,
    hooks: Hooks,
    /// Token of the `start` invocation in flight, cancelled when it completes cleanly.
    cycle: Option<CancellationToken>,
}

/// A `start` invocation that has taken ownership of the controller.
pub(crate) struct Cycle {
    pub(crate) hooks: Hooks,
    pub(crate) token: CancellationToken,
}

pub(crate) struct Lifecycle {
    tx: watch::Sender<LifecycleState>,
}

impl Lifecycle {
    pub(crate) fn new() -> Self {
        let (tx, _rx) = watch::channel(LifecycleState {
            status: Status {
                can_restart: true,
                ..Status::default()
            },
            listener_installed: false,
            hooks: Hooks::default(),
            cycle: None,
        });
        Self { tx }
    }

    pub(crate) fn status(&self) -> Status {
        self.tx.borrow().status
    }

    /// Most recently stored hooks.
    pub(crate) fn hooks(&self) -> Hooks {
        self.tx.borrow().hooks.clone()
    }

    /// Token of the `start` invocation currently in flight.
    pub(crate) fn cycle_token(&self) -> Option<CancellationToken> {
        self.tx.borrow().cycle.clone()
    }

    /// Takes ownership for a new `start` unless one is already in flight.
    pub(crate) fn begin(&self, hooks: Hooks) -> Option<CancellationToken> {
        let mut began = None;
        self.tx.send_if_modified(|s| {
            if s.status.initialized {
                return false;
            }
            let token = CancellationToken::new();
            s.status.initialized = true;
            s.status.running = true;
            s.status.can_restart = false;
            s.hooks = hooks;
            s.cycle = Some(token.clone());
            began = Some(token);
            true
        });
        began
    }

    /// Takes ownership for a restart once the previous `start` has fully unwound.
    ///
    /// Returns `None` as soon as the interrupt latch is observed.
    pub(crate) async fn begin_restart(&self) -> Option<Cycle> {
        let mut rx = self.tx.subscribe();
        loop {
            match self.try_begin_restart() {
                RestartGate::Begun(cycle) => return Some(cycle),
                RestartGate::Interrupted => return None,
                RestartGate::Pending => {}
            }
            if rx.changed().await.is_err() {
                return None;
            }
        }
    }

    fn try_begin_restart(&self) -> RestartGate {
        let mut gate = RestartGate::Pending;
        self.tx.send_if_modified(|s| {
            if s.status.interrupted {
                gate = RestartGate::Interrupted;
                return false;
            }
            if !s.status.can_restart || s.status.initialized {
                return false;
            }
            let token = CancellationToken::new();
            s.status.can_restart = false;
            s.status.initialized = true;
            s.status.running = true;
            s.cycle = Some(token.clone());
            gate = RestartGate::Begun(Cycle {
                hooks: s.hooks.clone(),
                token,
            });
            true
        });
        gate
    }

    /// Clears the running flag. Returns `false` if it was already clear.
    pub(crate) fn request_stop(&self) -> bool {
        self.tx.send_if_modified(|s| {
            if !s.status.running {
                return false;
            }
            s.status.running = false;
            true
        })
    }

    /// Completes until the running flag is clear.
    pub(crate) async fn stopped(&self) {
        let mut rx = self.tx.subscribe();
        let _ = rx.wait_for(|s| !s.status.running).await;
    }

    /// Graceful completion of a `start`.
    pub(crate) fn finish(&self) {
        self.tx.send_modify(|s| {
            s.status.initialized = false;
            s.status.running = false;
            s.status.can_restart = true;
            s.cycle = None;
        });
    }

    /// Abort of a `start` by a failing callback.
    ///
    /// The controller stays initialized, so later starts are rejected and
    /// restarts wait until an interrupt refuses them.
    pub(crate) fn fail(&self) {
        self.tx.send_if_modified(|s| {
            let changed = s.status.running;
            s.status.running = false;
            changed
        });
    }

    /// Latches the interrupt flag. Returns `true` only for the first call.
    pub(crate) fn latch_interrupt(&self) -> bool {
        self.tx.send_if_modified(|s| {
            if s.status.interrupted {
                return false;
            }
            s.status.interrupted = true;
            true
        })
    }

    /// Marks the interrupt listener installed. Returns `true` only for the first call.
    pub(crate) fn install_listener(&self) -> bool {
        let mut first = false;
        self.tx.send_if_modified(|s| {
            first = !s.listener_installed;
            s.listener_installed = true;
            false
        });
        first
    }
}

enum RestartGate {
    Begun(Cycle),
    Interrupted,
    Pending,
}
