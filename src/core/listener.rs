//! # Interrupt listener.
//!
//! One background task per controller, spawned by the first `start`. It waits
//! for a termination signal (or `Controller::interrupt`), hands the interrupt to
//! the controller, then runs the escalation timer.
//!
//! ```text
//! select {
//!   closed           ─► exit (controller dropped)
//!   interrupt()      ─┐
//!   OS signal        ─┴► on_interrupt(): latch, warn, stop()
//! }
//! match escalation {
//!   NotNeeded        ─► info, exit (nothing to escalate)
//!   Armed            ─► sleep(grace) ─► escalate()
//!   DisarmOn(token)  ─► select { sleep(grace) ─► escalate(), token ─► EscalationCancelled }
//! }
//! ```
//!
//! The signal subscription is single-shot: after the first interrupt the task
//! stops listening. It only holds a `Weak` handle between steps, so it never
//! keeps a dropped controller alive.

use std::future::pending;
use std::sync::Weak;

use tokio_util::sync::CancellationToken;

use super::controller::{Controller, Escalation};
use super::shutdown;

pub(crate) async fn listen(
    ctl: Weak<Controller>,
    interrupt: CancellationToken,
    closed: CancellationToken,
    os_signals: bool,
) {
    let source = tokio::select! {
        _ = closed.cancelled() => return,
        _ = interrupt.cancelled() => "interrupt()",
        name = os_signal(&ctl, os_signals) => name,
    };

    let Some(c) = ctl.upgrade() else { return };
    let (grace, escalation) = c.on_interrupt(source);
    drop(c);

    let disarm = match escalation {
        Escalation::NotNeeded => {
            if let Some(c) = ctl.upgrade() {
                c.on_escalation_not_needed();
            }
            return;
        }
        Escalation::Armed => None,
        Escalation::DisarmOn(token) => Some(token),
    };

    tokio::select! {
        _ = tokio::time::sleep(grace) => {}
        _ = closed.cancelled() => return,
        _ = disarmed(disarm.as_ref()) => {
            if let Some(c) = ctl.upgrade() {
                c.on_escalation_cancelled();
            }
            return;
        }
    }

    if let Some(c) = ctl.upgrade() {
        c.escalate().await;
    }
}

/// Completes with the signal name; never completes when disabled or unavailable.
async fn os_signal(ctl: &Weak<Controller>, enabled: bool) -> &'static str {
    if !enabled {
        return pending().await;
    }
    match shutdown::wait_for_signal().await {
        Ok(name) => name,
        Err(err) => {
            if let Some(c) = ctl.upgrade() {
                c.report_signal_error(&err);
            }
            pending().await
        }
    }
}

async fn disarmed(token: Option<&CancellationToken>) {
    match token {
        Some(token) => token.cancelled().await,
        None => pending().await,
    }
}
