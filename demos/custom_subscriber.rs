//! # Example: custom_subscriber
//!
//! Demonstrates how to build and attach a custom event subscriber.
//!
//! Shows how to:
//! - Implement the [`Subscribe`] trait.
//! - Inspect [`Event`] / [`EventKind`] for lifecycle reporting.
//! - Wire the subscriber into [`Controller::builder`].
//! - Read a callback failure from [`ControllerError`].
//!
//! ## Flow
//! ```text
//! Controller::start(hooks)
//!     ├─► Bus.publish(ServiceStarting)
//!     ├─► [run] fails on the third iteration
//!     │     └─► publish(CallbackFailed { phase: run, reason })
//!     └─► fan-out (spawned on first start)
//!           └─► SubscriberSet.emit_arc() ──► ConsoleSubscriber.on_event()
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example custom_subscriber
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use gracevisor::{
    CallbackError, Config, Controller, Event, EventKind, Hooks, LogLevel, Subscribe,
};

/// A simple console subscriber that prints selected events.
/// In real life, you could export metrics, ship logs, or page someone on ForceShutdown.
struct ConsoleSubscriber;

#[async_trait::async_trait]
impl Subscribe for ConsoleSubscriber {
    async fn on_event(&self, ev: &Event) {
        let service = ev.service.as_deref().unwrap_or("<unknown>");
        match ev.kind {
            // === Lifecycle ===
            EventKind::ServiceStarting => println!("[sub] starting: service={service}"),
            EventKind::ServiceStopped => println!("[sub] stopped:  service={service}"),
            EventKind::CallbackFailed => {
                println!(
                    "[sub] failed:   service={service} phase={} reason={}",
                    ev.phase.map(|p| p.as_label()).unwrap_or("<none>"),
                    ev.reason.as_deref().unwrap_or("<none>")
                );
            }
            EventKind::StopRequested => println!("[sub] stop requested: service={service}"),
            EventKind::RestartRequested => println!("[sub] restart requested: service={service}"),

            // === Misuse ===
            EventKind::StartRejected | EventKind::StopRejected | EventKind::RestartRefused => {
                println!("[sub] rejected: service={service} kind={:?}", ev.kind);
            }

            // === Interrupt ===
            EventKind::InterruptReceived | EventKind::GraceExceeded => {
                let grace = ev.grace_ms.map(|v| format!("{v}ms")).unwrap_or_default();
                println!("[sub] {:?}: service={service} grace={grace}", ev.kind);
            }
            EventKind::EscalationCancelled => println!("[sub] escalation cancelled"),
            EventKind::ForceShutdown => println!("[sub] forced shutdown: service={service}"),

            // === Ignored ===
            EventKind::SubscriberPanicked | EventKind::SubscriberOverflow => {}
        }
    }

    fn name(&self) -> &'static str {
        "console"
    }

    fn queue_capacity(&self) -> usize {
        256
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let mut cfg = Config::new("flaky");
    cfg.run_interval = Duration::from_millis(200);
    cfg.log_level = LogLevel::Error;

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(ConsoleSubscriber)];
    let ctl = Controller::builder(cfg.with_os_signals(false))
        .with_subscribers(subs)
        .build();

    let attempts = Arc::new(AtomicU32::new(0));
    let hooks = Hooks::new().on_run(move || {
        let attempts = Arc::clone(&attempts);
        async move {
            let n = attempts.fetch_add(1, Ordering::SeqCst) + 1;
            println!("[flaky] iteration {n}");
            if n == 3 {
                return Err(CallbackError::fail("upstream unavailable"));
            }
            Ok(())
        }
    });

    if let Err(err) = ctl.start(hooks).await {
        println!("[main] start aborted: {} ({})", err.as_message(), err.as_label());
    }

    // Let the subscriber worker drain its queue.
    tokio::time::sleep(Duration::from_millis(100)).await;
    Ok(())
}
