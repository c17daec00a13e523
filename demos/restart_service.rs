//! # Example: restart_service
//!
//! Restarting a running service with the hooks it was started with, then
//! handling a forced shutdown with a custom callback instead of exiting.
//!
//! Demonstrates how to:
//! - Spawn [`Controller::start`] so the caller keeps control.
//! - Call [`Controller::restart`] from another task.
//! - Replace the default process exit with a `force_shutdown` callback.
//! - Trigger the interrupt path programmatically with [`Controller::interrupt`].
//!
//! ## Flow
//! ```text
//! spawn start(hooks) ──► [start] [run]...
//! restart() ──► stop() ──► previous start returns ──► [start] [run]... (same hooks)
//! interrupt() ──► stop() ──► [stop] hangs ──► grace (1s) ──► [force_shutdown]
//! restart() ──► Err(RestartRefused)
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example restart_service
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use gracevisor::{CallbackError, Config, Controller, ControllerError, Hooks, LogLevel};
use tokio::sync::Notify;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "debug".into()),
        )
        .init();

    let cfg = Config::with_timings(
        "worker",
        Duration::from_secs(1),
        Duration::from_millis(200),
        LogLevel::All,
    )
    .with_os_signals(false);
    let ctl = Controller::with_config(cfg);

    let generation = Arc::new(AtomicU32::new(0));
    let stops = Arc::new(AtomicU32::new(0));
    let forced = Arc::new(Notify::new());

    let hooks = {
        let (generation, stops, forced) =
            (Arc::clone(&generation), Arc::clone(&stops), Arc::clone(&forced));
        let run_gen = Arc::clone(&generation);
        Hooks::new()
            .on_start(move || {
                let generation = Arc::clone(&generation);
                async move {
                    let g = generation.fetch_add(1, Ordering::SeqCst) + 1;
                    println!("[worker] start (generation {g})");
                    Ok::<_, CallbackError>(())
                }
            })
            .on_run(move || {
                let g = run_gen.load(Ordering::SeqCst);
                async move {
                    println!("[worker] working (generation {g})");
                    Ok(())
                }
            })
            .on_stop(move || {
                let stops = Arc::clone(&stops);
                async move {
                    // The second stop never finishes, so the grace period runs out.
                    if stops.fetch_add(1, Ordering::SeqCst) >= 1 {
                        println!("[worker] stop hangs");
                        std::future::pending::<()>().await;
                    }
                    println!("[worker] stopped");
                    Ok(())
                }
            })
            .on_force_shutdown(move || {
                let forced = Arc::clone(&forced);
                async move {
                    println!("[worker] forced shutdown: releasing resources");
                    forced.notify_one();
                    Ok(())
                }
            })
    };

    // 1. First lifecycle
    let first = tokio::spawn({
        let ctl = Arc::clone(&ctl);
        async move { ctl.start(hooks).await }
    });
    tokio::time::sleep(Duration::from_millis(700)).await;

    // 2. Restart: resolves only when the second lifecycle ends
    let second = tokio::spawn({
        let ctl = Arc::clone(&ctl);
        async move { ctl.restart().await }
    });
    first.await??;
    println!("[main] first lifecycle returned");
    tokio::time::sleep(Duration::from_millis(700)).await;

    // 3. Interrupt: the hanging stop callback triggers the force-shutdown callback
    ctl.interrupt();
    forced.notified().await;
    println!("[main] status after escalation: {:?}", ctl.status());

    // 4. Restarts are refused once interrupted
    match ctl.restart().await {
        Err(err @ ControllerError::RestartRefused { .. }) => {
            println!("[main] {}: {}", err.as_label(), err.as_message());
        }
        other => println!("[main] unexpected restart result: {other:?}"),
    }

    second.abort();
    Ok(())
}
