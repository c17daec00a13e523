//! # Example: basic_service
//!
//! Minimal service driven by a [`Controller`]: start once, tick until Ctrl-C,
//! stop once.
//!
//! Demonstrates how to:
//! - Configure grace period, run interval and verbosity with [`Config::with_timings`].
//! - Supply start/run/stop callbacks through [`Hooks`].
//! - Observe the forced-shutdown escalation when the stop callback is slow.
//!
//! ## Flow
//! ```text
//! Controller::start(hooks)
//!     ├─► [start] open "connection"
//!     ├─► loop { [run] tick; sleep(run_interval) }
//!     │        ▲
//!     │   Ctrl-C ─► listener: latch, stop(), arm 2s timer
//!     ├─► [stop] flush (takes 500ms, within grace)
//!     └─► Ok(())          ... 2s later: forced shutdown, exit(1)
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example basic_service
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use gracevisor::{CallbackError, Config, Controller, Hooks, LogLevel};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // 1. Configure the controller
    let cfg = Config::with_timings(
        "ticker",
        Duration::from_secs(2),
        Duration::from_millis(300),
        LogLevel::Info,
    );
    let ctl = Controller::with_config(cfg);

    // 2. Define the callbacks
    let ticks = Arc::new(AtomicU64::new(0));
    let hooks = {
        let ticks = Arc::clone(&ticks);
        Hooks::new()
            .on_start(|| async {
                println!("[ticker] connection opened");
                Ok::<_, CallbackError>(())
            })
            .on_run(move || {
                let ticks = Arc::clone(&ticks);
                async move {
                    let n = ticks.fetch_add(1, Ordering::Relaxed) + 1;
                    println!("[ticker] tick {n}");
                    Ok(())
                }
            })
            .on_stop(|| async {
                println!("[ticker] flushing...");
                tokio::time::sleep(Duration::from_millis(500)).await;
                println!("[ticker] flushed");
                Ok(())
            })
    };

    // 3. Run until interrupted; the process exits from the listener after the grace period
    println!("press Ctrl-C to stop");
    ctl.start(hooks).await?;
    println!("[main] start returned after {} ticks", ticks.load(Ordering::Relaxed));

    // Keep the runtime alive so the escalation timer can fire.
    tokio::time::sleep(Duration::from_secs(10)).await;
    Ok(())
}
