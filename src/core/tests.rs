use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{Instant, sleep, timeout};

use crate::{
    BoxCallbackFuture, CallbackError, CallbackFn, Config, Controller, ControllerError, EscalationPolicy,
    Event, EventKind, Hooks, LogLevel, Phase, Subscribe,
};

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// Controller with OS signals disabled and a terminator that records exit codes.
fn controller(cfg: Config) -> (Arc<Controller>, Arc<Mutex<Vec<(i32, Instant)>>>) {
    let exits = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&exits);
    let ctl = Controller::builder(cfg.with_os_signals(false))
        .with_terminator(move |code| recorded.lock().unwrap().push((code, Instant::now())))
        .build();
    (ctl, exits)
}

fn svc(grace: Duration) -> Config {
    let mut cfg = Config::new("svc");
    cfg.grace = grace;
    cfg
}

/// Callback that increments `counter`, optionally after sleeping.
fn tick(
    counter: &Arc<AtomicU32>,
    work: Duration,
) -> impl Fn() -> BoxCallbackFuture + Send + Sync + use<> {
    let counter = Arc::clone(counter);
    move || -> BoxCallbackFuture {
        let counter = Arc::clone(&counter);
        Box::pin(async move {
            if !work.is_zero() {
                sleep(work).await;
            }
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<(), CallbackError>(())
        })
    }
}

/// Callback that records the instant of its invocation.
fn stamp(
    at: &Arc<Mutex<Option<Instant>>>,
) -> impl Fn() -> BoxCallbackFuture + Send + Sync + use<> {
    let at = Arc::clone(at);
    move || -> BoxCallbackFuture {
        *at.lock().unwrap() = Some(Instant::now());
        Box::pin(async { Ok::<(), CallbackError>(()) })
    }
}

fn drain(rx: &mut tokio::sync::broadcast::Receiver<Event>) -> Vec<EventKind> {
    let mut kinds = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        kinds.push(ev.kind);
    }
    kinds
}

#[tokio::test(start_paused = true)]
async fn test_start_without_hooks_completes() {
    let (ctl, exits) = controller(svc(ms(100)));

    ctl.start(Hooks::new()).await.unwrap();

    let st = ctl.status();
    assert!(!st.initialized);
    assert!(!st.running);
    assert!(st.can_restart);
    assert!(!ctl.is_running());
    assert!(exits.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_start_runs_one_loop() {
    let (ctl, _exits) = controller(svc(ms(100)));
    let starts = Arc::new(AtomicU32::new(0));
    let active = Arc::new(AtomicU32::new(0));
    let peak = Arc::new(AtomicU32::new(0));

    let hooks = {
        let (active, peak) = (Arc::clone(&active), Arc::clone(&peak));
        Hooks::new().on_start(tick(&starts, Duration::ZERO)).on_run(move || {
            let (active, peak) = (Arc::clone(&active), Arc::clone(&peak));
            async move {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                sleep(ms(5)).await;
                active.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            }
        })
    };

    let mut rx = ctl.subscribe();
    let first = tokio::spawn({
        let (ctl, hooks) = (Arc::clone(&ctl), hooks.clone());
        async move { ctl.start(hooks).await }
    });
    sleep(ms(12)).await;

    // Rejected immediately, without entering a second loop.
    timeout(ms(1), ctl.start(hooks)).await.unwrap().unwrap();
    assert!(drain(&mut rx).contains(&EventKind::StartRejected));

    ctl.stop().unwrap();
    first.await.unwrap().unwrap();
    assert_eq!(starts.load(Ordering::SeqCst), 1);
    assert_eq!(peak.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_stop_before_start_depends_on_verbosity() {
    let (ctl, _exits) = controller(svc(ms(100)));
    let before = ctl.status();

    let err = ctl.stop().unwrap_err();
    assert!(matches!(err, ControllerError::NotRunning { ref service } if service == "svc"));

    ctl.set_log_level(LogLevel::Error);
    ctl.stop().unwrap();
    ctl.set_log_level(LogLevel::None);
    ctl.stop().unwrap();

    assert_eq!(ctl.status(), before);
}

#[tokio::test(start_paused = true)]
async fn test_stop_lets_current_iteration_finish() {
    let (ctl, _exits) = controller(svc(ms(100)));
    let runs = Arc::new(AtomicU32::new(0));

    let handle = tokio::spawn({
        let ctl = Arc::clone(&ctl);
        let hooks = Hooks::new().on_run(tick(&runs, ms(10)));
        async move { ctl.start(hooks).await }
    });

    sleep(ms(25)).await;
    assert!(ctl.is_running());
    let at_stop = runs.load(Ordering::SeqCst);
    ctl.stop().unwrap();
    assert!(!ctl.is_running());

    handle.await.unwrap().unwrap();
    let after = runs.load(Ordering::SeqCst);
    assert!(after - at_stop <= 1, "at_stop={at_stop} after={after}");
}

#[tokio::test(start_paused = true)]
async fn test_graceful_stop_scenario() {
    let (ctl, exits) = controller(svc(ms(200)));
    let runs = Arc::new(AtomicU32::new(0));
    let forced = Arc::new(AtomicU32::new(0));

    let handle = tokio::spawn({
        let ctl = Arc::clone(&ctl);
        let hooks = Hooks::new()
            .on_run(tick(&runs, ms(10)))
            .on_force_shutdown(tick(&forced, Duration::ZERO));
        async move { ctl.start(hooks).await }
    });

    sleep(ms(50)).await;
    ctl.stop().unwrap();

    let res = timeout(ms(100), handle).await.expect("start should return within 100ms");
    res.unwrap().unwrap();
    assert!(runs.load(Ordering::SeqCst) >= 4);

    sleep(ms(500)).await;
    assert_eq!(forced.load(Ordering::SeqCst), 0);
    assert!(exits.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_run_error_skips_stop() {
    let (ctl, _exits) = controller(svc(ms(100)));
    let starts = Arc::new(AtomicU32::new(0));
    let stops = Arc::new(AtomicU32::new(0));
    let mut rx = ctl.subscribe();

    let hooks = Hooks::new()
        .on_start(tick(&starts, Duration::ZERO))
        .on_run(|| async { Err(CallbackError::fail("boom")) })
        .on_stop(tick(&stops, Duration::ZERO));

    let err = ctl.start(hooks.clone()).await.unwrap_err();
    match err {
        ControllerError::Callback { phase, ref source } => {
            assert_eq!(phase, Phase::Run);
            assert_eq!(*source, CallbackError::fail("boom"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(stops.load(Ordering::SeqCst), 0);

    let failed: Vec<Event> = std::iter::from_fn(|| rx.try_recv().ok())
        .filter(|e| e.kind == EventKind::CallbackFailed)
        .collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].phase, Some(Phase::Run));

    // A failed controller stays initialized and rejects further starts.
    assert!(ctl.status().initialized);
    assert!(!ctl.is_running());
    ctl.start(hooks).await.unwrap();
    assert_eq!(starts.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_start_error_aborts_before_run() {
    let (ctl, _exits) = controller(svc(ms(100)));
    let runs = Arc::new(AtomicU32::new(0));

    let hooks = Hooks::new()
        .on_start(|| async { Err(CallbackError::fatal("no config")) })
        .on_run(tick(&runs, Duration::ZERO));

    let err = ctl.start(hooks).await.unwrap_err();
    assert_eq!(err.as_label(), "controller_callback_failed");
    assert!(err.callback_error().is_some_and(CallbackError::is_fatal));
    assert_eq!(runs.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_restart_replays_stored_hooks() {
    let (ctl, _exits) = controller(svc(ms(100)));
    let starts = Arc::new(AtomicU32::new(0));
    let runs = Arc::new(AtomicU32::new(0));

    let first = tokio::spawn({
        let ctl = Arc::clone(&ctl);
        let hooks = Hooks::new()
            .on_start(tick(&starts, Duration::ZERO))
            .on_run(tick(&runs, ms(5)));
        async move { ctl.start(hooks).await }
    });
    sleep(ms(20)).await;
    assert_eq!(starts.load(Ordering::SeqCst), 1);

    let second = tokio::spawn({
        let ctl = Arc::clone(&ctl);
        async move { ctl.restart().await }
    });

    // The first lifecycle unwinds, then restart re-enters with the same hooks.
    first.await.unwrap().unwrap();
    sleep(ms(20)).await;
    assert_eq!(starts.load(Ordering::SeqCst), 2);
    assert!(ctl.is_running());

    let runs_before = runs.load(Ordering::SeqCst);
    sleep(ms(20)).await;
    assert!(runs.load(Ordering::SeqCst) > runs_before);

    ctl.stop().unwrap();
    second.await.unwrap().unwrap();
    assert!(ctl.status().can_restart);
}

#[tokio::test(start_paused = true)]
async fn test_restart_after_interrupt_is_refused() {
    let (ctl, _exits) = controller(svc(ms(30)));
    let starts = Arc::new(AtomicU32::new(0));

    let handle = tokio::spawn({
        let ctl = Arc::clone(&ctl);
        let hooks = Hooks::new()
            .on_start(tick(&starts, Duration::ZERO))
            .on_run(tick(&Arc::new(AtomicU32::new(0)), ms(1)));
        async move { ctl.start(hooks).await }
    });
    sleep(ms(5)).await;

    ctl.interrupt();
    handle.await.unwrap().unwrap();
    assert!(ctl.status().interrupted);

    let err = ctl.restart().await.unwrap_err();
    assert!(matches!(err, ControllerError::RestartRefused { .. }));
    assert_eq!(starts.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_pending_restart_is_refused_by_interrupt() {
    let (ctl, _exits) = controller(svc(ms(30)));

    // A failed lifecycle never becomes restartable.
    let hooks = Hooks::new().on_run(|| async { Err(CallbackError::fail("boom")) });
    ctl.start(hooks).await.unwrap_err();

    let pending = tokio::spawn({
        let ctl = Arc::clone(&ctl);
        async move { ctl.restart().await }
    });
    sleep(ms(50)).await;
    assert!(!pending.is_finished());

    ctl.interrupt();
    let err = timeout(ms(5), pending).await.unwrap().unwrap().unwrap_err();
    assert!(matches!(err, ControllerError::RestartRefused { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_interrupt_escalates_to_termination() {
    let (ctl, exits) = controller(svc(ms(50)));
    let stopped_at = Arc::new(Mutex::new(None));
    let mut rx = ctl.subscribe();

    let handle = tokio::spawn({
        let ctl = Arc::clone(&ctl);
        let hooks = Hooks::new()
            .on_run(tick(&Arc::new(AtomicU32::new(0)), ms(1)))
            .on_stop(stamp(&stopped_at));
        async move { ctl.start(hooks).await }
    });
    sleep(ms(10)).await;

    let interrupted_at = Instant::now();
    ctl.interrupt();

    // The graceful path completes first; the armed timer still fires afterwards.
    handle.await.unwrap().unwrap();
    let stopped = stopped_at.lock().unwrap().expect("stop callback should run");
    assert!(stopped - interrupted_at <= ms(10));

    sleep(ms(60)).await;
    let exits = exits.lock().unwrap().clone();
    assert_eq!(exits.len(), 1);
    let (code, at) = exits[0];
    assert_eq!(code, 1);
    assert!(at - interrupted_at >= ms(50));
    assert!(at - interrupted_at <= ms(60));

    let kinds = drain(&mut rx);
    let pos = |k| kinds.iter().position(|x| *x == k).unwrap();
    assert!(pos(EventKind::InterruptReceived) < pos(EventKind::StopRequested));
    assert!(pos(EventKind::ServiceStopped) < pos(EventKind::GraceExceeded));
    assert!(pos(EventKind::GraceExceeded) < pos(EventKind::ForceShutdown));
}

#[tokio::test(start_paused = true)]
async fn test_custom_force_shutdown_replaces_termination() {
    let (ctl, exits) = controller(svc(ms(20)).with_exit_code(3));
    let forced = Arc::new(AtomicU32::new(0));

    let handle = tokio::spawn({
        let ctl = Arc::clone(&ctl);
        let hooks = Hooks::new()
            .on_run(tick(&Arc::new(AtomicU32::new(0)), ms(1)))
            .with_force_shutdown(CallbackFn::arc(tick(&forced, Duration::ZERO)));
        async move { ctl.start(hooks).await }
    });
    sleep(ms(5)).await;
    ctl.interrupt();
    handle.await.unwrap().unwrap();

    sleep(ms(30)).await;
    assert_eq!(forced.load(Ordering::SeqCst), 1);
    assert!(exits.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_clean_stop_disarms_escalation_when_configured() {
    let cfg = svc(ms(50)).with_escalation(EscalationPolicy::CancelOnCleanStop);
    let (ctl, exits) = controller(cfg);
    let mut rx = ctl.subscribe();

    let handle = tokio::spawn({
        let ctl = Arc::clone(&ctl);
        let hooks = Hooks::new().on_run(tick(&Arc::new(AtomicU32::new(0)), ms(1)));
        async move { ctl.start(hooks).await }
    });
    sleep(ms(5)).await;
    ctl.interrupt();
    handle.await.unwrap().unwrap();

    sleep(ms(100)).await;
    assert!(exits.lock().unwrap().is_empty());
    let kinds = drain(&mut rx);
    assert!(kinds.contains(&EventKind::EscalationCancelled));
    assert!(!kinds.contains(&EventKind::GraceExceeded));
}

#[tokio::test(start_paused = true)]
async fn test_slow_stop_still_escalates_when_disarm_configured() {
    let cfg = svc(ms(50)).with_escalation(EscalationPolicy::CancelOnCleanStop);
    let (ctl, exits) = controller(cfg);

    let handle = tokio::spawn({
        let ctl = Arc::clone(&ctl);
        let hooks = Hooks::new()
            .on_run(tick(&Arc::new(AtomicU32::new(0)), ms(1)))
            .on_stop(tick(&Arc::new(AtomicU32::new(0)), ms(500)));
        async move { ctl.start(hooks).await }
    });
    sleep(ms(5)).await;
    ctl.interrupt();

    sleep(ms(60)).await;
    assert_eq!(exits.lock().unwrap().len(), 1);
    assert!(!handle.is_finished());
}

#[tokio::test(start_paused = true)]
async fn test_stop_cannot_preempt_blocking_run() {
    let (ctl, _exits) = controller(svc(ms(1000)));
    let release = Arc::new(AtomicBool::new(false));

    let handle = tokio::spawn({
        let ctl = Arc::clone(&ctl);
        let release = Arc::clone(&release);
        let hooks = Hooks::new().on_run(move || {
            let release = Arc::clone(&release);
            async move {
                while !release.load(Ordering::SeqCst) {
                    sleep(ms(1)).await;
                }
                Ok(())
            }
        });
        async move { ctl.start(hooks).await }
    });
    sleep(ms(10)).await;

    ctl.stop().unwrap();
    sleep(ms(100)).await;
    assert!(!handle.is_finished(), "stop is cooperative");

    release.store(true, Ordering::SeqCst);
    timeout(ms(5), handle).await.unwrap().unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_run_interval_pauses_and_wakes_on_stop() {
    let mut cfg = svc(ms(100));
    cfg.run_interval = ms(20);
    let (ctl, _exits) = controller(cfg);
    let runs = Arc::new(AtomicU32::new(0));

    let handle = tokio::spawn({
        let ctl = Arc::clone(&ctl);
        let hooks = Hooks::new().on_run(tick(&runs, Duration::ZERO));
        async move { ctl.start(hooks).await }
    });
    sleep(ms(50)).await;
    // Iterations at 0, 20 and 40ms.
    assert_eq!(runs.load(Ordering::SeqCst), 3);

    ctl.set_run_interval(Duration::from_secs(60));
    sleep(ms(20)).await;
    let before = runs.load(Ordering::SeqCst);

    let stopped_at = Instant::now();
    ctl.stop().unwrap();
    handle.await.unwrap().unwrap();
    assert!(Instant::now() - stopped_at < ms(1));
    assert_eq!(runs.load(Ordering::SeqCst), before);
}

#[tokio::test(start_paused = true)]
async fn test_force_shutdown_propagates_stop_error() {
    let (ctl, exits) = controller(svc(ms(100)));

    let err = ctl.force_shutdown().unwrap_err();
    assert!(matches!(err, ControllerError::NotRunning { .. }));
    assert!(exits.lock().unwrap().is_empty());

    // Below Warn an idle stop is not an error, so termination proceeds.
    ctl.set_log_level(LogLevel::Error);
    ctl.force_shutdown().unwrap();
    assert_eq!(exits.lock().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_listener_does_not_keep_controller_alive() {
    let (ctl, _exits) = controller(svc(ms(100)));
    ctl.start(Hooks::new()).await.unwrap();
    ctl.start(Hooks::new()).await.unwrap();
    sleep(ms(1)).await;
    assert_eq!(Arc::strong_count(&ctl), 1);
}

struct Recorder {
    seen: Arc<Mutex<Vec<EventKind>>>,
}

#[async_trait]
impl Subscribe for Recorder {
    async fn on_event(&self, ev: &Event) {
        self.seen.lock().unwrap().push(ev.kind);
    }
    fn name(&self) -> &'static str {
        "recorder"
    }
}

#[tokio::test(start_paused = true)]
async fn test_subscribers_receive_lifecycle_events() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let ctl = Controller::builder(svc(ms(100)).with_os_signals(false))
        .with_subscribers(vec![Arc::new(Recorder {
            seen: Arc::clone(&seen),
        }) as Arc<dyn Subscribe>])
        .with_terminator(|_| {})
        .build();

    let handle = tokio::spawn({
        let ctl = Arc::clone(&ctl);
        let hooks = Hooks::new().on_run(tick(&Arc::new(AtomicU32::new(0)), ms(5)));
        async move { ctl.start(hooks).await }
    });
    sleep(ms(12)).await;
    ctl.stop().unwrap();
    handle.await.unwrap().unwrap();
    sleep(ms(5)).await;

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            EventKind::ServiceStarting,
            EventKind::StopRequested,
            EventKind::ServiceStopped,
        ]
    );
}

struct AlwaysPanics {
    calls: Arc<AtomicU32>,
}

#[async_trait]
impl Subscribe for AlwaysPanics {
    async fn on_event(&self, _ev: &Event) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        panic!("always");
    }
    fn name(&self) -> &'static str {
        "always-panics"
    }
}

#[tokio::test(start_paused = true)]
async fn test_panicking_subscriber_does_not_feed_itself() {
    let calls = Arc::new(AtomicU32::new(0));
    let ctl = Controller::builder(svc(ms(100)).with_os_signals(false))
        .with_subscribers(vec![Arc::new(AlwaysPanics {
            calls: Arc::clone(&calls),
        }) as Arc<dyn Subscribe>])
        .with_terminator(|_| {})
        .build();
    let mut rx = ctl.subscribe();

    ctl.start(Hooks::new()).await.unwrap();
    sleep(ms(200)).await;

    // ServiceStarting and ServiceStopped, then one report of each panic.
    assert_eq!(calls.load(Ordering::SeqCst), 4);
    sleep(ms(200)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 4);

    let panics = drain(&mut rx)
        .into_iter()
        .filter(|k| *k == EventKind::SubscriberPanicked)
        .count();
    assert_eq!(panics, 2);
}

#[tokio::test(start_paused = true)]
async fn test_interrupt_before_start_latches_immediately() {
    let (ctl, _exits) = controller(svc(ms(30)));
    let runs = Arc::new(AtomicU32::new(0));

    ctl.interrupt();
    assert!(ctl.status().interrupted);

    let err = ctl.restart().await.unwrap_err();
    assert!(matches!(err, ControllerError::RestartRefused { .. }));

    // The pending interrupt stops the first start after its current iteration.
    let hooks = Hooks::new().on_run(tick(&runs, ms(5)));
    timeout(ms(20), ctl.start(hooks)).await.unwrap().unwrap();
    assert!(runs.load(Ordering::SeqCst) <= 1);
}

#[tokio::test(start_paused = true)]
async fn test_interrupt_while_idle_arms_nothing() {
    let cfg = svc(ms(50)).with_escalation(EscalationPolicy::CancelOnCleanStop);
    let (ctl, exits) = controller(cfg);
    let mut rx = ctl.subscribe();

    ctl.start(Hooks::new()).await.unwrap();
    ctl.interrupt();
    sleep(ms(100)).await;

    let kinds = drain(&mut rx);
    assert!(kinds.contains(&EventKind::InterruptReceived));
    assert!(!kinds.contains(&EventKind::EscalationCancelled));
    assert!(!kinds.contains(&EventKind::GraceExceeded));
    assert!(exits.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_settings_are_read_live() {
    let (ctl, _exits) = controller(svc(ms(100)));

    ctl.set_grace(ms(7));
    ctl.set_run_interval(ms(3));
    ctl.set_log_level(LogLevel::Warn);

    assert_eq!(ctl.grace(), ms(7));
    assert_eq!(ctl.run_interval(), ms(3));
    assert_eq!(ctl.log_level(), LogLevel::Warn);
    assert_eq!(ctl.config().grace, ms(7));
    assert_eq!(ctl.name(), "svc");
}
