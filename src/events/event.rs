//! # Lifecycle events emitted by the controller.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Lifecycle events**: start, stop and restart transitions of the service
//! - **Misuse events**: calls the controller tolerated but refused (double start, idle stop)
//! - **Interrupt events**: signal observed, escalation armed/disarmed/fired
//! - **Subscriber events**: problems delivering events to subscribers
//!
//! The [`Event`] struct carries additional metadata such as timestamps, service
//! name, phase and reason. Events are published regardless of the configured
//! [`LogLevel`](crate::LogLevel); the level only gates `tracing` diagnostics.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use gracevisor::{Event, EventKind, Phase};
//!
//! let ev = Event::new(EventKind::CallbackFailed)
//!     .with_service("svc")
//!     .with_phase(Phase::Run)
//!     .with_reason("boom");
//!
//! assert_eq!(ev.kind, EventKind::CallbackFailed);
//! assert_eq!(ev.service.as_deref(), Some("svc"));
//! assert_eq!(ev.phase, Some(Phase::Run));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::callbacks::Phase;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Lifecycle events ===
    /// A `start` call took ownership of the controller.
    ///
    /// Sets: `service`
    ServiceStarting,

    /// A `start` call completed gracefully (stop phase done).
    ///
    /// Sets: `service`
    ServiceStopped,

    /// A callback returned an error; `start` aborted.
    ///
    /// Sets: `service`, `phase`, `reason`
    CallbackFailed,

    /// The running flag was cleared by `stop`.
    ///
    /// Sets: `service`
    StopRequested,

    /// `restart` was called and will re-enter `start` once the previous one unwinds.
    ///
    /// Sets: `service`
    RestartRequested,

    // === Misuse events ===
    /// `start` was called while another `start` was in flight.
    ///
    /// Sets: `service`
    StartRejected,

    /// `stop` was called while not running.
    ///
    /// Sets: `service`
    StopRejected,

    /// `restart` was refused because an interrupt was latched.
    ///
    /// Sets: `service`
    RestartRefused,

    // === Interrupt events ===
    /// An interrupt (OS signal or `Controller::interrupt`) was observed.
    ///
    /// Sets: `service`, `grace_ms`
    InterruptReceived,

    /// The forced-shutdown timer was disarmed by a clean stop.
    ///
    /// Sets: `service`, `grace_ms`
    EscalationCancelled,

    /// The grace period elapsed; the force-shutdown path runs next.
    ///
    /// Sets: `service`, `grace_ms`, `phase` (`ForceShutdown` when a user callback handles it)
    GraceExceeded,

    /// The controller is about to terminate the process.
    ///
    /// Sets: `service`
    ForceShutdown,

    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets: `service` (subscriber name), `reason`
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `service` (subscriber name), `reason`
    SubscriberOverflow,
}

/// Lifecycle event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Service (or subscriber) name, if applicable.
    pub service: Option<Arc<str>>,
    /// Lifecycle phase, if applicable.
    pub phase: Option<Phase>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Graceful-shutdown timeout in milliseconds (compact).
    pub grace_ms: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            service: None,
            phase: None,
            reason: None,
            grace_ms: None,
        }
    }

    /// Attaches a service name.
    #[inline]
    pub fn with_service(mut self, service: impl Into<Arc<str>>) -> Self {
        self.service = Some(service.into());
        self
    }

    /// Attaches a lifecycle phase.
    #[inline]
    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.phase = Some(phase);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches the grace period (stored as milliseconds).
    #[inline]
    pub fn with_grace(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.grace_ms = Some(ms);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_service(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_service(subscriber)
            .with_reason(info)
    }

    #[inline]
    pub fn is_subscriber_event(&self) -> bool {
        matches!(
            self.kind,
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked
        )
    }
}
