//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait and the [`SubscriberSet`] fan-out
//! that feeds lifecycle events from the [`Bus`](crate::events::Bus) to user code.
//!
//! ## Architecture
//! ```text
//! Controller ── publish(Event) ──► Bus ──► fan-out listener ──► SubscriberSet::emit_arc
//!                                                                 │
//!                                                   ┌─────────────┼─────────────┐
//!                                                   ▼             ▼             ▼
//!                                              [queue S1]    [queue S2]    [queue SN]
//!                                                   │             │             │
//!                                              on_event()    on_event()    on_event()
//! ```
//!
//! The fan-out listener is spawned together with the interrupt listener on the
//! first `Controller::start`; building a controller never spawns anything.

mod set;
mod subscribe;

pub use set::SubscriberSet;
pub use subscribe::Subscribe;
