use std::sync::Arc;

use super::controller::{Controller, Terminator};
use crate::{config::Config, subscribers::Subscribe};

/// Builder for constructing a [`Controller`] with optional features.
///
/// Building never spawns tasks; subscriber workers and the interrupt listener
/// start with the first `start`.
pub struct ControllerBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
    terminator: Option<Terminator>,
}

impl ControllerBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            terminator: None,
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive lifecycle events through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Replaces the process exit performed by forced shutdown.
    ///
    /// The closure receives `Config::exit_code`. If it returns, so does
    /// `Controller::force_shutdown`.
    pub fn with_terminator<F>(mut self, f: F) -> Self
    where
        F: Fn(i32) + Send + Sync + 'static,
    {
        self.terminator = Some(Arc::new(f));
        self
    }

    /// Builds and returns the controller.
    pub fn build(self) -> Arc<Controller> {
        let terminator = self
            .terminator
            .unwrap_or_else(|| Arc::new(exit_process) as Terminator);
        Arc::new(Controller::new_internal(
            self.cfg,
            self.subscribers,
            terminator,
        ))
    }
}

fn exit_process(code: i32) {
    std::process::exit(code)
}
