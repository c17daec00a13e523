use std::fmt;

/// Lifecycle phase a callback belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Invoked once when `start` begins.
    Start,
    /// Invoked repeatedly while the service is running.
    Run,
    /// Invoked once after the run loop exits.
    Stop,
    /// Invoked by the interrupt listener when the grace period elapses.
    ForceShutdown,
}

impl Phase {
    /// Returns a short stable label (snake_case).
    pub fn as_label(self) -> &'static str {
        match self {
            Phase::Start => "start",
            Phase::Run => "run",
            Phase::Stop => "stop",
            Phase::ForceShutdown => "force_shutdown",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}
