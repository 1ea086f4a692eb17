//! Elapsed-time source for `uptime`

use std::time::{Duration, Instant};

/// Anything that can say how long the shell has been running
pub trait Clock {
    fn elapsed(&self) -> Duration;
}

/// Wall clock started when the shell starts
#[derive(Debug, Clone, Copy)]
pub struct ProcessClock {
    started: Instant,
}

impl ProcessClock {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl Default for ProcessClock {
    fn default() -> Self {
        Self::start()
    }
}

impl Clock for ProcessClock {
    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// A clock that never moves
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub Duration);

impl Clock for FixedClock {
    fn elapsed(&self) -> Duration {
        self.0
    }
}

/// `N hours, M minutes, S seconds`
pub fn format_uptime(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{} hours, {} minutes, {} seconds", hours, minutes, seconds)
}
