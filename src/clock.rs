//! Session elapsed time and its display format.

use std::time::{Duration, Instant};

/// Wall-clock timer for one drill session.
#[derive(Debug, Clone, Copy)]
pub struct SessionClock {
    started: Instant,
}

impl SessionClock {
    pub fn start() -> SessionClock {
        SessionClock {
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn restart(&mut self) {
        self.started = Instant::now();
    }
}

/// Formats a duration as `MM:SS:mmm`. Minutes widen past two digits
/// instead of wrapping.
pub fn format_clock(elapsed: Duration) -> String {
    let total = elapsed.as_millis();
    let mins = total / 60_000;
    let secs = (total % 60_000) / 1_000;
    let millis = total % 1_000;
    format!("{mins:02}:{secs:02}:{millis:03}")
}
