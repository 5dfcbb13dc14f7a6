use std::time::{Duration, Instant};

/// Monotonic stopwatch used for periodic pool refreshes.
///
/// Every query has an `_at` form taking an explicit `now` so callers (and tests) can
/// drive it with synthetic instants instead of sleeping.
#[derive(Debug, Copy, Clone)]
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self::started_at(Instant::now())
    }

    pub fn started_at(start: Instant) -> Self {
        Self { start }
    }

    /// Instant the timer was last (re)started.
    #[inline]
    pub fn start(&self) -> Instant {
        self.start
    }

    pub fn restart(&mut self) {
        self.restart_at(Instant::now());
    }

    pub fn restart_at(&mut self, now: Instant) {
        self.start = now;
    }

    /// Time since the last restart; zero if `now` is earlier than the start.
    #[inline]
    pub fn elapsed_at(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.start)
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.elapsed_at(Instant::now())
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
