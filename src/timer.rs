use std::time::Instant;

/// Monotonic stopwatch used to measure phase progress.
///
/// Elapsed time is always recomputed as `now - start`, never accumulated
/// incrementally, so querying it many times per second cannot drift.
#[derive(Debug, Clone, Copy)]
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Seconds (fractional) since `start()`. Unaffected by wall-clock changes.
    pub fn elapsed(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}
