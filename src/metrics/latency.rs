//! Latency recording for analyzer invocations

use std::future::Future;
use std::time::{Duration, Instant};

/// Wall-clock timer in whole milliseconds
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    started: Instant,
}

impl Stopwatch {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        duration_ms(self.started.elapsed())
    }
}

/// Whole milliseconds, saturating at `u64::MAX`
pub fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Await `fut` and report how long it took
pub async fn timed<F: Future>(fut: F) -> (F::Output, u64) {
    let watch = Stopwatch::start();
    let out = fut.await;
    (out, watch.elapsed_ms())
}
