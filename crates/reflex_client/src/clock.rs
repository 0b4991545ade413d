//! Runtime clock.
//!
//! Wall time anchored once, then advanced by tokio's monotonic clock. Under
//! `tokio::time::pause()` it moves exactly as far as the paused runtime,
//! which keeps reveal timers and reaction timing consistent in tests.

use reflex_shared::{Clock, SystemClock};
use tokio::time::Instant;

/// Epoch-millisecond clock driven by `tokio::time::Instant`.
#[derive(Clone, Copy, Debug)]
pub struct TokioClock {
    base_ms: u64,
    start: Instant,
}

impl TokioClock {
    /// Anchors at the current wall time.
    #[must_use]
    pub fn new() -> Self {
        Self::anchored_at(SystemClock.now_ms())
    }

    /// Anchors at a fixed epoch time.
    #[must_use]
    pub fn anchored_at(base_ms: u64) -> Self {
        Self {
            base_ms,
            start: Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioClock {
    fn now_ms(&self) -> u64 {
        let elapsed = u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.base_ms.saturating_add(elapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_follows_paused_time() {
        let clock = TokioClock::anchored_at(1_000);
        tokio::time::advance(Duration::from_millis(2_500)).await;
        assert_eq!(clock.now_ms(), 3_500);
    }
}
