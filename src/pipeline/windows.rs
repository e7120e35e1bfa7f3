//! Sliding time window for throughput estimation
//!
//! Timestamps are processing times read from a monotonic clock (offsets
//! since engine start), never event-declared times. Entries are appended at
//! the back and evicted from the front, so the queue stays chronological.

use std::collections::VecDeque;
use std::time::Duration;

/// Default trailing horizon for throughput
pub const DEFAULT_WINDOW_HORIZON: Duration = Duration::from_secs(60);

/// Trait for a single rolling time window
pub trait RollingWindow {
    /// Record a processing timestamp (must not precede the last one)
    fn push(&mut self, timestamp: Duration);

    /// Remove entries strictly older than `cutoff`
    fn evict_before(&mut self, cutoff: Duration);

    fn is_empty(&self) -> bool;

    fn len(&self) -> usize;
}

/// FIFO queue of processing timestamps over a trailing horizon
#[derive(Debug, Clone)]
pub struct ThroughputWindow {
    timestamps: VecDeque<Duration>,
    horizon: Duration,
}

impl ThroughputWindow {
    pub fn new(horizon: Duration) -> Self {
        Self {
            timestamps: VecDeque::with_capacity(1024),
            horizon,
        }
    }

    pub fn horizon(&self) -> Duration {
        self.horizon
    }

    /// Oldest timestamp still inside the horizon at `now`
    pub fn cutoff(&self, now: Duration) -> Duration {
        now.saturating_sub(self.horizon)
    }

    /// Push `now` and evict everything that fell out of the horizon
    pub fn record(&mut self, now: Duration) {
        self.push(now);
        self.evict_before(self.cutoff(now));
    }

    /// Entries within `[now - horizon, now]`, without evicting
    ///
    /// Entries that expired during an idle period are excluded even though
    /// they are only physically removed on the next `record`.
    pub fn count_at(&self, now: Duration) -> usize {
        let cutoff = self.cutoff(now);
        let expired = self.timestamps.partition_point(|ts| *ts < cutoff);
        self.timestamps.len() - expired
    }

    /// Events per second over the trailing horizon, evaluated at `now`
    pub fn rate_at(&self, now: Duration) -> f64 {
        let horizon_secs = self.horizon.as_secs_f64();
        if horizon_secs == 0.0 {
            return 0.0;
        }
        self.count_at(now) as f64 / horizon_secs
    }
}

impl Default for ThroughputWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_HORIZON)
    }
}

impl RollingWindow for ThroughputWindow {
    fn push(&mut self, timestamp: Duration) {
        debug_assert!(
            self.timestamps.back().map_or(true, |last| *last <= timestamp),
            "window timestamps must be non-decreasing"
        );
        self.timestamps.push_back(timestamp);
    }

    fn evict_before(&mut self, cutoff: Duration) {
        while let Some(front) = self.timestamps.front() {
            if *front < cutoff {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
    }

    fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    fn len(&self) -> usize {
        self.timestamps.len()
    }
}
