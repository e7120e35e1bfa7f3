//! Throughput spike detection
//!
//! Compares each throughput sample against the rolling average of the
//! preceding samples. A sample above `factor` times that average is a spike.

use serde::Serialize;
use std::collections::VecDeque;

pub const DEFAULT_SPIKE_FACTOR: f64 = 3.0;
pub const DEFAULT_HISTORY_LEN: usize = 30;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThroughputSpike {
    /// Sampled throughput (events/sec)
    pub observed: f64,
    /// Rolling average the sample was compared against
    pub baseline: f64,
}

pub struct SpikeDetector {
    factor: f64,
    history: VecDeque<f64>,
    max_history: usize,
}

impl SpikeDetector {
    pub fn new(factor: f64, max_history: usize) -> Self {
        Self {
            factor,
            history: VecDeque::with_capacity(max_history),
            max_history: max_history.max(1),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_SPIKE_FACTOR, DEFAULT_HISTORY_LEN)
    }

    /// Rolling average of recorded samples, `None` while empty
    pub fn baseline(&self) -> Option<f64> {
        if self.history.is_empty() {
            return None;
        }
        Some(self.history.iter().sum::<f64>() / self.history.len() as f64)
    }

    /// Record a sample, returning a spike if it exceeds the baseline
    ///
    /// No spike is reported until there is a non-zero baseline.
    pub fn observe(&mut self, throughput: f64) -> Option<ThroughputSpike> {
        let spike = match self.baseline() {
            Some(baseline) if baseline > 0.0 && throughput > self.factor * baseline => {
                Some(ThroughputSpike {
                    observed: throughput,
                    baseline,
                })
            }
            _ => None,
        };

        self.history.push_back(throughput);
        if self.history.len() > self.max_history {
            self.history.pop_front();
        }

        spike
    }
}
