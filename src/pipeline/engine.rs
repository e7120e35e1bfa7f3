//! Aggregation engine - per-item statistics plus global throughput
//!
//! ```text
//! PlayEvent
//!     ↓
//! AggregationEngine::process()
//!     ↓ (unknown item -> dropped_events)
//! ItemAggregate::ingest()
//!     ↓
//! ThroughputWindow::record()
//!     ↓
//! top_items() / summary() / throughput() / snapshots()
//! ```
//!
//! Single-writer: every mutation goes through `process`. Shared use wraps
//! the engine in `Arc<Mutex<_>>` (see `ingestion`).

use super::aggregate::{ItemAggregate, ItemSnapshot};
use super::config::EngineConfig;
use super::types::{Catalog, PlayEvent};
use super::windows::{RollingWindow, ThroughputWindow};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Number of leaders included in `summary()`
pub const SUMMARY_TOP_N: usize = 3;

/// Monotonic clock returning elapsed time since engine start
pub type ClockFn = Box<dyn Fn() -> Duration + Send + Sync>;

/// One leaderboard row in `Summary`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub item_id: String,
    pub title: String,
    pub total_count: u64,
}

/// Read-side projection of engine state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_processed: u64,
    pub distinct_items_with_traffic: usize,
    /// Events per second over the window horizon, two decimals
    pub throughput: f64,
    pub top_3_by_count: Vec<LeaderboardEntry>,
    pub dropped_events: u64,
}

/// Aggregation engine over a fixed catalog
pub struct AggregationEngine {
    catalog: Catalog,

    /// One aggregate per catalog item, in declaration order
    aggregates: Vec<ItemAggregate>,

    /// item_id -> position in `aggregates`
    index: HashMap<String, usize>,

    /// Processing-time throughput window
    window: ThroughputWindow,

    total_processed: u64,

    /// Events addressed to items outside the catalog
    dropped_events: u64,

    /// Monotonic clock (injectable for tests)
    now_fn: ClockFn,
}

impl AggregationEngine {
    /// Create an engine using a monotonic clock started now
    pub fn new(catalog: Catalog, config: EngineConfig) -> Self {
        let started = Instant::now();
        Self::new_with_clock(catalog, config, Box::new(move || started.elapsed()))
    }

    /// Create an engine with a custom clock
    ///
    /// Used for testing with deterministic timestamps. The clock must never
    /// go backwards.
    pub fn new_with_clock(catalog: Catalog, config: EngineConfig, now_fn: ClockFn) -> Self {
        let aggregates: Vec<ItemAggregate> = catalog
            .entries()
            .iter()
            .map(|entry| {
                let aggregate = ItemAggregate::new(entry);
                match config.approx_distinct_precision {
                    Some(precision) => aggregate.with_actor_sketch(precision),
                    None => aggregate,
                }
            })
            .collect();

        let index = aggregates
            .iter()
            .enumerate()
            .map(|(i, agg)| (agg.item_id().to_string(), i))
            .collect();

        Self {
            catalog,
            aggregates,
            index,
            window: ThroughputWindow::new(config.window_horizon),
            total_processed: 0,
            dropped_events: 0,
            now_fn,
        }
    }

    /// Process a single play event
    ///
    /// Events for unknown items change nothing but `dropped_events`.
    pub fn process(&mut self, event: &PlayEvent) {
        let Some(&position) = self.index.get(&event.item_id) else {
            self.dropped_events += 1;
            log::debug!(
                "Dropping event {} for unknown item {}",
                event.id,
                event.item_id
            );
            return;
        };

        self.aggregates[position].ingest(event);
        self.total_processed += 1;

        let now = (self.now_fn)();
        self.window.record(now);
    }

    /// Process events in order; same as calling `process` for each
    pub fn process_batch<'a, I>(&mut self, events: I)
    where
        I: IntoIterator<Item = &'a PlayEvent>,
    {
        for event in events {
            self.process(event);
        }
    }

    /// Events per second over the trailing horizon, evaluated now
    pub fn throughput(&self) -> f64 {
        self.window.rate_at((self.now_fn)())
    }

    /// The `n` busiest items, descending by `total_count`
    ///
    /// Ties keep catalog declaration order.
    pub fn top_items(&self, n: usize) -> Vec<&ItemAggregate> {
        let mut ranked: Vec<&ItemAggregate> = self.aggregates.iter().collect();
        // sort_by is stable
        ranked.sort_by(|a, b| b.total_count().cmp(&a.total_count()));
        ranked.truncate(n);
        ranked
    }

    pub fn summary(&self) -> Summary {
        Summary {
            total_processed: self.total_processed,
            distinct_items_with_traffic: self
                .aggregates
                .iter()
                .filter(|agg| agg.total_count() > 0)
                .count(),
            throughput: (self.throughput() * 100.0).round() / 100.0,
            top_3_by_count: self
                .top_items(SUMMARY_TOP_N)
                .into_iter()
                .map(|agg| LeaderboardEntry {
                    item_id: agg.item_id().to_string(),
                    title: agg.title().to_string(),
                    total_count: agg.total_count(),
                })
                .collect(),
            dropped_events: self.dropped_events,
        }
    }

    /// Public snapshots of every item, in leaderboard order
    pub fn snapshots(&self) -> Vec<ItemSnapshot> {
        self.top_items(self.aggregates.len())
            .into_iter()
            .map(ItemAggregate::snapshot)
            .collect()
    }

    pub fn aggregate(&self, item_id: &str) -> Option<&ItemAggregate> {
        self.index.get(item_id).map(|&i| &self.aggregates[i])
    }

    /// All aggregates in catalog declaration order
    pub fn aggregates(&self) -> &[ItemAggregate] {
        &self.aggregates
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn total_processed(&self) -> u64 {
        self.total_processed
    }

    pub fn dropped_events(&self) -> u64 {
        self.dropped_events
    }

    /// Raw window length (includes entries not yet lazily evicted)
    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    pub fn window_horizon(&self) -> Duration {
        self.window.horizon()
    }
}
