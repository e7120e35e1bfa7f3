//! Per-item incremental statistics
//!
//! `ItemAggregate` owns every running counter for one catalog item. All
//! derived fields are recomputed inside `ingest`, so they are always a pure
//! function of the internal counters at the last update.

use super::cardinality::HyperLogLog;
use super::types::{CatalogEntry, PlayEvent};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Running tally for one categorical dimension (platform, region)
///
/// Tracks the current leader explicitly. A challenger replaces the leader
/// only with a strictly greater count, so the value that first reached the
/// maximum keeps it on ties.
#[derive(Debug, Clone, Default)]
pub struct CategoryTally {
    counts: HashMap<String, u64>,
    leader: Option<(String, u64)>,
}

impl CategoryTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, value: &str) {
        let count = self.counts.entry(value.to_string()).or_insert(0);
        *count += 1;
        let count = *count;

        match &mut self.leader {
            Some((leader, leader_count)) => {
                if leader == value {
                    *leader_count = count;
                } else if count > *leader_count {
                    *leader = value.to_string();
                    *leader_count = count;
                }
            }
            None => self.leader = Some((value.to_string(), count)),
        }
    }

    /// Current leader, `None` before the first record
    pub fn leader(&self) -> Option<&str> {
        self.leader.as_ref().map(|(value, _)| value.as_str())
    }

    pub fn count(&self, value: &str) -> u64 {
        self.counts.get(value).copied().unwrap_or(0)
    }
}

/// Aggregated statistics for one catalog item
#[derive(Debug, Clone)]
pub struct ItemAggregate {
    item_id: String,
    title: String,

    total_count: u64,
    distinct_actors: u64,
    completion_rate: f64,
    avg_engagement: f64,
    top_platform: String,
    top_region: String,

    // Internal-only state (never exported)
    actors: HashSet<String>,
    engaged_total: u64,
    completions: u64,
    platforms: CategoryTally,
    regions: CategoryTally,
    actor_sketch: Option<HyperLogLog>,
}

impl ItemAggregate {
    pub fn new(entry: &CatalogEntry) -> Self {
        Self {
            item_id: entry.item_id.clone(),
            title: entry.title.clone(),
            total_count: 0,
            distinct_actors: 0,
            completion_rate: 0.0,
            avg_engagement: 0.0,
            top_platform: String::new(),
            top_region: String::new(),
            actors: HashSet::new(),
            engaged_total: 0,
            completions: 0,
            platforms: CategoryTally::new(),
            regions: CategoryTally::new(),
            actor_sketch: None,
        }
    }

    /// Also maintain an approximate distinct-actor sketch
    pub fn with_actor_sketch(mut self, precision: u8) -> Self {
        self.actor_sketch = Some(HyperLogLog::new(precision));
        self
    }

    /// Apply one play event
    ///
    /// The caller routes events by `item_id`; this method does not check it.
    /// Not idempotent: replaying an event counts it twice.
    pub fn ingest(&mut self, event: &PlayEvent) {
        self.total_count += 1;

        if !self.actors.contains(&event.actor_id) {
            self.actors.insert(event.actor_id.clone());
        }
        self.distinct_actors = self.actors.len() as u64;
        if let Some(sketch) = self.actor_sketch.as_mut() {
            sketch.insert(event.actor_id.as_str());
        }

        self.engaged_total += u64::from(event.engaged_seconds);
        self.avg_engagement = self.engaged_total as f64 / self.total_count as f64;

        if event.completed {
            self.completions += 1;
        }
        self.completion_rate = completion_rate(self.completions, self.total_count);

        self.platforms.record(&event.platform);
        if let Some(leader) = self.platforms.leader() {
            if leader != self.top_platform {
                self.top_platform = leader.to_string();
            }
        }

        self.regions.record(&event.region);
        if let Some(leader) = self.regions.leader() {
            if leader != self.top_region {
                self.top_region = leader.to_string();
            }
        }
    }

    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    pub fn distinct_actors(&self) -> u64 {
        self.distinct_actors
    }

    /// Completion percentage, one decimal place
    pub fn completion_rate(&self) -> f64 {
        self.completion_rate
    }

    /// Mean engaged seconds per play
    pub fn avg_engagement(&self) -> f64 {
        self.avg_engagement
    }

    /// Empty until the first event is ingested
    pub fn top_platform(&self) -> &str {
        &self.top_platform
    }

    /// Empty until the first event is ingested
    pub fn top_region(&self) -> &str {
        &self.top_region
    }

    /// HyperLogLog estimate, when the sketch is enabled
    pub fn approx_distinct_actors(&self) -> Option<u64> {
        self.actor_sketch.as_ref().map(HyperLogLog::estimate)
    }

    pub fn snapshot(&self) -> ItemSnapshot {
        ItemSnapshot {
            item_id: self.item_id.clone(),
            title: self.title.clone(),
            total_count: self.total_count,
            distinct_actors: self.distinct_actors,
            completion_rate: self.completion_rate,
            avg_engagement: self.avg_engagement,
            top_platform: self.top_platform.clone(),
            top_region: self.top_region.clone(),
        }
    }
}

/// Public view of an `ItemAggregate`
///
/// Carries only consumer-facing fields; actor sets and raw counters stay
/// inside the aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSnapshot {
    pub item_id: String,
    pub title: String,
    pub total_count: u64,
    pub distinct_actors: u64,
    pub completion_rate: f64,
    pub avg_engagement: f64,
    pub top_platform: String,
    pub top_region: String,
}

/// `completions / total * 100`, rounded to one decimal, half away from zero
///
/// Computed in integer tenths of a percent so halfway cases are exact
/// (1/16 -> 6.3, not 6.2).
pub fn completion_rate(completions: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let tenths = (completions * 2_000 + total) / (2 * total);
    tenths as f64 / 10.0
}
