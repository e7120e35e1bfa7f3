//! Synthetic play event producer
//!
//! Generates well-formed `PlayEvent`s over a catalog with weighted item
//! popularity. Seeded, so runs are reproducible apart from `arrival_time`.

use crate::pipeline::types::{Catalog, CatalogEntry, CatalogError, Domains, PlayEvent};
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::Beta;

/// Simulated listener population
pub const DEFAULT_ACTOR_POOL: usize = 5_000;

/// Fraction of the duration that counts as a completed play
pub const COMPLETION_THRESHOLD: f64 = 0.70;

/// Minimum engaged seconds for any generated play
pub const MIN_ENGAGED_SECS: u32 = 10;

/// Seconds between consecutive events of a batch
const BATCH_SPACING_SECS: f64 = 0.1;

#[derive(Debug)]
pub enum ProducerError {
    WeightCount { expected: usize, got: usize },
    InvalidWeights(String),
    EmptyDomain(&'static str),
    Distribution(String),
}

impl std::fmt::Display for ProducerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProducerError::WeightCount { expected, got } => {
                write!(f, "Expected {} item weights, got {}", expected, got)
            }
            ProducerError::InvalidWeights(msg) => write!(f, "Invalid weights: {}", msg),
            ProducerError::EmptyDomain(name) => write!(f, "Domain '{}' has no values", name),
            ProducerError::Distribution(msg) => write!(f, "Distribution error: {}", msg),
        }
    }
}

impl std::error::Error for ProducerError {}

impl From<rand::distributions::WeightedError> for ProducerError {
    fn from(err: rand::distributions::WeightedError) -> Self {
        ProducerError::InvalidWeights(err.to_string())
    }
}

/// Built-in ten-track demo catalog
pub fn demo_catalog() -> Result<Catalog, CatalogError> {
    Catalog::new(vec![
        CatalogEntry::new("jw-001", "In My Room", 183).with_album("In My Room (Single)", 2024),
        CatalogEntry::new("jw-002", "Last Summer", 172).with_album("Last Summer (Single)", 2024),
        CatalogEntry::new("jw-003", "Kill You Off", 148).with_album("PRESSURE", 2025),
        CatalogEntry::new("jw-004", "Pearl", 141).with_album("PRESSURE", 2025),
        CatalogEntry::new("jw-005", "Loser", 167).with_album("PRESSURE", 2025),
        CatalogEntry::new("jw-006", "Fingernails", 144).with_album("PRESSURE", 2025),
        CatalogEntry::new("jw-007", "Limewire", 158).with_album("PRESSURE", 2025),
        CatalogEntry::new("jw-008", "Jennifer's Body", 153).with_album("PRESSURE", 2025),
        CatalogEntry::new("jw-009", "Sunshine State", 176).with_album("PRESSURE", 2025),
        CatalogEntry::new("jw-010", "You've Lost A Lot of Blood", 182).with_album("PRESSURE", 2025),
    ])
}

/// Popularity weights matching `demo_catalog` order
pub fn demo_weights() -> Vec<f64> {
    vec![0.24, 0.10, 0.13, 0.11, 0.12, 0.09, 0.08, 0.06, 0.04, 0.03]
}

/// Item weights for an arbitrary catalog: demo weights when the catalog is
/// the demo one, uniform otherwise
pub fn weights_for(catalog: &Catalog) -> Vec<f64> {
    match demo_catalog() {
        Ok(demo) if demo == *catalog => demo_weights(),
        _ => vec![1.0; catalog.len()],
    }
}

/// Seeded generator of play events
pub struct EventProducer {
    rng: StdRng,
    catalog: Catalog,
    items: WeightedIndex<f64>,
    domains: Domains,
    regions: WeightedIndex<f64>,
    devices: WeightedIndex<f64>,
    actors: Vec<String>,
    listen_fraction: Beta<f64>,
}

impl EventProducer {
    pub fn new(
        catalog: Catalog,
        item_weights: &[f64],
        domains: Domains,
        seed: u64,
    ) -> Result<Self, ProducerError> {
        Self::with_actor_pool(catalog, item_weights, domains, seed, DEFAULT_ACTOR_POOL)
    }

    pub fn with_actor_pool(
        catalog: Catalog,
        item_weights: &[f64],
        domains: Domains,
        seed: u64,
        actor_pool: usize,
    ) -> Result<Self, ProducerError> {
        if item_weights.len() != catalog.len() {
            return Err(ProducerError::WeightCount {
                expected: catalog.len(),
                got: item_weights.len(),
            });
        }
        if domains.platforms.is_empty() {
            return Err(ProducerError::EmptyDomain("platforms"));
        }
        if actor_pool == 0 {
            return Err(ProducerError::EmptyDomain("actors"));
        }

        let items = WeightedIndex::new(item_weights)?;
        let regions = WeightedIndex::new(domains.regions.iter().map(|(_, w)| *w))?;
        let devices = WeightedIndex::new(domains.devices.iter().map(|(_, w)| *w))?;
        let listen_fraction =
            Beta::new(5.0, 2.0).map_err(|e| ProducerError::Distribution(e.to_string()))?;

        let actors = (1..=actor_pool).map(|i| format!("user_{:05}", i)).collect();

        Ok(Self {
            rng: StdRng::seed_from_u64(seed),
            catalog,
            items,
            domains,
            regions,
            devices,
            actors,
            listen_fraction,
        })
    }

    /// Emit one event, `offset_secs` after the current wall-clock time
    pub fn emit(&mut self, offset_secs: f64) -> PlayEvent {
        let entry = &self.catalog.entries()[self.items.sample(&mut self.rng)];
        let duration = entry.duration_secs;

        let fraction: f64 = self.listen_fraction.sample(&mut self.rng);
        let engaged_seconds = ((fraction * duration as f64) as u32)
            .max(MIN_ENGAGED_SECS)
            .min(duration);
        let completed = engaged_seconds as f64 >= COMPLETION_THRESHOLD * duration as f64;

        let id_bytes: [u8; 6] = self.rng.gen();
        let actor = &self.actors[self.rng.gen_range(0..self.actors.len())];
        let platform =
            &self.domains.platforms[self.rng.gen_range(0..self.domains.platforms.len())];
        let region = &self.domains.regions[self.regions.sample(&mut self.rng)].0;
        let device = &self.domains.devices[self.devices.sample(&mut self.rng)].0;

        let now = chrono::Utc::now().timestamp_millis() as f64 / 1_000.0;

        PlayEvent {
            id: hex::encode(id_bytes),
            item_id: entry.item_id.clone(),
            actor_id: actor.clone(),
            platform: platform.clone(),
            region: region.clone(),
            device: device.clone(),
            arrival_time: now + offset_secs,
            engaged_seconds,
            completed,
        }
    }

    /// Emit `n` events spaced 0.1s apart
    pub fn batch(&mut self, n: usize) -> Vec<PlayEvent> {
        (0..n)
            .map(|i| self.emit(i as f64 * BATCH_SPACING_SECS))
            .collect()
    }
}
