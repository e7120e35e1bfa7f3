//! # Play Aggregation Pipeline
//!
//! In-memory aggregation of play events over a fixed catalog:
//! - Per-item statistics (volume, distinct actors, completion rate,
//!   average engagement, top platform/region)
//! - Global sliding-window throughput
//! - Leaderboard and summary projections
//!
//! ## Architecture
//!
//! ```text
//! Producer → mpsc channel → start_ingestion (single writer)
//!     ↓
//! AggregationEngine::process
//!     ↓
//! ItemAggregate::ingest + ThroughputWindow::record
//!     ↓
//! top_items / summary / throughput / snapshots → report, export
//! ```
//!
//! ## Module Organization
//!
//! - `types` - PlayEvent, Catalog, Domains
//! - `aggregate` - ItemAggregate, CategoryTally, ItemSnapshot
//! - `windows` - RollingWindow trait and ThroughputWindow
//! - `engine` - AggregationEngine, Summary
//! - `cardinality` - HyperLogLog (opt-in approximate distinct actors)
//! - `anomaly` - throughput spike detection
//! - `ingestion` - async channel processor
//! - `config` - environment configuration

pub mod aggregate;
pub mod anomaly;
pub mod cardinality;
pub mod config;
pub mod engine;
pub mod ingestion;
pub mod types;
pub mod windows;

// Re-export commonly used types
pub use aggregate::{CategoryTally, ItemAggregate, ItemSnapshot};
pub use anomaly::{SpikeDetector, ThroughputSpike};
pub use cardinality::HyperLogLog;
pub use config::{ConfigError, EngineConfig, PipelineConfig};
pub use engine::{AggregationEngine, LeaderboardEntry, Summary};
pub use ingestion::{start_ingestion, IngestMessage, IngestionReport};
pub use types::{Catalog, CatalogEntry, CatalogError, Domains, PlayEvent};
pub use windows::{RollingWindow, ThroughputWindow};
