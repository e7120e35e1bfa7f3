//! playflow - streaming play analytics over a fixed catalog
//!
//! - `pipeline` - aggregation engine, throughput window, ingestion
//! - `simulation` - seeded synthetic event producer
//! - `report` - console rendering
//! - `export` - JSON snapshot export

pub mod export;
pub mod pipeline;
pub mod report;
pub mod simulation;
