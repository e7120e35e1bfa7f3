//! Pipeline configuration from environment variables

use super::cardinality::{MAX_PRECISION, MIN_PRECISION};
use super::types::{Catalog, CatalogError};
use super::windows::DEFAULT_WINDOW_HORIZON;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug)]
pub enum ConfigError {
    InvalidValue(String),
    Catalog(CatalogError),
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl From<CatalogError> for ConfigError {
    fn from(err: CatalogError) -> Self {
        ConfigError::Catalog(err)
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue(msg) => write!(f, "Invalid configuration value: {}", msg),
            ConfigError::Catalog(e) => write!(f, "Invalid catalog: {}", e),
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Catalog parse error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Engine-facing configuration
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Trailing horizon of the throughput window
    pub window_horizon: Duration,

    /// HyperLogLog precision for approximate distinct actors (None = off)
    pub approx_distinct_precision: Option<u8>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window_horizon: DEFAULT_WINDOW_HORIZON,
            approx_distinct_precision: None,
        }
    }
}

/// Configuration for the pipeline runtime
///
/// Loaded from environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Throughput window horizon in seconds
    pub window_horizon_secs: u64,

    /// Channel buffer size for event ingestion
    pub channel_buffer: usize,

    /// Seed for the synthetic event producer
    pub producer_seed: u64,

    /// Where the JSON snapshot is written
    pub export_path: String,

    /// Static label stamped on the snapshot
    pub export_label: String,

    /// Optional JSON catalog file (built-in demo catalog when unset)
    pub catalog_path: Option<String>,

    /// HyperLogLog precision, unset disables the sketch
    pub approx_distinct_precision: Option<u8>,

    /// Throughput spike threshold as a multiple of the rolling average
    pub spike_factor: f64,

    /// How often ingestion samples throughput and logs its rate
    pub report_interval_ms: u64,
}

impl PipelineConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `WINDOW_HORIZON_SECS` (default: 60)
    /// - `CHANNEL_BUFFER` (default: 10000)
    /// - `PRODUCER_SEED` (default: 7)
    /// - `EXPORT_PATH` (default: playflow_snapshot.json)
    /// - `EXPORT_LABEL` (default: Julia Wolf)
    /// - `CATALOG_PATH` (default: unset, built-in catalog)
    /// - `APPROX_DISTINCT_PRECISION` (default: unset, 4..=16 when set)
    /// - `SPIKE_FACTOR` (default: 3.0)
    /// - `REPORT_INTERVAL_MS` (default: 1000)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let window_horizon_secs = parse_var(&lookup, "WINDOW_HORIZON_SECS", 60u64)?;
        if window_horizon_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "WINDOW_HORIZON_SECS must be greater than 0".to_string(),
            ));
        }

        let channel_buffer = parse_var(&lookup, "CHANNEL_BUFFER", 10_000usize)?;
        if channel_buffer == 0 {
            return Err(ConfigError::InvalidValue(
                "CHANNEL_BUFFER must be greater than 0".to_string(),
            ));
        }

        let approx_distinct_precision = match lookup("APPROX_DISTINCT_PRECISION") {
            Some(raw) => {
                let precision: u8 = raw.trim().parse().map_err(|_| {
                    ConfigError::InvalidValue(format!("APPROX_DISTINCT_PRECISION: '{}'", raw))
                })?;
                if !(MIN_PRECISION..=MAX_PRECISION).contains(&precision) {
                    return Err(ConfigError::InvalidValue(format!(
                        "APPROX_DISTINCT_PRECISION must be {}..={}, got {}",
                        MIN_PRECISION, MAX_PRECISION, precision
                    )));
                }
                Some(precision)
            }
            None => None,
        };

        let spike_factor = parse_var(&lookup, "SPIKE_FACTOR", 3.0f64)?;
        if spike_factor.is_nan() || spike_factor <= 1.0 {
            return Err(ConfigError::InvalidValue(
                "SPIKE_FACTOR must be greater than 1.0".to_string(),
            ));
        }

        Ok(Self {
            window_horizon_secs,
            channel_buffer,
            producer_seed: parse_var(&lookup, "PRODUCER_SEED", 7u64)?,
            export_path: lookup("EXPORT_PATH")
                .unwrap_or_else(|| "playflow_snapshot.json".to_string()),
            export_label: lookup("EXPORT_LABEL").unwrap_or_else(|| "Julia Wolf".to_string()),
            catalog_path: lookup("CATALOG_PATH").filter(|p| !p.trim().is_empty()),
            approx_distinct_precision,
            spike_factor,
            report_interval_ms: parse_var(&lookup, "REPORT_INTERVAL_MS", 1_000u64)?,
        })
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            window_horizon: Duration::from_secs(self.window_horizon_secs),
            approx_distinct_precision: self.approx_distinct_precision,
        }
    }

    /// Catalog from `CATALOG_PATH`, or the built-in demo catalog
    pub fn load_catalog(&self) -> Result<Catalog, ConfigError> {
        match &self.catalog_path {
            Some(path) => {
                let json = std::fs::read_to_string(path)?;
                let catalog = Catalog::from_json(&json)?;
                log::info!("Loaded {} catalog items from {}", catalog.len(), path);
                Ok(catalog)
            }
            None => Ok(crate::simulation::demo_catalog()?),
        }
    }
}

fn parse_var<F, T>(lookup: &F, name: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(format!("{}: '{}'", name, raw))),
        None => Ok(default),
    }
}
