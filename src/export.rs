//! JSON snapshot export
//!
//! A snapshot carries the summary plus the public view of every item in
//! leaderboard order. Internal aggregate state is never serialized.

use crate::pipeline::aggregate::ItemSnapshot;
use crate::pipeline::engine::{AggregationEngine, Summary};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug)]
pub enum ExportError {
    Io(std::io::Error),
    Serialization(serde_json::Error),
}

impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        ExportError::Io(err)
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(err: serde_json::Error) -> Self {
        ExportError::Serialization(err)
    }
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::Io(e) => write!(f, "IO error: {}", e),
            ExportError::Serialization(e) => write!(f, "Serialization error: {}", e),
        }
    }
}

impl std::error::Error for ExportError {}

/// Exported engine state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// RFC 3339 UTC timestamp
    pub generated_at: String,
    pub label: String,
    pub summary: Summary,
    pub items: Vec<ItemSnapshot>,
}

impl Snapshot {
    pub fn capture(engine: &AggregationEngine, label: &str) -> Self {
        Self {
            generated_at: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            label: label.to_string(),
            summary: engine.summary(),
            items: engine.snapshots(),
        }
    }
}

/// Backend trait for writing snapshots
#[async_trait]
pub trait SnapshotWriter: Send {
    async fn write_snapshot(&mut self, snapshot: &Snapshot) -> Result<(), ExportError>;

    /// Get backend type for logging
    fn backend_type(&self) -> &'static str;
}

/// Writes each snapshot as pretty-printed JSON, replacing the file
pub struct JsonFileWriter {
    path: PathBuf,
}

impl JsonFileWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

#[async_trait]
impl SnapshotWriter for JsonFileWriter {
    async fn write_snapshot(&mut self, snapshot: &Snapshot) -> Result<(), ExportError> {
        let json = serde_json::to_string_pretty(snapshot)?;
        tokio::fs::write(&self.path, json).await?;

        log::info!(
            "📁 Snapshot exported ({} items) → {}",
            snapshot.items.len(),
            self.path.display()
        );
        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "JSON"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::config::EngineConfig;
    use crate::pipeline::types::{Catalog, CatalogEntry, PlayEvent};

    fn make_engine() -> AggregationEngine {
        let catalog = Catalog::new(vec![
            CatalogEntry::new("a", "Alpha", 100),
            CatalogEntry::new("b", "Beta", 100),
        ])
        .unwrap();
        let mut engine = AggregationEngine::new(catalog, EngineConfig::default());
        engine.process(&PlayEvent {
            id: "e1".to_string(),
            item_id: "b".to_string(),
            actor_id: "u1".to_string(),
            platform: "Tidal".to_string(),
            region: "LATAM".to_string(),
            device: "Web".to_string(),
            arrival_time: 0.0,
            engaged_seconds: 80,
            completed: true,
        });
        engine
    }

    #[test]
    fn test_capture() {
        let snapshot = Snapshot::capture(&make_engine(), "Label");

        assert_eq!(snapshot.label, "Label");
        assert_eq!(snapshot.summary.total_processed, 1);
        assert_eq!(snapshot.items.len(), 2);
        assert_eq!(snapshot.items[0].item_id, "b");
        assert!(chrono::DateTime::parse_from_rfc3339(&snapshot.generated_at).is_ok());
    }

    #[test]
    fn test_snapshot_json_excludes_internal_fields() {
        let snapshot = Snapshot::capture(&make_engine(), "Label");
        let value = serde_json::to_value(&snapshot).unwrap();

        let item = value["items"][0].as_object().unwrap();
        let mut keys: Vec<&str> = item.keys().map(|k| k.as_str()).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec![
                "avg_engagement",
                "completion_rate",
                "distinct_actors",
                "item_id",
                "title",
                "top_platform",
                "top_region",
                "total_count",
            ]
        );
        assert_eq!(value["summary"]["top_3_by_count"][0]["title"], "Beta");
    }

    #[tokio::test]
    async fn test_json_file_writer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        let mut writer = JsonFileWriter::new(&path);

        let snapshot = Snapshot::capture(&make_engine(), "Label");
        writer.write_snapshot(&snapshot).await.unwrap();

        let written: Snapshot =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, snapshot);
        assert_eq!(writer.backend_type(), "JSON");
    }

    #[tokio::test]
    async fn test_json_file_writer_bad_path() {
        let mut writer = JsonFileWriter::new("/nonexistent-dir/snapshot.json");
        let snapshot = Snapshot::capture(&make_engine(), "Label");

        assert!(matches!(
            writer.write_snapshot(&snapshot).await,
            Err(ExportError::Io(_))
        ));
    }
}
