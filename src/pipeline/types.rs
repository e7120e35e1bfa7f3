//! Core data structures for the play aggregation pipeline
//!
//! - `PlayEvent` - one immutable play, produced outside the engine
//! - `CatalogEntry` / `Catalog` - the fixed, ordered set of trackable items
//! - `Domains` - categorical value lists used by producers

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A single play event
///
/// Produced externally (simulator, channel, file). The engine treats every
/// field as opaque and performs no validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayEvent {
    /// Opaque event identifier
    pub id: String,

    /// Catalog key this play refers to
    pub item_id: String,

    /// Listener / viewer identifier
    pub actor_id: String,

    /// Platform the play happened on (e.g., "Spotify")
    pub platform: String,

    /// Geographic region (e.g., "EU-West")
    pub region: String,

    /// Playback device (e.g., "iPhone")
    pub device: String,

    /// Event-declared arrival time (unix seconds)
    ///
    /// Carried for consumers only. The throughput window is keyed by
    /// processing time, never by this field.
    pub arrival_time: f64,

    /// Seconds actually played
    pub engaged_seconds: u32,

    /// Whether the play counts as a completion
    pub completed: bool,
}

/// Static catalog metadata for one item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub item_id: String,
    pub title: String,
    #[serde(default)]
    pub album: Option<String>,
    pub duration_secs: u32,
    #[serde(default)]
    pub release_year: Option<u16>,
}

impl CatalogEntry {
    pub fn new(item_id: &str, title: &str, duration_secs: u32) -> Self {
        Self {
            item_id: item_id.to_string(),
            title: title.to_string(),
            album: None,
            duration_secs,
            release_year: None,
        }
    }

    pub fn with_album(mut self, album: &str, release_year: u16) -> Self {
        self.album = Some(album.to_string());
        self.release_year = Some(release_year);
        self
    }
}

#[derive(Debug, PartialEq)]
pub enum CatalogError {
    Empty,
    DuplicateItem(String),
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::Empty => write!(f, "Catalog must contain at least one item"),
            CatalogError::DuplicateItem(id) => write!(f, "Duplicate catalog item: {}", id),
        }
    }
}

impl std::error::Error for CatalogError {}

/// Fixed, ordered catalog of items
///
/// Declaration order is significant: the leaderboard uses it to break ties.
/// The key set never changes after construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Result<Self, CatalogError> {
        if entries.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = HashSet::with_capacity(entries.len());
        for entry in &entries {
            if !seen.insert(entry.item_id.as_str()) {
                return Err(CatalogError::DuplicateItem(entry.item_id.clone()));
            }
        }

        Ok(Self { entries })
    }

    /// Load a catalog from a JSON array of entries
    pub fn from_json(json: &str) -> Result<Self, crate::pipeline::config::ConfigError> {
        let entries: Vec<CatalogEntry> = serde_json::from_str(json)?;
        Ok(Self::new(entries)?)
    }

    /// Entries in declaration order
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn get(&self, item_id: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.item_id == item_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Categorical value lists with sampling weights
///
/// Only producers consume these; the engine accepts any string value.
#[derive(Debug, Clone, PartialEq)]
pub struct Domains {
    pub platforms: Vec<String>,
    pub regions: Vec<(String, f64)>,
    pub devices: Vec<(String, f64)>,
}

impl Default for Domains {
    fn default() -> Self {
        let owned = |values: &[&str]| values.iter().map(|v| v.to_string()).collect::<Vec<_>>();
        let weighted = |values: &[(&str, f64)]| {
            values
                .iter()
                .map(|(v, w)| (v.to_string(), *w))
                .collect::<Vec<_>>()
        };

        Self {
            platforms: owned(&["Apple Music", "Spotify", "YouTube Music", "Amazon Music", "Tidal"]),
            regions: weighted(&[
                ("US-West", 0.30),
                ("US-East", 0.25),
                ("US-Central", 0.15),
                ("EU-West", 0.15),
                ("APAC", 0.10),
                ("LATAM", 0.05),
            ]),
            devices: weighted(&[
                ("iPhone", 0.38),
                ("iPad", 0.12),
                ("Mac", 0.18),
                ("Android", 0.22),
                ("Smart TV", 0.05),
                ("Web", 0.05),
            ]),
        }
    }
}
