//! Bounded, deduplicated history of successful analyses.
//!
//! Entries are kept most-recent-first, at most one per distinct input
//! string. The full list is written to the [`KeyValueStore`] on every
//! mutation; in-memory state only changes once that write succeeds.

use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::DEFAULT_HISTORY_CAPACITY;
use crate::error::StorageResult;
use crate::store::{KeyValueStore, HISTORY};
use crate::types::{AnalysisResult, GroundingSource, InputKind};

/// One stored analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: InputKind,
    pub input: String,
    #[serde(alias = "data")]
    pub result: AnalysisResult,
    #[serde(default)]
    pub grounding_chunks: Vec<GroundingSource>,
}

/// History of past analyses backed by a key-value store.
pub struct HistoryCache {
    store: Arc<dyn KeyValueStore>,
    entries: Vec<HistoryEntry>,
    capacity: usize,
}

impl HistoryCache {
    /// Load history from `store` with the default capacity.
    pub async fn load(store: Arc<dyn KeyValueStore>) -> StorageResult<Self> {
        Self::load_with_capacity(store, DEFAULT_HISTORY_CAPACITY).await
    }

    /// Load history from `store`, keeping at most `capacity` entries.
    ///
    /// Entries that cannot be read are skipped; if the stored value is not a
    /// JSON array at all, the cache starts empty.
    pub async fn load_with_capacity(
        store: Arc<dyn KeyValueStore>,
        capacity: usize,
    ) -> StorageResult<Self> {
        let capacity = capacity.max(1);
        let mut entries = match store.get(HISTORY).await? {
            Some(json) => parse_entries(&json),
            None => Vec::new(),
        };
        entries.truncate(capacity);

        debug!(entries = entries.len(), capacity, "History loaded");

        Ok(Self {
            store,
            entries,
            capacity,
        })
    }

    /// All entries, most recent first.
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the history is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries kept.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Record a successful analysis.
    ///
    /// Any entry with the same `input` (exact string match) is replaced,
    /// the new entry goes first and the oldest entries beyond capacity are
    /// dropped.
    pub async fn insert(
        &mut self,
        result: AnalysisResult,
        grounding_chunks: Vec<GroundingSource>,
        input: &str,
        kind: InputKind,
    ) -> StorageResult<&HistoryEntry> {
        let entry = HistoryEntry {
            id: Uuid::new_v4().to_string(),
            // Persisted with millisecond precision
            timestamp: Utc::now().trunc_subsecs(3),
            kind,
            input: input.to_string(),
            result,
            grounding_chunks,
        };

        let mut next = Vec::with_capacity(self.capacity);
        next.push(entry);
        next.extend(
            self.entries
                .iter()
                .filter(|e| e.input != input)
                .take(self.capacity - 1)
                .cloned(),
        );

        self.commit(next).await?;
        Ok(&self.entries[0])
    }

    /// Look up an entry by id.
    pub fn select(&self, id: &str) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Delete an entry by id. Returns whether an entry was removed.
    pub async fn delete(&mut self, id: &str) -> StorageResult<bool> {
        if self.select(id).is_none() {
            return Ok(false);
        }
        let next = self
            .entries
            .iter()
            .filter(|e| e.id != id)
            .cloned()
            .collect();
        self.commit(next).await?;
        Ok(true)
    }

    /// Remove every entry.
    pub async fn clear(&mut self) -> StorageResult<()> {
        self.commit(Vec::new()).await
    }

    async fn commit(&mut self, next: Vec<HistoryEntry>) -> StorageResult<()> {
        let json = serde_json::to_string(&next)?;
        self.store.set(HISTORY, &json).await?;
        self.entries = next;
        Ok(())
    }
}

/// Decode stored history one entry at a time, skipping unreadable entries.
fn parse_entries(json: &str) -> Vec<HistoryEntry> {
    let values = match serde_json::from_str::<Vec<serde_json::Value>>(json) {
        Ok(values) => values,
        Err(e) => {
            warn!(error = %e, "Stored history is unreadable, starting empty");
            return Vec::new();
        }
    };

    values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value(value) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(index, error = %e, "Skipping unreadable history entry");
                None
            }
        })
        .collect()
}
