use std::sync::Arc;

use thiserror::Error;

use crate::{
    store::{BlobStore, StoreError},
    types::TrackRecord,
};

const TRACK_PREFIX: &str = "tracks/";
const TRACK_SUFFIX: &str = ".json";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("track record is not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Enriched track records, one blob per track id.
///
/// The presence of `tracks/{track_id}.json` is the cache; records are
/// created once and never rewritten.
#[derive(Clone)]
pub struct TrackCacheManager {
    store: Arc<dyn BlobStore>,
}

impl TrackCacheManager {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    pub fn key_for(track_id: &str) -> String {
        format!("{TRACK_PREFIX}{track_id}{TRACK_SUFFIX}")
    }

    pub async fn contains(&self, track_id: &str) -> Result<bool, CacheError> {
        Ok(self.store.exists(&Self::key_for(track_id)).await?)
    }

    pub async fn load(&self, track_id: &str) -> Result<Option<TrackRecord>, CacheError> {
        match self.store.read_text(&Self::key_for(track_id)).await? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Stores `record` unless a record for the same track already exists.
    /// Returns `false` when it did.
    pub async fn insert_new(&self, record: &TrackRecord) -> Result<bool, CacheError> {
        let json = serde_json::to_string_pretty(record)?;
        Ok(self
            .store
            .compare_and_swap(&Self::key_for(&record.track_id), None, &json)
            .await?)
    }

    pub async fn track_ids(&self) -> Result<Vec<String>, CacheError> {
        let keys = self.store.list(TRACK_PREFIX).await?;
        Ok(keys
            .iter()
            .filter_map(|key| {
                key.strip_prefix(TRACK_PREFIX)?
                    .strip_suffix(TRACK_SUFFIX)
                    .filter(|id| !id.is_empty() && !id.contains('/'))
                    .map(str::to_string)
            })
            .collect())
    }

    pub async fn load_all(&self) -> Result<Vec<TrackRecord>, CacheError> {
        let mut records = Vec::new();
        for track_id in self.track_ids().await? {
            if let Some(record) = self.load(&track_id).await? {
                records.push(record);
            }
        }
        Ok(records)
    }
}
