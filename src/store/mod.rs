//! Key-value blob storage.
//!
//! Both the enriched track cache and the API usage ledger live in a blob
//! store addressed by slash-separated string keys such as
//! `tracks/{track_id}.json` or `api_usage/rapidapi.json`. The store only
//! deals in text; callers own the (JSON) encoding.
//!
//! Two backends are provided:
//!
//! - [`FsBlobStore`] keeps one file per key below `<root>/<bucket>/`,
//!   normally inside the local data directory.
//! - [`MemoryBlobStore`] keeps everything in a map and counts writes, which
//!   is what the tests use to prove that nothing was (re)written.

mod fs;
mod memory;

use async_trait::async_trait;
use thiserror::Error;

pub use fs::FsBlobStore;
pub use memory::MemoryBlobStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("blob store I/O error for '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid blob key '{0}'")]
    InvalidKey(String),
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// Returns `None` when no blob is stored under `key`.
    async fn read_text(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Unconditionally replaces whatever is stored under `key`.
    async fn write_text(&self, key: &str, body: &str) -> Result<(), StoreError>;

    /// Writes `body` only if the blob currently equals `expected`
    /// (`None` meaning "absent"). Returns whether the write happened.
    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&str>,
        body: &str,
    ) -> Result<bool, StoreError>;

    /// All keys starting with `prefix`, sorted.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError>;
}

/// Rejects keys that could escape the bucket or that don't name a blob.
pub(crate) fn validate_key(key: &str) -> Result<(), StoreError> {
    let bad = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..");

    if bad {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}
