use std::{
    collections::BTreeMap,
    sync::atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{BlobStore, StoreError, validate_key};

#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<BTreeMap<String, String>>,
    writes: AtomicUsize,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful writes since creation. Seeding with
    /// [`MemoryBlobStore::insert`] is not counted.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub async fn insert(&self, key: impl Into<String>, body: impl Into<String>) {
        self.blobs.lock().await.insert(key.into(), body.into());
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        self.blobs.lock().await.get(key).cloned()
    }

    pub async fn len(&self) -> usize {
        self.blobs.lock().await.len()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        validate_key(key)?;
        Ok(self.blobs.lock().await.contains_key(key))
    }

    async fn read_text(&self, key: &str) -> Result<Option<String>, StoreError> {
        validate_key(key)?;
        Ok(self.blobs.lock().await.get(key).cloned())
    }

    async fn write_text(&self, key: &str, body: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        self.blobs
            .lock()
            .await
            .insert(key.to_string(), body.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&str>,
        body: &str,
    ) -> Result<bool, StoreError> {
        validate_key(key)?;
        let mut blobs = self.blobs.lock().await;
        if blobs.get(key).map(String::as_str) != expected {
            return Ok(false);
        }

        blobs.insert(key.to_string(), body.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .blobs
            .lock()
            .await
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}
