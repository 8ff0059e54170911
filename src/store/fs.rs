use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{BlobStore, StoreError, validate_key};

const TMP_SUFFIX: &str = ".tmp";

/// One file per key below `<root>/<bucket>/`.
///
/// Writes go to a sibling temp file that is renamed into place. All writes
/// through one instance are serialized, which is what makes
/// `compare_and_swap` atomic for callers sharing the instance.
pub struct FsBlobStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>, bucket: &str) -> Self {
        let mut dir = root.into();
        dir.push(bucket);
        Self {
            dir,
            write_lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        validate_key(key)?;
        Ok(key.split('/').fold(self.dir.clone(), |mut path, segment| {
            path.push(segment);
            path
        }))
    }

    async fn read_path(&self, key: &str, path: &Path) -> Result<Option<String>, StoreError> {
        match async_fs::read_to_string(path).await {
            Ok(body) => Ok(Some(body)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(key, e)),
        }
    }

    async fn write_path(&self, key: &str, path: &Path, body: &str) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            async_fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(key, e))?;
        }

        let mut tmp = path.as_os_str().to_owned();
        tmp.push(TMP_SUFFIX);
        let tmp = PathBuf::from(tmp);

        async_fs::write(&tmp, body)
            .await
            .map_err(|e| io_error(key, e))?;
        async_fs::rename(&tmp, path)
            .await
            .map_err(|e| io_error(key, e))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let path = self.path_for(key)?;
        match async_fs::metadata(&path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_error(key, e)),
        }
    }

    async fn read_text(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key)?;
        self.read_path(key, &path).await
    }

    async fn write_text(&self, key: &str, body: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        let _guard = self.write_lock.lock().await;
        self.write_path(key, &path, body).await
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&str>,
        body: &str,
    ) -> Result<bool, StoreError> {
        let path = self.path_for(key)?;
        let _guard = self.write_lock.lock().await;

        let current = self.read_path(key, &path).await?;
        if current.as_deref() != expected {
            return Ok(false);
        }

        self.write_path(key, &path, body).await?;
        Ok(true)
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let mut keys = Vec::new();
        let mut pending = vec![self.dir.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(io_error(prefix, e)),
            };

            while let Some(entry) = entries.next_entry().await.map_err(|e| io_error(prefix, e))? {
                let path = entry.path();
                let file_type = entry.file_type().await.map_err(|e| io_error(prefix, e))?;
                if file_type.is_dir() {
                    pending.push(path);
                    continue;
                }

                let Ok(relative) = path.strip_prefix(&self.dir) else {
                    continue;
                };
                let key = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");

                if key.starts_with(prefix) && !key.ends_with(TMP_SUFFIX) {
                    keys.push(key);
                }
            }
        }

        keys.sort();
        Ok(keys)
    }
}

fn io_error(key: &str, source: std::io::Error) -> StoreError {
    StoreError::Io {
        key: key.to_string(),
        source,
    }
}
