use std::{
    collections::HashMap,
    path::PathBuf,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use tokio::{fs, sync::RwLock};
use tracing::debug;

use crate::errors::ServiceError;

/// Opaque key -> serialized blob persistence.
///
/// Implementations can be file-backed, in-memory, or anything else that can
/// store a string under a name. Record stores write a whole collection per
/// call; there is no partial update.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Returns `None` when nothing was ever saved under `key`.
    async fn load(&self, key: &str) -> Result<Option<String>, ServiceError>;
    async fn save(&self, key: &str, blob: String) -> Result<(), ServiceError>;
}

fn check_key(key: &str) -> Result<(), ServiceError> {
    let ok = !key.is_empty()
        && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if ok {
        Ok(())
    } else {
        Err(ServiceError::Storage(format!("invalid blob key {:?}", key)))
    }
}

/// One JSON file per key under a data directory.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    /// Initialize the store rooted at `dir`, creating the directory if missing.
    pub async fn new<P: Into<PathBuf>>(dir: P) -> Result<Arc<Self>, ServiceError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await.map_err(|e| ServiceError::Storage(e.to_string()))?;
        Ok(Arc::new(Self { dir }))
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, ServiceError> {
        check_key(key)?;
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

#[async_trait]
impl BlobStore for FileBlobStore {
    async fn load(&self, key: &str) -> Result<Option<String>, ServiceError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path).await {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ServiceError::Storage(format!("{}: {}", path.display(), e))),
        }
    }

    async fn save(&self, key: &str, blob: String) -> Result<(), ServiceError> {
        let path = self.path_for(key)?;
        // write-then-rename so readers never observe a half-written blob
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, blob.as_bytes()).await.map_err(|e| ServiceError::Storage(e.to_string()))?;
        fs::rename(&tmp, &path).await.map_err(|e| ServiceError::Storage(e.to_string()))?;
        debug!(key, bytes = blob.len(), path = %path.display(), "blob saved");
        Ok(())
    }
}

/// In-process blob store. Counts writes so callers can observe persistence.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    inner: RwLock<HashMap<String, String>>,
    saves: AtomicUsize,
}

impl MemoryBlobStore {
    pub fn new() -> Arc<Self> { Arc::new(Self::default()) }

    /// Pre-populate a key, bypassing the write counter.
    pub async fn put_raw(&self, key: &str, blob: &str) {
        self.inner.write().await.insert(key.to_string(), blob.to_string());
    }

    pub fn save_count(&self) -> usize { self.saves.load(Ordering::SeqCst) }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn load(&self, key: &str) -> Result<Option<String>, ServiceError> {
        check_key(key)?;
        Ok(self.inner.read().await.get(key).cloned())
    }

    async fn save(&self, key: &str, blob: String) -> Result<(), ServiceError> {
        check_key(key)?;
        self.inner.write().await.insert(key.to_string(), blob);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
