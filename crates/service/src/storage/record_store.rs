use std::{collections::HashMap, sync::Arc};

use models::Record;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::errors::ServiceError;
use crate::storage::blob_store::BlobStore;

/// Ordered records plus a key -> position index over them.
///
/// Both are only ever changed together; after every public operation the
/// index covers exactly the keys present in `records`.
struct Entries<R> {
    records: Vec<R>,
    index: HashMap<String, usize>,
}

impl<R: Record> Entries<R> {
    fn empty() -> Self {
        Self { records: Vec::new(), index: HashMap::new() }
    }

    /// Build from a loaded collection in a single pass. A repeated key keeps
    /// its first occurrence.
    fn from_records(loaded: Vec<R>) -> Self {
        let mut entries = Self { records: Vec::with_capacity(loaded.len()), index: HashMap::with_capacity(loaded.len()) };
        for record in loaded {
            if entries.index.contains_key(record.key()) {
                warn!(kind = R::KIND, key = record.key(), "duplicate key in persisted blob; keeping first");
                continue;
            }
            entries.index.insert(record.key().to_string(), entries.records.len());
            entries.records.push(record);
        }
        entries
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.index.get(key).copied()
    }

    fn reindex(&mut self) {
        self.index = self.records.iter().enumerate().map(|(i, r)| (r.key().to_string(), i)).collect();
    }
}

/// What [`RecordStore::load`] found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Loaded {
    pub count: usize,
    /// A blob existed under the key, even if it was malformed or empty.
    pub blob_found: bool,
}

/// Generic CRUD store: ordered collection + unique-key index, persisted as a
/// single JSON blob after every mutation.
///
/// A mutation whose blob write fails is rolled back in memory. If the primary
/// blob was already written when the mirror write failed, the primary is
/// rewritten from the rolled-back state, so neither side keeps a write the
/// caller was told failed.
pub struct RecordStore<R> {
    blobs: Arc<dyn BlobStore>,
    blob_key: String,
    index_key: Option<String>,
    entries: RwLock<Entries<R>>,
}

impl<R> RecordStore<R>
where
    R: Record + Clone + Serialize + DeserializeOwned + Send + Sync,
{
    /// An empty store writing to `blob_key`. Call [`RecordStore::load`] to read
    /// what was persisted before.
    pub fn new(blobs: Arc<dyn BlobStore>, blob_key: impl Into<String>) -> Self {
        Self { blobs, blob_key: blob_key.into(), index_key: None, entries: RwLock::new(Entries::empty()) }
    }

    /// Also persist a `key -> record` map under `index_key` on every write.
    /// The map is a mirror for external readers; loading never reads it.
    pub fn with_index_blob(mut self, index_key: impl Into<String>) -> Self {
        self.index_key = Some(index_key.into());
        self
    }

    pub fn blob_key(&self) -> &str { &self.blob_key }

    /// Replace the in-memory state with the persisted collection and rebuild
    /// the index. A missing, unreadable or malformed blob yields an empty
    /// store.
    pub async fn load(&self) -> Loaded {
        let blob = match self.blobs.load(&self.blob_key).await {
            Ok(blob) => blob,
            Err(e) => {
                warn!(kind = R::KIND, blob_key = %self.blob_key, error = %e, "blob unreadable; starting empty");
                None
            }
        };
        let blob_found = blob.is_some();
        let loaded: Vec<R> = match blob.map(|b| serde_json::from_str(&b)) {
            Some(Ok(records)) => records,
            Some(Err(e)) => {
                warn!(kind = R::KIND, blob_key = %self.blob_key, error = %e, "malformed blob; starting empty");
                Vec::new()
            }
            None => Vec::new(),
        };
        let fresh = Entries::from_records(loaded);
        let count = fresh.records.len();
        *self.entries.write().await = fresh;
        debug!(kind = R::KIND, blob_key = %self.blob_key, count, blob_found, "records loaded");
        Loaded { count, blob_found }
    }

    /// Append a record. Fails with `DuplicateKey` if its key is taken, leaving
    /// the existing record untouched.
    pub async fn add(&self, record: R) -> Result<R, ServiceError> {
        let mut entries = self.entries.write().await;
        if entries.index.contains_key(record.key()) {
            return Err(ServiceError::duplicate(R::KIND, record.key()));
        }
        let pos = entries.records.len();
        entries.index.insert(record.key().to_string(), pos);
        entries.records.push(record.clone());
        if let Err(e) = self.persist_entries(&entries).await {
            entries.records.pop();
            entries.index.remove(record.key());
            self.restore_primary(&entries).await;
            return Err(e);
        }
        Ok(record)
    }

    pub async fn get(&self, key: &str) -> Option<R> {
        let entries = self.entries.read().await;
        entries.position(key).map(|i| entries.records[i].clone())
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.entries.read().await.index.contains_key(key)
    }

    /// Apply `mutator` to the record under `key` and persist.
    ///
    /// The mutator works on a copy; nothing changes if it returns an error or
    /// alters the key.
    pub async fn update<F>(&self, key: &str, mutator: F) -> Result<R, ServiceError>
    where
        F: FnOnce(&mut R) -> Result<(), ServiceError>,
    {
        let mut entries = self.entries.write().await;
        let pos = entries.position(key).ok_or_else(|| ServiceError::not_found(R::KIND, key))?;
        let mut working = entries.records[pos].clone();
        mutator(&mut working)?;
        if working.key() != key {
            return Err(ServiceError::Validation(format!("{} key is immutable", R::KIND)));
        }
        let previous = std::mem::replace(&mut entries.records[pos], working.clone());
        if let Err(e) = self.persist_entries(&entries).await {
            entries.records[pos] = previous;
            self.restore_primary(&entries).await;
            return Err(e);
        }
        Ok(working)
    }

    /// Remove the record under `key` from both collection and index; returns it.
    pub async fn remove(&self, key: &str) -> Result<R, ServiceError> {
        let mut entries = self.entries.write().await;
        let pos = entries.position(key).ok_or_else(|| ServiceError::not_found(R::KIND, key))?;
        let removed = entries.records.remove(pos);
        entries.reindex();
        if let Err(e) = self.persist_entries(&entries).await {
            entries.records.insert(pos, removed);
            entries.reindex();
            self.restore_primary(&entries).await;
            return Err(e);
        }
        Ok(removed)
    }

    /// Write the current collection (and index mirror, if configured).
    pub async fn persist(&self) -> Result<(), ServiceError> {
        let entries = self.entries.read().await;
        self.persist_entries(&entries).await
    }

    /// Snapshot of the ordered collection.
    pub async fn list(&self) -> Vec<R> {
        self.entries.read().await.records.clone()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn persist_entries(&self, entries: &Entries<R>) -> Result<(), ServiceError> {
        let blob = serde_json::to_string(&entries.records).map_err(|e| ServiceError::Storage(e.to_string()))?;
        self.blobs.save(&self.blob_key, blob).await?;
        if let Some(index_key) = &self.index_key {
            let mirror: HashMap<&str, &R> = entries.records.iter().map(|r| (r.key(), r)).collect();
            let blob = serde_json::to_string(&mirror).map_err(|e| ServiceError::Storage(e.to_string()))?;
            self.blobs.save(index_key, blob).await?;
        }
        debug!(kind = R::KIND, blob_key = %self.blob_key, count = entries.records.len(), "records persisted");
        Ok(())
    }

    /// After a failed persist with a mirror configured, the primary blob may
    /// already hold the rejected write; put the rolled-back collection back.
    async fn restore_primary(&self, entries: &Entries<R>) {
        if self.index_key.is_none() {
            return;
        }
        let restored = match serde_json::to_string(&entries.records) {
            Ok(blob) => self.blobs.save(&self.blob_key, blob).await,
            Err(e) => Err(ServiceError::Storage(e.to_string())),
        };
        if let Err(e) = restored {
            warn!(kind = R::KIND, blob_key = %self.blob_key, error = %e, "could not restore blob after failed write");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::blob_store::MemoryBlobStore;
    use async_trait::async_trait;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        id: String,
        body: String,
    }

    impl Record for Note {
        const KIND: &'static str = "note";
        fn key(&self) -> &str { &self.id }
    }

    fn note(id: &str, body: &str) -> Note {
        Note { id: id.into(), body: body.into() }
    }

    /// Memory-backed blob store whose writes fail for one key only.
    struct FailingKey {
        inner: Arc<MemoryBlobStore>,
        key: &'static str,
    }

    #[async_trait]
    impl BlobStore for FailingKey {
        async fn load(&self, key: &str) -> Result<Option<String>, ServiceError> { self.inner.load(key).await }
        async fn save(&self, key: &str, blob: String) -> Result<(), ServiceError> {
            if key == self.key {
                return Err(ServiceError::Storage("mirror volume read-only".into()));
            }
            self.inner.save(key, blob).await
        }
    }

    /// Blob store whose writes always fail.
    struct FailingBlobs;

    #[async_trait]
    impl BlobStore for FailingBlobs {
        async fn load(&self, _key: &str) -> Result<Option<String>, ServiceError> { Ok(None) }
        async fn save(&self, _key: &str, _blob: String) -> Result<(), ServiceError> {
            Err(ServiceError::Storage("disk full".into()))
        }
    }

    #[tokio::test]
    async fn distinct_adds_are_all_retrievable() -> Result<(), anyhow::Error> {
        let blobs = MemoryBlobStore::new();
        let store = RecordStore::<Note>::new(blobs.clone(), "notes");
        for i in 0..25 {
            store.add(note(&format!("n{i}"), &format!("body {i}"))).await?;
        }
        assert_eq!(store.len().await, 25);
        assert_eq!(blobs.save_count(), 25);
        for i in 0..25 {
            assert_eq!(store.get(&format!("n{i}")).await.unwrap().body, format!("body {i}"));
        }
        let order: Vec<String> = store.list().await.into_iter().map(|n| n.id).collect();
        assert_eq!(order.first().map(String::as_str), Some("n0"));
        assert_eq!(order.last().map(String::as_str), Some("n24"));
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_add_fails_and_keeps_existing() -> Result<(), anyhow::Error> {
        let blobs = MemoryBlobStore::new();
        let store = RecordStore::<Note>::new(blobs.clone(), "notes");
        store.add(note("a", "first")).await?;
        let err = store.add(note("a", "second")).await.unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateKey { entity: "note", .. }));
        assert_eq!(store.get("a").await.unwrap().body, "first");
        assert_eq!(store.len().await, 1);
        assert_eq!(blobs.save_count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn update_applies_mutator_and_guards_key() -> Result<(), anyhow::Error> {
        let store = RecordStore::<Note>::new(MemoryBlobStore::new(), "notes");
        store.add(note("a", "v1")).await?;

        let updated = store.update("a", |n| { n.body = "v2".into(); Ok(()) }).await?;
        assert_eq!(updated.body, "v2");
        assert_eq!(store.get("a").await.unwrap().body, "v2");

        let err = store.update("a", |_| Err(ServiceError::Validation("nope".into()))).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(store.get("a").await.unwrap().body, "v2");

        let err = store.update("a", |n| { n.id = "b".into(); Ok(()) }).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert!(store.get("b").await.is_none());

        let err = store.update("zzz", |_| Ok(())).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn remove_keeps_index_in_sync() -> Result<(), anyhow::Error> {
        let store = RecordStore::<Note>::new(MemoryBlobStore::new(), "notes");
        for id in ["a", "b", "c"] {
            store.add(note(id, id)).await?;
        }
        let removed = store.remove("a").await?;
        assert_eq!(removed.id, "a");
        assert!(store.get("a").await.is_none());
        // positions shifted; lookups must still land on the right records
        assert_eq!(store.get("b").await.unwrap().body, "b");
        assert_eq!(store.get("c").await.unwrap().body, "c");
        assert!(matches!(store.remove("a").await, Err(ServiceError::NotFound { .. })));
        store.add(note("a", "again")).await?;
        assert_eq!(store.list().await.last().unwrap().body, "again");
        Ok(())
    }

    #[tokio::test]
    async fn persist_then_load_reproduces_state() -> Result<(), anyhow::Error> {
        let blobs = MemoryBlobStore::new();
        let store = RecordStore::<Note>::new(blobs.clone(), "notes").with_index_blob("noteMap");
        store.add(note("x", "1")).await?;
        store.add(note("y", "2")).await?;
        store.update("x", |n| { n.body = "11".into(); Ok(()) }).await?;
        store.persist().await?;

        let reloaded = RecordStore::<Note>::new(blobs.clone(), "notes");
        assert_eq!(reloaded.load().await.count, 2);
        assert_eq!(reloaded.list().await, store.list().await);
        assert_eq!(reloaded.get("x").await.unwrap().body, "11");

        let mirror: HashMap<String, Note> = serde_json::from_str(&blobs.load("noteMap").await?.unwrap())?;
        assert_eq!(mirror.len(), 2);
        assert_eq!(mirror["y"].body, "2");
        Ok(())
    }

    #[tokio::test]
    async fn load_is_fail_soft() -> Result<(), anyhow::Error> {
        let blobs = MemoryBlobStore::new();
        let store = RecordStore::<Note>::new(blobs.clone(), "notes");
        assert_eq!(store.load().await, Loaded { count: 0, blob_found: false });

        blobs.put_raw("notes", "{not json").await;
        assert_eq!(store.load().await, Loaded { count: 0, blob_found: true });
        assert!(store.is_empty().await);

        blobs.put_raw("notes", r#"[{"id":"a","body":"1"},{"id":"a","body":"2"},{"id":"b","body":"3"}]"#).await;
        assert_eq!(store.load().await.count, 2);
        assert_eq!(store.get("a").await.unwrap().body, "1");
        Ok(())
    }

    #[tokio::test]
    async fn failed_persist_rolls_back() -> Result<(), anyhow::Error> {
        let store = RecordStore::<Note>::new(Arc::new(FailingBlobs), "notes");
        assert!(matches!(store.add(note("a", "1")).await, Err(ServiceError::Storage(_))));
        assert!(store.is_empty().await);
        assert!(!store.contains("a").await);
        Ok(())
    }

    #[tokio::test]
    async fn failed_mirror_write_leaves_no_trace_in_primary_blob() -> Result<(), anyhow::Error> {
        let mem = MemoryBlobStore::new();
        let blobs = Arc::new(FailingKey { inner: mem.clone(), key: "noteMap" });
        let store = RecordStore::<Note>::new(blobs.clone(), "notes").with_index_blob("noteMap");

        assert!(matches!(store.add(note("a", "1")).await, Err(ServiceError::Storage(_))));
        assert!(store.is_empty().await);
        let reopened = RecordStore::<Note>::new(blobs.clone(), "notes");
        assert_eq!(reopened.load().await.count, 0);

        // same for update and remove over a record persisted before the mirror broke
        mem.put_raw("notes", r#"[{"id":"b","body":"old"}]"#).await;
        store.load().await;
        assert!(store.update("b", |n| { n.body = "new".into(); Ok(()) }).await.is_err());
        assert!(store.remove("b").await.is_err());
        reopened.load().await;
        assert_eq!(reopened.get("b").await.unwrap().body, "old");
        assert_eq!(store.get("b").await.unwrap().body, "old");
        Ok(())
    }
}
