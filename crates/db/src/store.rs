//! Persistence collaborator: named collections of JSON records.
//!
//! A [`CollectionStore`] only knows how to load and save whole collections.
//! [`Collection`] layers typing and a per-collection writer lock on top, so
//! every read-modify-write cycle against one collection is serialized.

use std::{
    collections::{HashMap, HashSet},
    marker::PhantomData,
    ops::{Deref, DerefMut},
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard, RwLock};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error on collection `{collection}`: {source}")]
    Io {
        collection: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in collection `{collection}`: {source}")]
    Json {
        collection: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("collection `{0}` is unavailable")]
    Unavailable(String),
}

#[async_trait]
pub trait CollectionStore: Send + Sync {
    /// Returns `None` when the collection has never been written.
    async fn load(&self, name: &str) -> Result<Option<Vec<Value>>, StoreError>;

    async fn save(&self, name: &str, records: &[Value]) -> Result<(), StoreError>;
}

/// One pretty-printed JSON array per collection, `<dir>/<name>.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| StoreError::Io {
                collection: dir.display().to_string(),
                source,
            })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }
}

#[async_trait]
impl CollectionStore for JsonFileStore {
    async fn load(&self, name: &str) -> Result<Option<Vec<Value>>, StoreError> {
        let bytes = match tokio::fs::read(self.path_for(name)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Io {
                    collection: name.to_string(),
                    source,
                });
            }
        };

        let records = serde_json::from_slice(&bytes).map_err(|source| StoreError::Json {
            collection: name.to_string(),
            source,
        })?;
        Ok(Some(records))
    }

    async fn save(&self, name: &str, records: &[Value]) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(records).map_err(|source| StoreError::Json {
            collection: name.to_string(),
            source,
        })?;

        // Readers only ever see the old file or the new one.
        let target = self.path_for(name);
        let tmp = self.dir.join(format!(".{name}.json.tmp"));
        let io_err = |source| StoreError::Io {
            collection: name.to_string(),
            source,
        };
        tokio::fs::write(&tmp, bytes).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, &target).await.map_err(io_err)?;
        Ok(())
    }
}

/// In-process store for tests and `DATA_DIR=:memory:`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Value>>>,
    failing: RwLock<HashSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later save to `name` fail with [`StoreError::Unavailable`].
    pub async fn fail_writes_to(&self, name: &str) {
        self.failing.write().await.insert(name.to_string());
    }

    pub async fn restore_writes_to(&self, name: &str) {
        self.failing.write().await.remove(name);
    }
}

#[async_trait]
impl CollectionStore for MemoryStore {
    async fn load(&self, name: &str) -> Result<Option<Vec<Value>>, StoreError> {
        Ok(self.collections.read().await.get(name).cloned())
    }

    async fn save(&self, name: &str, records: &[Value]) -> Result<(), StoreError> {
        if self.failing.read().await.contains(name) {
            return Err(StoreError::Unavailable(name.to_string()));
        }
        self.collections
            .write()
            .await
            .insert(name.to_string(), records.to_vec());
        Ok(())
    }
}

/// Typed handle on one named collection.
pub struct Collection<T> {
    name: &'static str,
    store: Arc<dyn CollectionStore>,
    writer: Arc<Mutex<()>>,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            store: Arc::clone(&self.store),
            writer: Arc::clone(&self.writer),
            _record: PhantomData,
        }
    }
}

impl<T> Collection<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(name: &'static str, store: Arc<dyn CollectionStore>) -> Self {
        Self {
            name,
            store,
            writer: Arc::new(Mutex::new(())),
            _record: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub async fn exists(&self) -> Result<bool, StoreError> {
        Ok(self.store.load(self.name).await?.is_some())
    }

    /// Snapshot of the collection; a missing collection reads as empty.
    pub async fn read(&self) -> Result<Vec<T>, StoreError> {
        let raw = self.store.load(self.name).await?.unwrap_or_default();
        raw.into_iter()
            .map(|value| {
                serde_json::from_value(value).map_err(|source| StoreError::Json {
                    collection: self.name.to_string(),
                    source,
                })
            })
            .collect()
    }

    /// Takes the writer lock and loads the current records. Changes become
    /// visible only through [`CollectionWrite::commit`]; dropping the guard
    /// discards them.
    pub async fn write(&self) -> Result<CollectionWrite<'_, T>, StoreError> {
        let guard = self.writer.lock().await;
        let records = self.read().await?;
        Ok(CollectionWrite {
            collection: self,
            records,
            _guard: guard,
        })
    }

    /// Replaces the whole collection under the writer lock.
    pub async fn replace(&self, records: Vec<T>) -> Result<(), StoreError> {
        let mut write = self.write().await?;
        *write = records;
        write.commit().await
    }

    async fn save(&self, records: &[T]) -> Result<(), StoreError> {
        let values = records
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| StoreError::Json {
                collection: self.name.to_string(),
                source,
            })?;
        self.store.save(self.name, &values).await
    }
}

pub struct CollectionWrite<'a, T>
where
    T: Serialize + DeserializeOwned,
{
    collection: &'a Collection<T>,
    records: Vec<T>,
    _guard: MutexGuard<'a, ()>,
}

impl<T> CollectionWrite<'_, T>
where
    T: Serialize + DeserializeOwned,
{
    pub async fn commit(self) -> Result<(), StoreError> {
        self.collection.save(&self.records).await
    }
}

impl<T> Deref for CollectionWrite<'_, T>
where
    T: Serialize + DeserializeOwned,
{
    type Target = Vec<T>;

    fn deref(&self) -> &Self::Target {
        &self.records
    }
}

impl<T> DerefMut for CollectionWrite<'_, T>
where
    T: Serialize + DeserializeOwned,
{
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.records
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Row {
        id: u32,
    }

    #[tokio::test]
    async fn test_missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).await.unwrap();
        assert!(store.load("users").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_json_file_store_writes_pretty_array() {
        let dir = tempfile::tempdir().unwrap();
        let store: Arc<dyn CollectionStore> =
            Arc::new(JsonFileStore::open(dir.path()).await.unwrap());
        let rows = Collection::<Row>::new("rows", store);

        let mut write = rows.write().await.unwrap();
        write.push(Row { id: 1 });
        write.push(Row { id: 2 });
        write.commit().await.unwrap();

        let raw = std::fs::read_to_string(dir.path().join("rows.json")).unwrap();
        assert!(raw.starts_with("[\n"));
        assert_eq!(rows.read().await.unwrap(), vec![Row { id: 1 }, Row { id: 2 }]);
    }

    #[tokio::test]
    async fn test_dropped_write_is_discarded() {
        let rows = Collection::<Row>::new("rows", Arc::new(MemoryStore::new()));
        {
            let mut write = rows.write().await.unwrap();
            write.push(Row { id: 1 });
        }
        assert!(rows.read().await.unwrap().is_empty());
        assert!(!rows.exists().await.unwrap());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("rows.json"), "{not json").unwrap();
        let store: Arc<dyn CollectionStore> =
            Arc::new(JsonFileStore::open(dir.path()).await.unwrap());
        let rows = Collection::<Row>::new("rows", store);

        assert!(matches!(rows.read().await, Err(StoreError::Json { .. })));
    }

    #[tokio::test]
    async fn test_concurrent_writers_do_not_lose_updates() {
        let rows = Collection::<Row>::new("rows", Arc::new(MemoryStore::new()));

        let mut handles = Vec::new();
        for id in 0..16 {
            let rows = rows.clone();
            handles.push(tokio::spawn(async move {
                let mut write = rows.write().await.unwrap();
                write.push(Row { id });
                write.commit().await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(rows.read().await.unwrap().len(), 16);
    }

    #[tokio::test]
    async fn test_failing_store_surfaces_unavailable() {
        let store = Arc::new(MemoryStore::new());
        store.fail_writes_to("rows").await;
        let rows = Collection::<Row>::new("rows", store.clone());

        let write = rows.write().await.unwrap();
        assert!(matches!(
            write.commit().await,
            Err(StoreError::Unavailable(name)) if name == "rows"
        ));

        store.restore_writes_to("rows").await;
        rows.replace(vec![Row { id: 5 }]).await.unwrap();
        assert_eq!(rows.read().await.unwrap(), vec![Row { id: 5 }]);
    }
}
