//! Process-local implementation of the backend contract.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use edv_storage::{
    Backend, BackendStore, EdvError, Entry, EntryIterator, Operation, QueryOptions,
    StoreConfiguration, Tag, TagQuery,
};

#[derive(Clone)]
struct Record {
    value: Vec<u8>,
    tags: Vec<Tag>,
}

type Records = Arc<RwLock<HashMap<String, Record>>>;

#[derive(Default)]
struct Shared {
    stores: HashMap<String, Records>,
    configs: HashMap<String, StoreConfiguration>,
}

/// An in-memory backend. Cloning yields a handle onto the same data, and
/// repeated opens of one store name return equivalent handles.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<RwLock<Shared>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> EdvError {
    EdvError::Backend("memory store lock poisoned".to_string())
}

#[async_trait]
impl Backend for MemoryBackend {
    type Store = MemoryStore;

    async fn open_store(&self, name: &str) -> Result<Self::Store, EdvError> {
        let mut shared = self.inner.write().map_err(|_| poisoned())?;

        let records = shared
            .stores
            .entry(name.to_string())
            .or_insert_with(Records::default)
            .clone();

        Ok(MemoryStore { records })
    }

    async fn set_store_config(
        &self,
        name: &str,
        config: StoreConfiguration,
    ) -> Result<(), EdvError> {
        let mut shared = self.inner.write().map_err(|_| poisoned())?;
        shared.configs.insert(name.to_string(), config);

        Ok(())
    }

    async fn get_store_config(&self, name: &str) -> Result<StoreConfiguration, EdvError> {
        let shared = self.inner.read().map_err(|_| poisoned())?;

        shared
            .configs
            .get(name)
            .cloned()
            .ok_or_else(|| EdvError::StoreNotFound(name.to_string()))
    }
}

/// A single in-memory store: `key -> (value, tags)` under a lock.
#[derive(Clone)]
pub struct MemoryStore {
    records: Records,
}

#[async_trait]
impl BackendStore for MemoryStore {
    type Iter = MemoryIterator;

    async fn put(&self, key: &str, value: &[u8], tags: &[Tag]) -> Result<(), EdvError> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        records.insert(
            key.to_string(),
            Record {
                value: value.to_vec(),
                tags: tags.to_vec(),
            },
        );

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, EdvError> {
        let records = self.records.read().map_err(|_| poisoned())?;

        Ok(records.get(key).map(|record| record.value.clone()))
    }

    async fn get_bulk(&self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>, EdvError> {
        let records = self.records.read().map_err(|_| poisoned())?;

        Ok(keys
            .iter()
            .map(|key| records.get(key).map(|record| record.value.clone()))
            .collect())
    }

    async fn delete(&self, key: &str) -> Result<(), EdvError> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        records.remove(key);

        Ok(())
    }

    async fn batch(&self, operations: Vec<Operation>) -> Result<(), EdvError> {
        // One write guard for the whole batch: readers observe it
        // all-or-nothing.
        let mut records = self.records.write().map_err(|_| poisoned())?;

        for operation in operations {
            match operation.value {
                Some(value) => {
                    records.insert(
                        operation.key,
                        Record {
                            value,
                            tags: operation.tags,
                        },
                    );
                }
                None => {
                    records.remove(&operation.key);
                }
            }
        }

        Ok(())
    }

    async fn query(&self, query: &TagQuery, _options: QueryOptions) -> Result<Self::Iter, EdvError> {
        let records = self.records.read().map_err(|_| poisoned())?;

        // Snapshot the matches so the iterator never holds the lock.
        let entries: Vec<Entry> = records
            .iter()
            .filter(|(_, record)| {
                record
                    .tags
                    .iter()
                    .any(|tag| tag.name == query.name && tag.value == query.value)
            })
            .map(|(key, record)| Entry {
                key: key.clone(),
                value: record.value.clone(),
                tags: record.tags.clone(),
            })
            .collect();

        Ok(MemoryIterator {
            entries: entries.into_iter(),
            closed: false,
        })
    }
}

/// Iterator over a query snapshot.
pub struct MemoryIterator {
    entries: std::vec::IntoIter<Entry>,
    closed: bool,
}

#[async_trait]
impl EntryIterator for MemoryIterator {
    async fn next(&mut self) -> Result<Option<Entry>, EdvError> {
        if self.closed {
            return Err(EdvError::Backend("iterator used after close".to_string()));
        }

        Ok(self.entries.next())
    }

    async fn close(&mut self) -> Result<(), EdvError> {
        self.closed = true;

        Ok(())
    }
}
