//! The key/value backend contract consumed by the vault storage engine.
//!
//! Concrete drivers (MongoDB, CouchDB, in-memory) live outside this crate;
//! the engine only requires the narrow surface below: store lifecycle with a
//! persisted tag-index configuration, primitive put/get/delete/batch, and
//! tag-filtered iteration.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::EdvError;

/// A name/value pair attached to a stored entry for tag-filtered queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub value: String,
}

impl Tag {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// An entry yielded by a tag query.
#[derive(Debug, Clone)]
pub struct Entry {
    pub key: String,
    pub value: Vec<u8>,
    pub tags: Vec<Tag>,
}

/// A single operation within a batch. A `None` value deletes the key.
#[derive(Debug, Clone)]
pub struct Operation {
    pub key: String,
    pub value: Option<Vec<u8>>,
    pub tags: Vec<Tag>,
}

/// Store configuration persisted by the backend.
///
/// `tag_names` lists the tags the backend must index for [`BackendStore::query`]
/// to work against them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfiguration {
    #[serde(rename = "tagNames", default, skip_serializing_if = "Vec::is_empty")]
    pub tag_names: Vec<String>,
}

/// A single-tag equality query. The wire form is `<tagName>:<tagValue>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagQuery {
    pub name: String,
    pub value: String,
}

impl TagQuery {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl std::fmt::Display for TagQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.name, self.value)
    }
}

/// Options for a tag query.
#[derive(Debug, Clone, Copy)]
pub struct QueryOptions {
    /// Retrieval page size hint. Backends without paging may ignore it.
    pub page_size: usize,
}

/// A provider of named stores.
///
/// `open_store` is idempotent: repeated opens of the same name return
/// equivalent handles over the same data.
#[async_trait]
pub trait Backend: Send + Sync {
    type Store: BackendStore;

    async fn open_store(&self, name: &str) -> Result<Self::Store, EdvError>;

    async fn set_store_config(
        &self,
        name: &str,
        config: StoreConfiguration,
    ) -> Result<(), EdvError>;

    /// Fails with [`EdvError::StoreNotFound`] when no store exists under
    /// `name`; every other failure keeps its own category.
    async fn get_store_config(&self, name: &str) -> Result<StoreConfiguration, EdvError>;
}

/// A single physical store.
#[async_trait]
pub trait BackendStore: Send + Sync {
    type Iter: EntryIterator;

    async fn put(&self, key: &str, value: &[u8], tags: &[Tag]) -> Result<(), EdvError>;

    /// Returns `None` for an absent key. Mapping absence to an error is the
    /// engine's job, not the backend's.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, EdvError>;

    /// The i-th element of the result pairs with the i-th key; absent keys
    /// yield `None` in place.
    async fn get_bulk(&self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>, EdvError>;

    /// Idempotent: deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), EdvError>;

    /// Applies the operations in order, all-or-nothing to whatever extent
    /// the backend supports.
    async fn batch(&self, operations: Vec<Operation>) -> Result<(), EdvError>;

    async fn query(&self, query: &TagQuery, options: QueryOptions) -> Result<Self::Iter, EdvError>;
}

/// A forward iterator over query results.
///
/// Iterators hold backend cursors; callers must invoke [`close`] on every
/// exit path, success or error.
///
/// [`close`]: EntryIterator::close
#[async_trait]
pub trait EntryIterator: Send {
    async fn next(&mut self) -> Result<Option<Entry>, EdvError>;

    async fn close(&mut self) -> Result<(), EdvError>;
}
