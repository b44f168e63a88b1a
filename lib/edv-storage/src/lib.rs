//! Encrypted Data Vault (EDV) storage engine.
//!
//! A multi-tenant store for opaque, client-encrypted documents that supports
//! lookup by encrypted indices. Clients own the keys; the server sees only
//! ciphertext plus blinded index tokens. This crate is the storage engine
//! alone: it maps vault identifiers onto physical stores in a pluggable
//! key/value backend, maintains the mapping documents that make indexed
//! lookup possible, enforces (best-effort) uniqueness on indexed
//! attributes, and services index queries and bulk upsert. The HTTP façade,
//! authorization and concrete backend drivers live elsewhere.
//!
//! # Traits
//!
//! - [`Backend`] / [`BackendStore`] / [`EntryIterator`]: the consumed
//!   key/value contract a driver must implement
//!
//! # Types
//!
//! - [`Provider`]: opens and configures per-vault stores
//! - [`Store`]: document CRUD, encrypted index queries, vault configuration
//!   records

#![cfg_attr(
    test,
    allow(clippy::unwrap_used, clippy::expect_used, clippy::unwrap_in_result)
)]

mod backend;
mod error;
mod ids;
mod mapping;
mod models;
mod provider;
mod store;

pub use backend::{
    Backend, BackendStore, Entry, EntryIterator, Operation, QueryOptions, StoreConfiguration, Tag,
    TagQuery,
};
pub use error::EdvError;
pub use ids::{
    canonical_store_name, generate_document_id, is_base58_128bit, validate_document_id,
};
pub use mapping::MappingDocument;
pub use models::{
    DataVaultConfiguration, DataVaultConfigurationMapping, EncryptedDocument, IdTypePair,
    IndexedAttribute, IndexedAttributeCollection, Query,
};
pub use provider::{
    Provider, MAPPING_ATTRIBUTE_NAME_TAG, MAPPING_MATCHING_DOC_ID_TAG,
    VAULT_CONFIGURATION_STORE_NAME, VAULT_CONFIG_REFERENCE_ID_TAG,
};
pub use store::Store;
