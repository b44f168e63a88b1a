//! In-memory backend for the EDV storage engine.
//!
//! Implements the [`edv_storage::Backend`] contract over process-local maps.
//! Intended for tests and development; its behavior is the reference
//! semantics for the consumed contract, not a production driver.

mod store;

pub use store::{MemoryBackend, MemoryIterator, MemoryStore};
