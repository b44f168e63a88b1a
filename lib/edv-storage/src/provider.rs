//! The vault provider: opens and configures per-vault stores on top of a
//! backend.

use tracing::debug;

use crate::backend::{Backend, StoreConfiguration};
use crate::ids::canonical_store_name;
use crate::store::Store;
use crate::EdvError;

/// The store that holds data vault configurations.
pub const VAULT_CONFIGURATION_STORE_NAME: &str = "data_vault_configurations";

/// Tag for querying vault configurations by their reference id.
pub const VAULT_CONFIG_REFERENCE_ID_TAG: &str = "ReferenceID";

/// Tag for querying mapping documents by the attribute name they index.
pub const MAPPING_ATTRIBUTE_NAME_TAG: &str = "AttributeName";

/// Tag for querying mapping documents by the encrypted document they belong to.
pub const MAPPING_MATCHING_DOC_ID_TAG: &str = "MatchingEncryptedDocumentID";

/// An EDV storage provider.
///
/// Wraps a key/value backend with the vault semantics it lacks: one physical
/// store per vault (named by the canonicalized vault id), encrypted indices
/// via mapping documents, and uniqueness constraints.
#[derive(Debug, Clone)]
pub struct Provider<B> {
    backend: B,
    retrieval_page_size: usize,
}

impl<B: Backend> Provider<B> {
    /// `retrieval_page_size` is passed to backend queries; backends without
    /// paging may ignore it.
    pub fn new(backend: B, retrieval_page_size: usize) -> Self {
        Self {
            backend,
            retrieval_page_size,
        }
    }

    /// Whether a store has ever been created under `name`, probed via the
    /// backend's store configuration.
    pub async fn store_exists(&self, name: &str) -> Result<bool, EdvError> {
        match self
            .backend
            .get_store_config(&canonical_store_name(name))
            .await
        {
            Ok(_) => Ok(true),
            Err(EdvError::StoreNotFound(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Open a vault store. A base58-encoded 128-bit name is folded to its
    /// UUID form before reaching the backend; the original name is kept on
    /// the handle for logging.
    pub async fn open_store(&self, name: &str) -> Result<Store<B::Store>, EdvError> {
        let store = self
            .backend
            .open_store(&canonical_store_name(name))
            .await?;

        debug!(vault = name, "opened vault store");

        Ok(Store::new(store, name, self.retrieval_page_size))
    }

    /// Set the store configuration, declaring the tag names the backend must
    /// index. Vault stores need at least [`VAULT_CONFIG_REFERENCE_ID_TAG`],
    /// [`MAPPING_ATTRIBUTE_NAME_TAG`] and [`MAPPING_MATCHING_DOC_ID_TAG`].
    pub async fn set_store_config(
        &self,
        name: &str,
        config: StoreConfiguration,
    ) -> Result<(), EdvError> {
        self.backend
            .set_store_config(&canonical_store_name(name), config)
            .await
    }
}
