use thiserror::Error;

/// Errors produced by the vault storage engine.
///
/// Backend failures are wrapped in [`EdvError::Backend`] with their message
/// preserved; the not-found categories are never collapsed into it, so
/// callers can always tell an absent store or document from an unavailable
/// backend.
#[derive(Debug, Error)]
pub enum EdvError {
    /// The backend call failed for a reason the engine cannot categorize.
    #[error("backend unavailable: {0}")]
    Backend(String),

    /// The backend has no store under the given name.
    #[error("store not found: {0}")]
    StoreNotFound(String),

    /// A get or delete referenced a document id that does not exist.
    #[error("document not found: {0}")]
    DocumentNotFound(String),

    /// A data vault configuration with the same reference id already exists.
    #[error("a data vault configuration with reference id {0} already exists")]
    DuplicateVaultReferenceId(String),

    /// The new document carries an index name and value pair that an
    /// existing document has already declared unique.
    #[error(
        "unable to store document since it contains an index name and value that are already \
         declared as unique in an existing document"
    )]
    IndexNameAndValueAlreadyDeclaredUnique,

    /// The new document declares an index name and value pair unique, but
    /// another document already carries an identical pair.
    #[error(
        "unable to store document since it contains an index name and value that are declared \
         as unique, but another document already has an identical index name and value pair"
    )]
    IndexNameAndValueCannotBeUnique,

    /// A persisted value failed to parse. Corruption or version skew.
    #[error("malformed record at key {key}: {source}")]
    MalformedRecord {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// A record could not be serialized for persistence.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The document id is not a base58-encoded 128-bit value.
    #[error("invalid document id {0}: not a base58-encoded 128-bit value")]
    InvalidDocumentId(String),

    /// The vault configuration is rejected before it reaches the backend.
    #[error("invalid data vault configuration: {0}")]
    InvalidVaultConfiguration(String),

    /// The caller's cancellation or deadline fired during a backend call.
    #[error("operation cancelled")]
    Cancelled,
}
