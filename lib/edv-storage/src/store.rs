//! A single vault store: encrypted document CRUD, encrypted index queries,
//! and the mapping-document bookkeeping behind them.

use std::collections::HashSet;

use tracing::debug;

use crate::backend::{BackendStore, EntryIterator, Operation, QueryOptions, Tag, TagQuery};
use crate::mapping::{self, MappingDocument};
use crate::models::{
    DataVaultConfiguration, DataVaultConfigurationMapping, EncryptedDocument, Query,
};
use crate::provider::{
    MAPPING_ATTRIBUTE_NAME_TAG, MAPPING_MATCHING_DOC_ID_TAG, VAULT_CONFIG_REFERENCE_ID_TAG,
};
use crate::EdvError;

/// An EDV vault store.
///
/// Wraps a backend store with encrypted index maintenance. Safe for
/// concurrent use if the backend handle is; the store itself holds no locks,
/// caches or pools.
#[derive(Debug)]
pub struct Store<S> {
    core: S,
    name: String,
    retrieval_page_size: usize,
}

impl<S: BackendStore> Store<S> {
    pub(crate) fn new(core: S, name: &str, retrieval_page_size: usize) -> Self {
        Self {
            core,
            name: name.to_string(),
            retrieval_page_size,
        }
    }

    /// The vault name this store was opened under, before canonicalization.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Store a document along with the mapping documents that make its
    /// encrypted indices queryable.
    pub async fn put(&self, document: EncryptedDocument) -> Result<(), EdvError> {
        self.validate_new_doc_index_attributes(&document).await?;

        self.upsert_bulk(vec![document]).await
    }

    /// Store documents in bulk, creating or overwriting as needed.
    ///
    /// All mapping-document puts precede all document puts in a single
    /// batch, submitted atomically at whatever granularity the backend
    /// offers. Mapping keys embed the attribute name and value on this path.
    pub async fn upsert_bulk(&self, documents: Vec<EncryptedDocument>) -> Result<(), EdvError> {
        let mut operations = Vec::new();

        for document in &documents {
            for attribute in document.indexed_attributes() {
                let mapping = mapping::bulk_mapping_document(attribute, &document.id);

                debug!(
                    vault = %self.name,
                    mapping = %mapping.mapping_document_name,
                    "creating mapping document"
                );

                operations.push(Operation {
                    key: mapping.mapping_document_name.clone(),
                    value: Some(serde_json::to_vec(&mapping)?),
                    tags: mapping.tags(),
                });
            }
        }

        for document in &documents {
            operations.push(Operation {
                key: document.id.clone(),
                value: Some(serde_json::to_vec(document)?),
                tags: Vec::new(),
            });
        }

        self.core.batch(operations).await
    }

    /// Fetch the raw serialized document stored under `id`.
    pub async fn get(&self, id: &str) -> Result<Vec<u8>, EdvError> {
        self.core
            .get(id)
            .await?
            .ok_or_else(|| EdvError::DocumentNotFound(id.to_string()))
    }

    /// Replace a document, reconciling its mapping documents.
    ///
    /// Reconciliation works at attribute-name granularity: mapping records
    /// for names no longer declared are deleted, and each newly introduced
    /// name gets a fresh record whose key embeds a UUID rather than the
    /// value. A value change on an existing name therefore leaves the
    /// mapping records untouched; [`query`](Store::query) re-reads candidate
    /// documents to apply value filters, so results stay exact.
    ///
    /// A failure partway through reconciliation is not rolled back; the
    /// record set converges on the next successful update of the same
    /// document.
    pub async fn update(&self, new_doc: EncryptedDocument) -> Result<(), EdvError> {
        self.validate_new_doc_index_attributes(&new_doc).await?;

        self.reconcile_mapping_documents(&new_doc).await?;

        let document_bytes = serde_json::to_vec(&new_doc)?;
        self.core.put(&new_doc.id, &document_bytes, &[]).await
    }

    /// Delete a document and every mapping document derived from it.
    pub async fn delete(&self, id: &str) -> Result<(), EdvError> {
        if self.core.get(id).await?.is_none() {
            return Err(EdvError::DocumentNotFound(id.to_string()));
        }

        let query = TagQuery::new(MAPPING_MATCHING_DOC_ID_TAG, id);
        let mappings =
            mapping::read_mapping_documents(&self.core, &query, self.retrieval_page_size).await?;

        for mapping in mappings {
            self.core.delete(&mapping.mapping_document_name).await?;
        }

        self.core.delete(id).await
    }

    /// Resolve an encrypted index query.
    ///
    /// Mapping documents for the index name are fetched first, then the
    /// candidate encrypted documents they point at. Candidates that have
    /// since disappeared are skipped. When the query carries a value (and is
    /// not a "has" query), candidates are filtered in memory on the exact
    /// `(name, value)` pair, since update-path mapping records carry no
    /// value. Result order is backend-dependent; there is no pagination.
    pub async fn query(&self, query: &Query) -> Result<Vec<EncryptedDocument>, EdvError> {
        let Some(index_name) = query.index_name() else {
            return Ok(Vec::new());
        };

        let tag_query = TagQuery::new(MAPPING_ATTRIBUTE_NAME_TAG, index_name);
        let mappings =
            mapping::read_mapping_documents(&self.core, &tag_query, self.retrieval_page_size)
                .await?;

        if mappings.is_empty() {
            return Ok(Vec::new());
        }

        let document_ids = unique_document_ids(&mappings);
        let fetched = self.core.get_bulk(&document_ids).await?;

        let mut documents = Vec::new();

        for (id, bytes) in document_ids.iter().zip(fetched) {
            let Some(bytes) = bytes else {
                continue;
            };

            let document: EncryptedDocument = serde_json::from_slice(&bytes).map_err(|source| {
                EdvError::MalformedRecord {
                    key: id.clone(),
                    source,
                }
            })?;

            documents.push(document);
        }

        if let (None, Some(name), Some(value)) = (&query.has, &query.name, &query.value) {
            documents.retain(|document| document.has_attribute(name, value));
        }

        Ok(documents)
    }

    /// Persist a data vault configuration under the server-assigned vault
    /// id, rejecting reference ids already in use.
    pub async fn store_data_vault_configuration(
        &self,
        config: &DataVaultConfiguration,
        vault_id: &str,
    ) -> Result<(), EdvError> {
        if config.reference_id.is_empty() {
            return Err(EdvError::InvalidVaultConfiguration(
                "reference id must not be blank".to_string(),
            ));
        }

        self.check_duplicate_reference_id(&config.reference_id)
            .await?;

        let entry = DataVaultConfigurationMapping {
            data_vault_configuration: config.clone(),
            vault_id: vault_id.to_string(),
        };
        let entry_bytes = serde_json::to_vec(&entry)?;

        self.core
            .put(
                vault_id,
                &entry_bytes,
                &[Tag::new(VAULT_CONFIG_REFERENCE_ID_TAG, &config.reference_id)],
            )
            .await
    }

    async fn check_duplicate_reference_id(&self, reference_id: &str) -> Result<(), EdvError> {
        let query = TagQuery::new(VAULT_CONFIG_REFERENCE_ID_TAG, reference_id);
        let mut iterator = self
            .core
            .query(
                &query,
                QueryOptions {
                    page_size: self.retrieval_page_size,
                },
            )
            .await?;

        let first = iterator.next().await;
        let closed = iterator.close().await;

        let duplicate = first?.is_some();
        closed?;

        if duplicate {
            return Err(EdvError::DuplicateVaultReferenceId(
                reference_id.to_string(),
            ));
        }

        Ok(())
    }

    /// Best-effort uniqueness check for the new document's indexed
    /// attributes.
    ///
    /// Validation queries the live vault and is not serialized against
    /// concurrent writers: two in-flight documents both declaring the same
    /// unique pair can each pass. Hard uniqueness needs a backend that
    /// enforces a unique tag constraint of its own.
    async fn validate_new_doc_index_attributes(
        &self,
        new_doc: &EncryptedDocument,
    ) -> Result<(), EdvError> {
        for attribute in new_doc.indexed_attributes() {
            let query = Query::name_and_value(&attribute.name, &attribute.value);
            let existing_docs = self.query(&query).await?;

            for doc in existing_docs {
                // An update sees its own previous version; skip it.
                if doc.id == new_doc.id {
                    continue;
                }

                for stored in doc.indexed_attributes() {
                    if stored.name != attribute.name || stored.value != attribute.value {
                        continue;
                    }

                    if stored.unique {
                        return Err(EdvError::IndexNameAndValueAlreadyDeclaredUnique);
                    }

                    if attribute.unique {
                        return Err(EdvError::IndexNameAndValueCannotBeUnique);
                    }
                }
            }
        }

        Ok(())
    }

    async fn reconcile_mapping_documents(
        &self,
        new_doc: &EncryptedDocument,
    ) -> Result<(), EdvError> {
        let query = TagQuery::new(MAPPING_MATCHING_DOC_ID_TAG, &new_doc.id);
        let current =
            mapping::read_mapping_documents(&self.core, &query, self.retrieval_page_size).await?;

        let new_names: HashSet<&str> = new_doc
            .indexed_attributes()
            .map(|attribute| attribute.name.as_str())
            .collect();

        for mapping in &current {
            if !new_names.contains(mapping.attribute_name.as_str()) {
                self.core.delete(&mapping.mapping_document_name).await?;
            }
        }

        let current_names: HashSet<&str> = current
            .iter()
            .map(|mapping| mapping.attribute_name.as_str())
            .collect();

        for name in new_names {
            if !current_names.contains(name) {
                let mapping = mapping::update_mapping_document(name, &new_doc.id);

                debug!(
                    vault = %self.name,
                    mapping = %mapping.mapping_document_name,
                    "creating mapping document"
                );

                self.core
                    .put(
                        &mapping.mapping_document_name,
                        &serde_json::to_vec(&mapping)?,
                        &mapping.tags(),
                    )
                    .await?;
            }
        }

        Ok(())
    }
}

fn unique_document_ids(mappings: &[MappingDocument]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut ids = Vec::new();

    for mapping in mappings {
        if seen.insert(mapping.matching_encrypted_doc_id.as_str()) {
            ids.push(mapping.matching_encrypted_doc_id.clone());
        }
    }

    ids
}
