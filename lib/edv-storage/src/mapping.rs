//! Mapping documents: the auxiliary records that make encrypted indices
//! queryable.
//!
//! Every indexed attribute of a live encrypted document is backed by at
//! least one mapping record tagged with the attribute name and the owning
//! document id. Two key layouts exist and both must be accepted on read:
//! the bulk-insert path embeds `name-value` in the key, the update path
//! embeds a fresh UUID. Readers only ever parse the record body, never the
//! key, so the layouts coexist in one vault.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::backend::{BackendStore, EntryIterator, QueryOptions, Tag, TagQuery};
use crate::provider::{MAPPING_ATTRIBUTE_NAME_TAG, MAPPING_MATCHING_DOC_ID_TAG};
use crate::{EdvError, IndexedAttribute};

/// The persisted mapping record. Key names are fixed wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingDocument {
    #[serde(rename = "attributeName")]
    pub attribute_name: String,
    #[serde(rename = "matchingEncryptedDocID")]
    pub matching_encrypted_doc_id: String,
    #[serde(rename = "mappingDocumentName")]
    pub mapping_document_name: String,
}

impl MappingDocument {
    /// The tags every mapping record carries, whichever path created it.
    pub(crate) fn tags(&self) -> Vec<Tag> {
        vec![
            Tag::new(MAPPING_ATTRIBUTE_NAME_TAG, &self.attribute_name),
            Tag::new(MAPPING_MATCHING_DOC_ID_TAG, &self.matching_encrypted_doc_id),
        ]
    }
}

/// Bulk-insert layout: the key embeds the attribute name and value.
pub(crate) fn bulk_mapping_document(
    attribute: &IndexedAttribute,
    encrypted_doc_id: &str,
) -> MappingDocument {
    let mapping_document_name = format!(
        "{}_mapping_{}-{}",
        encrypted_doc_id, attribute.name, attribute.value
    );

    MappingDocument {
        attribute_name: attribute.name.clone(),
        matching_encrypted_doc_id: encrypted_doc_id.to_string(),
        mapping_document_name,
    }
}

/// Update layout: the key embeds a fresh UUID and carries no value.
pub(crate) fn update_mapping_document(
    attribute_name: &str,
    encrypted_doc_id: &str,
) -> MappingDocument {
    let mapping_document_name = format!("{}_mapping_{}", encrypted_doc_id, Uuid::new_v4());

    MappingDocument {
        attribute_name: attribute_name.to_string(),
        matching_encrypted_doc_id: encrypted_doc_id.to_string(),
        mapping_document_name,
    }
}

/// Read all mapping documents matching a tag query.
///
/// The backend iterator is closed on every exit path; the first iteration or
/// parse failure terminates the read.
pub(crate) async fn read_mapping_documents<S: BackendStore>(
    store: &S,
    query: &TagQuery,
    page_size: usize,
) -> Result<Vec<MappingDocument>, EdvError> {
    let mut iterator = store.query(query, QueryOptions { page_size }).await?;

    let drained = drain(&mut iterator).await;
    let closed = iterator.close().await;

    let documents = drained?;
    closed?;

    Ok(documents)
}

async fn drain<I: EntryIterator>(iterator: &mut I) -> Result<Vec<MappingDocument>, EdvError> {
    let mut documents = Vec::new();

    while let Some(entry) = iterator.next().await? {
        let document =
            serde_json::from_slice(&entry.value).map_err(|source| EdvError::MalformedRecord {
                key: entry.key.clone(),
                source,
            })?;
        documents.push(document);
    }

    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bulk_key_embeds_name_and_value() {
        let attribute = IndexedAttribute {
            name: "CUQaxPtSLtd8L3WBAIkJ4DiVJeqoF6bdnhR7lSaPloZ".to_string(),
            value: "RV58Va4904K-18_L5g_vfARXRWEB00knFSGPpukUBro".to_string(),
            unique: false,
        };

        let mapping = bulk_mapping_document(&attribute, "zDoc1");
        assert_eq!(
            mapping.mapping_document_name,
            format!("zDoc1_mapping_{}-{}", attribute.name, attribute.value)
        );
        assert_eq!(mapping.attribute_name, attribute.name);
        assert_eq!(mapping.matching_encrypted_doc_id, "zDoc1");
    }

    #[test]
    fn update_key_embeds_uuid_not_value() {
        let mapping = update_mapping_document("Nm1", "zDoc1");

        let suffix = mapping
            .mapping_document_name
            .strip_prefix("zDoc1_mapping_")
            .unwrap();
        uuid::Uuid::parse_str(suffix).unwrap();
        assert!(!mapping.mapping_document_name.contains("Nm1"));
    }

    #[test]
    fn record_json_keys() {
        let mapping = MappingDocument {
            attribute_name: "Nm1".to_string(),
            matching_encrypted_doc_id: "zDoc1".to_string(),
            mapping_document_name: "zDoc1_mapping_Nm1-V1".to_string(),
        };

        let value = serde_json::to_value(&mapping).unwrap();
        assert_eq!(value["attributeName"], "Nm1");
        assert_eq!(value["matchingEncryptedDocID"], "zDoc1");
        assert_eq!(value["mappingDocumentName"], "zDoc1_mapping_Nm1-V1");
    }

    #[test]
    fn both_key_layouts_parse_to_the_same_record_shape() {
        let bulk = r#"{"attributeName":"Nm1","matchingEncryptedDocID":"zDoc1","mappingDocumentName":"zDoc1_mapping_Nm1-V1"}"#;
        let update = r#"{"attributeName":"Nm1","matchingEncryptedDocID":"zDoc1","mappingDocumentName":"zDoc1_mapping_0a61dd45-0df9-4f2e-91e3-3b0dfa4d86ad"}"#;

        let parsed_bulk: MappingDocument = serde_json::from_str(bulk).unwrap();
        let parsed_update: MappingDocument = serde_json::from_str(update).unwrap();
        assert_eq!(parsed_bulk.attribute_name, parsed_update.attribute_name);
        assert_eq!(
            parsed_bulk.matching_encrypted_doc_id,
            parsed_update.matching_encrypted_doc_id
        );
    }
}
