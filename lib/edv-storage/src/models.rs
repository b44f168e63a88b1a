//! Wire-faithful records for the EDV data model.
//!
//! The server never inspects document content: the `jwe` payload and every
//! indexed attribute name and value are opaque tokens produced client-side.
//! Field renames pin the exact JSON keys of the persisted layouts.

use serde::{Deserialize, Serialize};

/// An id/type descriptor pair, used for the `hmac` and `keyAgreementKey`
/// references inside configurations and attribute collections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdTypePair {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

/// A blinded index attribute: `name` and `value` are HMAC tokens derived by
/// the client, never plaintext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedAttribute {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub unique: bool,
}

/// A group of indexed attributes produced under one HMAC descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedAttributeCollection {
    #[serde(default)]
    pub sequence: u64,
    #[serde(default)]
    pub hmac: IdTypePair,
    #[serde(rename = "attributes", default)]
    pub indexed_attributes: Vec<IndexedAttribute>,
}

/// A client-encrypted document. The `jwe` payload is opaque to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedDocument {
    pub id: String,
    #[serde(default)]
    pub sequence: u64,
    #[serde(rename = "indexed", default, skip_serializing_if = "Vec::is_empty")]
    pub indexed_attribute_collections: Vec<IndexedAttributeCollection>,
    pub jwe: serde_json::Value,
}

impl EncryptedDocument {
    /// All indexed attributes across every collection, in declaration order.
    pub fn indexed_attributes(&self) -> impl Iterator<Item = &IndexedAttribute> {
        self.indexed_attribute_collections
            .iter()
            .flat_map(|collection| collection.indexed_attributes.iter())
    }

    /// Whether any indexed attribute carries exactly `(name, value)`.
    pub fn has_attribute(&self, name: &str, value: &str) -> bool {
        self.indexed_attributes()
            .any(|attribute| attribute.name == name && attribute.value == value)
    }
}

/// A vault configuration as supplied by the client at vault creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataVaultConfiguration {
    #[serde(default)]
    pub sequence: u64,
    #[serde(default)]
    pub controller: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub invoker: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub delegator: Vec<String>,
    #[serde(rename = "referenceId", default)]
    pub reference_id: String,
    #[serde(rename = "keyAgreementKey", default)]
    pub key_agreement_key: IdTypePair,
    #[serde(default)]
    pub hmac: IdTypePair,
}

/// The persisted pairing of a configuration with its server-assigned vault id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataVaultConfigurationMapping {
    #[serde(rename = "dataVaultConfiguration")]
    pub data_vault_configuration: DataVaultConfiguration,
    #[serde(rename = "vaultID")]
    pub vault_id: String,
}

/// An encrypted index query.
///
/// Either `{name, value}` for an exact match, `{name}` alone, or `{has}` for
/// a "document declares this index name" query that ignores any value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    #[serde(rename = "index", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "equals", default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has: Option<String>,
}

impl Query {
    /// Query for documents declaring an index name, any value.
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Query for documents declaring an exact index name and value pair.
    pub fn name_and_value(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            value: Some(value.into()),
            ..Self::default()
        }
    }

    /// "Has" query: matches on index name and ignores any provided value.
    pub fn has(name: impl Into<String>) -> Self {
        Self {
            has: Some(name.into()),
            ..Self::default()
        }
    }

    /// The index name the engine searches on: `has` wins over `name`.
    pub fn index_name(&self) -> Option<&str> {
        self.has.as_deref().or(self.name.as_deref())
    }
}
