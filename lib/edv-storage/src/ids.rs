//! Vault and document identifier handling.
//!
//! Clients address vaults and documents by base58-encoded 128-bit values.
//! Some backends constrain store names, so vault identifiers are folded into
//! their canonical UUID text form before reaching the backend; the UUID form
//! is universally safe.

use uuid::Uuid;

use crate::EdvError;

/// Whether `value` decodes as base58 to exactly 16 bytes.
pub fn is_base58_128bit(value: &str) -> bool {
    decode_128bit(value).is_some()
}

/// Fold a vault identifier into the store name handed to the backend.
///
/// A base58-encoded 128-bit value becomes the hyphenated text form of the
/// UUID built from its 16 decoded bytes; anything else passes through
/// unchanged. Idempotent: canonical UUID text contains hyphens and so never
/// decodes as base58.
pub fn canonical_store_name(name: &str) -> String {
    match decode_128bit(name) {
        Some(bytes) => Uuid::from_bytes(bytes).to_string(),
        None => name.to_string(),
    }
}

/// Generate a document id in the client format: 16 random bytes,
/// base58-encoded.
pub fn generate_document_id() -> String {
    let bytes: [u8; 16] = rand::random();
    bs58::encode(bytes).into_string()
}

/// Check the format of a client-supplied document id. The randomness of its
/// source is the client's concern, not ours.
pub fn validate_document_id(id: &str) -> Result<(), EdvError> {
    if is_base58_128bit(id) {
        Ok(())
    } else {
        Err(EdvError::InvalidDocumentId(id.to_string()))
    }
}

fn decode_128bit(value: &str) -> Option<[u8; 16]> {
    let decoded = bs58::decode(value).into_vec().ok()?;
    decoded.try_into().ok()
}
