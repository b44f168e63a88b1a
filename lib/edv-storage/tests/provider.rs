//! Provider behavior: store naming, existence probes and vault
//! configuration records.

use edv_storage::{
    canonical_store_name, Backend, BackendStore, DataVaultConfiguration, EdvError, EntryIterator,
    Provider, QueryOptions, StoreConfiguration, TagQuery, MAPPING_ATTRIBUTE_NAME_TAG,
    MAPPING_MATCHING_DOC_ID_TAG, VAULT_CONFIGURATION_STORE_NAME, VAULT_CONFIG_REFERENCE_ID_TAG,
};
use edv_storage_memory::MemoryBackend;
use serde_json::Value;

const PAGE_SIZE: usize = 100;

// Base58 form of the 16 bytes of 3db14224-6f40-4ff1-9503-7910b09a2ff6.
const BASE58_VAULT_ID: &str = "8cr6WCQUFGeYyJkbsjsboK";
const UUID_VAULT_ID: &str = "3db14224-6f40-4ff1-9503-7910b09a2ff6";

fn vault_store_config() -> StoreConfiguration {
    StoreConfiguration {
        tag_names: vec![
            VAULT_CONFIG_REFERENCE_ID_TAG.to_string(),
            MAPPING_ATTRIBUTE_NAME_TAG.to_string(),
            MAPPING_MATCHING_DOC_ID_TAG.to_string(),
        ],
    }
}

fn config(reference_id: &str) -> DataVaultConfiguration {
    DataVaultConfiguration {
        controller: "did:example:123456789".to_string(),
        reference_id: reference_id.to_string(),
        ..DataVaultConfiguration::default()
    }
}

#[tokio::test]
async fn store_exists_reflects_configuration() {
    let backend = MemoryBackend::new();
    let provider = Provider::new(backend, PAGE_SIZE);

    assert!(!provider.store_exists("v1").await.unwrap());

    provider
        .set_store_config("v1", vault_store_config())
        .await
        .unwrap();

    assert!(provider.store_exists("v1").await.unwrap());
}

#[tokio::test]
async fn base58_and_uuid_forms_address_the_same_store() {
    let backend = MemoryBackend::new();
    let provider = Provider::new(backend.clone(), PAGE_SIZE);

    provider
        .set_store_config(BASE58_VAULT_ID, vault_store_config())
        .await
        .unwrap();

    // The UUID form probes the same physical store.
    assert!(provider.store_exists(UUID_VAULT_ID).await.unwrap());
    assert_eq!(canonical_store_name(BASE58_VAULT_ID), UUID_VAULT_ID);

    let opened_by_base58 = provider.open_store(BASE58_VAULT_ID).await.unwrap();
    assert_eq!(opened_by_base58.name(), BASE58_VAULT_ID);

    // Raw put through one name, visible through the other.
    let raw = backend.open_store(UUID_VAULT_ID).await.unwrap();
    raw.put("k1", b"v1", &[]).await.unwrap();
    assert_eq!(opened_by_base58.get("k1").await.unwrap(), b"v1".to_vec());
}

#[tokio::test]
async fn plain_store_names_pass_through_canonicalization() {
    let backend = MemoryBackend::new();
    let provider = Provider::new(backend.clone(), PAGE_SIZE);

    provider
        .set_store_config(VAULT_CONFIGURATION_STORE_NAME, vault_store_config())
        .await
        .unwrap();

    // The underscore makes the name invalid base58, so the backend sees it
    // verbatim.
    backend
        .get_store_config(VAULT_CONFIGURATION_STORE_NAME)
        .await
        .unwrap();
}

#[tokio::test]
async fn vault_configuration_record_layout() {
    let backend = MemoryBackend::new();
    let provider = Provider::new(backend.clone(), PAGE_SIZE);

    provider
        .set_store_config(VAULT_CONFIGURATION_STORE_NAME, vault_store_config())
        .await
        .unwrap();
    let config_store = provider
        .open_store(VAULT_CONFIGURATION_STORE_NAME)
        .await
        .unwrap();

    config_store
        .store_data_vault_configuration(&config("ref-a"), "v1")
        .await
        .unwrap();

    // Keyed by vault id, wire keys exact.
    let raw = backend
        .open_store(VAULT_CONFIGURATION_STORE_NAME)
        .await
        .unwrap();
    let stored = raw.get("v1").await.unwrap().unwrap();
    let value: Value = serde_json::from_slice(&stored).unwrap();
    assert_eq!(value["vaultID"], "v1");
    assert_eq!(value["dataVaultConfiguration"]["referenceId"], "ref-a");
    assert_eq!(
        value["dataVaultConfiguration"]["controller"],
        "did:example:123456789"
    );

    // Tagged for reference id lookup.
    let mut iterator = raw
        .query(
            &TagQuery::new(VAULT_CONFIG_REFERENCE_ID_TAG, "ref-a"),
            QueryOptions {
                page_size: PAGE_SIZE,
            },
        )
        .await
        .unwrap();
    let entry = iterator.next().await.unwrap().unwrap();
    assert_eq!(entry.key, "v1");
    iterator.close().await.unwrap();
}

#[tokio::test]
async fn duplicate_reference_id_is_rejected() {
    let backend = MemoryBackend::new();
    let provider = Provider::new(backend, PAGE_SIZE);

    provider
        .set_store_config(VAULT_CONFIGURATION_STORE_NAME, vault_store_config())
        .await
        .unwrap();
    let config_store = provider
        .open_store(VAULT_CONFIGURATION_STORE_NAME)
        .await
        .unwrap();

    config_store
        .store_data_vault_configuration(&config("ref-a"), "v1")
        .await
        .unwrap();

    let err = config_store
        .store_data_vault_configuration(&config("ref-a"), "v2")
        .await
        .unwrap_err();
    assert!(matches!(err, EdvError::DuplicateVaultReferenceId(id) if id == "ref-a"));

    // A distinct reference id is still accepted.
    config_store
        .store_data_vault_configuration(&config("ref-b"), "v2")
        .await
        .unwrap();
}

#[tokio::test]
async fn blank_reference_id_is_rejected() {
    let backend = MemoryBackend::new();
    let provider = Provider::new(backend, PAGE_SIZE);

    provider
        .set_store_config(VAULT_CONFIGURATION_STORE_NAME, vault_store_config())
        .await
        .unwrap();
    let config_store = provider
        .open_store(VAULT_CONFIGURATION_STORE_NAME)
        .await
        .unwrap();

    let err = config_store
        .store_data_vault_configuration(&config(""), "v1")
        .await
        .unwrap_err();
    assert!(matches!(err, EdvError::InvalidVaultConfiguration(_)));
}
