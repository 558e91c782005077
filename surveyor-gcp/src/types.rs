//! Canonical item types served by the GCP inventory.
use surveyor_core::ItemType;

/// `gcp-compute-address`
pub fn compute_address() -> ItemType {
    ItemType::new("gcp", "compute", "address")
}

/// `gcp-compute-network`
pub fn compute_network() -> ItemType {
    ItemType::new("gcp", "compute", "network")
}

/// `gcp-compute-subnetwork`
pub fn compute_subnetwork() -> ItemType {
    ItemType::new("gcp", "compute", "subnetwork")
}

/// `gcp-compute-instance`
pub fn compute_instance() -> ItemType {
    ItemType::new("gcp", "compute", "instance")
}

/// `gcp-compute-disk`
pub fn compute_disk() -> ItemType {
    ItemType::new("gcp", "compute", "disk")
}

/// `gcp-storage-bucket`
pub fn storage_bucket() -> ItemType {
    ItemType::new("gcp", "storage", "bucket")
}

/// `gcp-bigquery-dataset`
pub fn bigquery_dataset() -> ItemType {
    ItemType::new("gcp", "bigquery", "dataset")
}

/// `gcp-bigquery-table`
pub fn bigquery_table() -> ItemType {
    ItemType::new("gcp", "bigquery", "table")
}

/// `gcp-pubsub-topic`
pub fn pubsub_topic() -> ItemType {
    ItemType::new("gcp", "pubsub", "topic")
}

/// `gcp-artifactregistry-docker-image`
pub fn artifactregistry_docker_image() -> ItemType {
    ItemType::new("gcp", "artifactregistry", "dockerImage")
}

/// `gcp-kms-crypto-key`
pub fn kms_crypto_key() -> ItemType {
    ItemType::new("gcp", "kms", "cryptoKey")
}

/// `gcp-kms-crypto-key-version`
pub fn kms_crypto_key_version() -> ItemType {
    ItemType::new("gcp", "kms", "cryptoKeyVersion")
}
