//! Cloud KMS crypto key versions, served by the dynamic engine.
use std::sync::Arc;

use surveyor_client::dynamic::AdapterMeta;
use surveyor_core::{AdapterCategory, ScopeParams, ScopeShape, TerraformMapping};

use crate::types;

/// `gcp-kms-crypto-key`: GET by `location|keyRing|cryptoKey`, SEARCH by
/// `location|keyRing`.
///
/// This is what disks, buckets and topics reference through their
/// `kmsKeyName`; the key links onward to its primary version.
pub fn crypto_key_meta() -> Arc<AdapterMeta> {
    Arc::new(
        AdapterMeta::new(
            types::kms_crypto_key(),
            ScopeShape::Project,
            AdapterCategory::Security,
            ["locations", "keyRings", "cryptoKeys"],
            Arc::new(|p: &ScopeParams, q: &[String]| {
                let [location, ring, key] = q else { return None };
                Some(format!(
                    "https://cloudkms.googleapis.com/v1/projects/{}/locations/{location}/keyRings/{ring}/cryptoKeys/{key}",
                    p.project_id
                ))
            }),
        )
        .search_endpoint(
            ["location", "keyRing"],
            Arc::new(|p: &ScopeParams, q: &[String]| {
                let [location, ring] = q else { return None };
                Some(format!(
                    "https://cloudkms.googleapis.com/v1/projects/{}/locations/{location}/keyRings/{ring}/cryptoKeys",
                    p.project_id
                ))
            }),
        )
        .items_key("cryptoKeys")
        .link("primary.name", types::kms_crypto_key_version().to_string())
        .iam(
            "roles/cloudkms.viewer",
            ["cloudkms.cryptoKeys.get", "cloudkms.cryptoKeys.list"],
        )
        .terraform_mapping(TerraformMapping::search("google_kms_crypto_key.id")),
    )
}

/// `gcp-kms-crypto-key-version`: GET by the four-part composite
/// `location|keyRing|cryptoKey|cryptoKeyVersion`, SEARCH by the key path.
pub fn crypto_key_version_meta() -> Arc<AdapterMeta> {
    Arc::new(
        AdapterMeta::new(
            types::kms_crypto_key_version(),
            ScopeShape::Project,
            AdapterCategory::Security,
            ["locations", "keyRings", "cryptoKeys", "cryptoKeyVersions"],
            Arc::new(|p: &ScopeParams, q: &[String]| {
                let [location, ring, key, version] = q else { return None };
                Some(format!(
                    "https://cloudkms.googleapis.com/v1/projects/{}/locations/{location}/keyRings/{ring}/cryptoKeys/{key}/cryptoKeyVersions/{version}",
                    p.project_id
                ))
            }),
        )
        .search_endpoint(
            ["location", "keyRing", "cryptoKey"],
            Arc::new(|p: &ScopeParams, q: &[String]| {
                let [location, ring, key] = q else { return None };
                Some(format!(
                    "https://cloudkms.googleapis.com/v1/projects/{}/locations/{location}/keyRings/{ring}/cryptoKeys/{key}/cryptoKeyVersions",
                    p.project_id
                ))
            }),
        )
        .items_key("cryptoKeyVersions")
        .health_from_status_field("state")
        .iam(
            "roles/cloudkms.viewer",
            [
                "cloudkms.cryptoKeyVersions.get",
                "cloudkms.cryptoKeyVersions.list",
            ],
        )
        .terraform_mapping(TerraformMapping::search("google_kms_crypto_key_version.id")),
    )
}
