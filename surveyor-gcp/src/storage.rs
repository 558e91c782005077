//! Cloud Storage buckets, served by the dynamic engine.
use std::sync::Arc;

use surveyor_client::dynamic::AdapterMeta;
use surveyor_core::{AdapterCategory, ScopeParams, ScopeShape, TerraformMapping};

use crate::types;

/// `gcp-storage-bucket`: GET by bucket name, LIST in project.
///
/// The list endpoint addresses the project through a query parameter, so
/// page tokens are appended with `&`.
pub fn bucket_meta() -> Arc<AdapterMeta> {
    Arc::new(
        AdapterMeta::new(
            types::storage_bucket(),
            ScopeShape::Project,
            AdapterCategory::Storage,
            ["buckets"],
            Arc::new(|_: &ScopeParams, q: &[String]| {
                let [bucket] = q else { return None };
                Some(format!("https://storage.googleapis.com/storage/v1/b/{bucket}"))
            }),
        )
        .list_endpoint(Arc::new(|p: &ScopeParams| {
            Some(format!(
                "https://storage.googleapis.com/storage/v1/b?project={}",
                p.project_id
            ))
        }))
        .link(
            "encryption.defaultKmsKeyName",
            types::kms_crypto_key().to_string(),
        )
        .iam("roles/storage.admin", ["storage.buckets.get", "storage.buckets.list"])
        .terraform_mapping(TerraformMapping::get("google_storage_bucket.name")),
    )
}
