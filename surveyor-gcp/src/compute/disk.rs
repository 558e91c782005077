//! Compute persistent disks, served by the dynamic engine.
//!
//! Disks sit next to the handcrafted compute wrappers to show both modes
//! coexisting within one API: the engine derives this adapter entirely from
//! the meta below.
use std::sync::Arc;

use surveyor_client::dynamic::AdapterMeta;
use surveyor_core::{AdapterCategory, ScopeParams, ScopeShape, TerraformMapping};

use crate::types;

/// `gcp-compute-disk`: GET by name, LIST in zone.
pub fn disk_meta() -> Arc<AdapterMeta> {
    Arc::new(
        AdapterMeta::new(
            types::compute_disk(),
            ScopeShape::Zonal,
            AdapterCategory::Storage,
            ["disks"],
            Arc::new(|p: &ScopeParams, q: &[String]| {
                let [disk] = q else { return None };
                let zone = p.zone.as_deref()?;
                Some(format!(
                    "https://compute.googleapis.com/compute/v1/projects/{}/zones/{zone}/disks/{disk}",
                    p.project_id
                ))
            }),
        )
        .list_endpoint(Arc::new(|p: &ScopeParams| {
            let zone = p.zone.as_deref()?;
            Some(format!(
                "https://compute.googleapis.com/compute/v1/projects/{}/zones/{zone}/disks",
                p.project_id
            ))
        }))
        .health_from_status_field("status")
        .link("users", types::compute_instance().to_string())
        .link("diskEncryptionKey.kmsKeyName", types::kms_crypto_key().to_string())
        .iam("roles/compute.viewer", ["compute.disks.get", "compute.disks.list"])
        .terraform_mapping(TerraformMapping::get("google_compute_disk.name")),
    )
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn endpoint_shapes_are_bit_exact() {
        let params = ScopeParams::new("proj").zone("us-central1-a");
        let meta = disk_meta();
        assert_eq!(
            (meta.get_endpoint)(&params, &["data".to_string()]).unwrap(),
            "https://compute.googleapis.com/compute/v1/projects/proj/zones/us-central1-a/disks/data"
        );
        assert_eq!(
            meta.list_endpoint.as_ref().unwrap()(&params).unwrap(),
            "https://compute.googleapis.com/compute/v1/projects/proj/zones/us-central1-a/disks"
        );
    }

    #[test]
    fn endpoints_need_a_zone() {
        let params = ScopeParams::new("proj");
        let meta = disk_meta();
        assert!((meta.get_endpoint)(&params, &["data".to_string()]).is_none());
        assert!(meta.list_endpoint.as_ref().unwrap()(&params).is_none());
    }
}
