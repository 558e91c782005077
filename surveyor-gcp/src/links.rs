//! The static link registry: target scope shapes and blast propagation.
//!
//! Blast directions follow the dependency: when an item cannot work without
//! its target (a subnetwork without its network, a topic without its KMS
//! key), the target's failures propagate inward. Peered networks affect each
//! other, so they propagate both ways.
use surveyor_client::linker::LinkRegistry;
use surveyor_core::{item::BlastPropagation, ScopeShape};

use crate::types;

/// Build the registry every GCP adapter links through.
pub fn link_registry() -> LinkRegistry {
    let address = types::compute_address().to_string();
    let network = types::compute_network().to_string();
    let subnetwork = types::compute_subnetwork().to_string();
    let instance = types::compute_instance().to_string();
    let disk = types::compute_disk().to_string();
    let bucket = types::storage_bucket().to_string();
    let dataset = types::bigquery_dataset().to_string();
    let table = types::bigquery_table().to_string();
    let topic = types::pubsub_topic().to_string();
    let docker_image = types::artifactregistry_docker_image().to_string();
    let key = types::kms_crypto_key().to_string();
    let key_version = types::kms_crypto_key_version().to_string();

    LinkRegistry::new()
        .target(network.as_str(), ScopeShape::Project)
        .target(subnetwork.as_str(), ScopeShape::Regional)
        .target(address.as_str(), ScopeShape::Regional)
        .target(instance.as_str(), ScopeShape::Zonal)
        .target(disk.as_str(), ScopeShape::Zonal)
        .target(bucket.as_str(), ScopeShape::Project)
        .target(dataset.as_str(), ScopeShape::Project)
        .composite_target(table.as_str(), ScopeShape::Project, 2)
        .target(topic.as_str(), ScopeShape::Project)
        .composite_target(docker_image.as_str(), ScopeShape::Project, 3)
        .composite_target(key.as_str(), ScopeShape::Project, 3)
        .composite_target(key_version.as_str(), ScopeShape::Project, 4)
        .blast(address.as_str(), network.as_str(), BlastPropagation::inward())
        .blast(address.as_str(), subnetwork.as_str(), BlastPropagation::inward())
        .blast(subnetwork.as_str(), network.as_str(), BlastPropagation::inward())
        .blast(network.as_str(), network.as_str(), BlastPropagation::both())
        .blast(network.as_str(), subnetwork.as_str(), BlastPropagation::outward())
        .blast(instance.as_str(), network.as_str(), BlastPropagation::inward())
        .blast(instance.as_str(), subnetwork.as_str(), BlastPropagation::inward())
        .blast(instance.as_str(), disk.as_str(), BlastPropagation::inward())
        .blast(disk.as_str(), instance.as_str(), BlastPropagation::outward())
        .blast(disk.as_str(), key.as_str(), BlastPropagation::inward())
        .blast(bucket.as_str(), key.as_str(), BlastPropagation::inward())
        .blast(table.as_str(), dataset.as_str(), BlastPropagation::inward())
        .blast(dataset.as_str(), key.as_str(), BlastPropagation::inward())
        .blast(topic.as_str(), key.as_str(), BlastPropagation::inward())
        .blast(key.as_str(), key_version.as_str(), BlastPropagation::inward())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn registry_covers_every_emitted_pair() {
        let registry = link_registry();
        for (from, to) in [
            ("gcp-compute-address", "gcp-compute-network"),
            ("gcp-compute-address", "gcp-compute-subnetwork"),
            ("gcp-compute-subnetwork", "gcp-compute-network"),
            ("gcp-compute-network", "gcp-compute-network"),
            ("gcp-compute-instance", "gcp-compute-subnetwork"),
            ("gcp-compute-instance", "gcp-compute-disk"),
            ("gcp-compute-disk", "gcp-kms-crypto-key"),
            ("gcp-storage-bucket", "gcp-kms-crypto-key"),
            ("gcp-bigquery-table", "gcp-bigquery-dataset"),
            ("gcp-pubsub-topic", "gcp-kms-crypto-key"),
            ("gcp-kms-crypto-key", "gcp-kms-crypto-key-version"),
        ] {
            assert!(registry.blast_for(from, to).is_some(), "missing {from} -> {to}");
        }
    }

    #[test]
    fn composite_targets_carry_their_arity() {
        let registry = link_registry();
        let spec = registry.target_spec("gcp-kms-crypto-key-version").unwrap();
        assert_eq!(spec.key_count, 4);
        assert_eq!(spec.shape, ScopeShape::Project);
    }
}
