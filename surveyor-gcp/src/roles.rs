//! Predefined roles and the permissions they grant.
//!
//! Every adapter's declared permissions must be granted by its declared
//! role, so deploying with exactly these roles is known to cover the whole
//! inventory.
use surveyor_client::RoleTable;

/// The role table adapters validate against at construction.
pub fn role_table() -> RoleTable {
    RoleTable::new()
        .role(
            "roles/compute.viewer",
            [
                "compute.addresses.get",
                "compute.addresses.list",
                "compute.networks.get",
                "compute.networks.list",
                "compute.subnetworks.get",
                "compute.subnetworks.list",
                "compute.instances.get",
                "compute.instances.list",
                "compute.disks.get",
                "compute.disks.list",
            ],
        )
        .role(
            "roles/storage.admin",
            ["storage.buckets.get", "storage.buckets.list"],
        )
        .role(
            "roles/bigquery.metadataViewer",
            [
                "bigquery.datasets.get",
                "bigquery.tables.get",
                "bigquery.tables.list",
            ],
        )
        .role("roles/pubsub.viewer", ["pubsub.topics.get", "pubsub.topics.list"])
        .role(
            "roles/artifactregistry.reader",
            [
                "artifactregistry.dockerimages.get",
                "artifactregistry.dockerimages.list",
            ],
        )
        .role(
            "roles/cloudkms.viewer",
            [
                "cloudkms.cryptoKeys.get",
                "cloudkms.cryptoKeys.list",
                "cloudkms.cryptoKeyVersions.get",
                "cloudkms.cryptoKeyVersions.list",
            ],
        )
}
