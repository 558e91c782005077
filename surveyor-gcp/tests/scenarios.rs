//! End-to-end scenarios over the assembled inventory with a mock provider.
use std::sync::Arc;

use http::{Request, Response};
use serde_json::json;
use surveyor_client::{client::Body, Adapter, Client, QueryCache};
use surveyor_core::ScopeParams;

type ProviderHandle = tower_test::mock::Handle<Request<Body>, Response<Body>>;

fn testcontext() -> (Client, ProviderHandle) {
    let (mock_service, handle) = tower_test::mock::pair::<Request<Body>, Response<Body>>();
    (Client::new(mock_service), handle)
}

fn assembled(client: Client) -> Vec<Adapter> {
    surveyor_gcp::dynamic_adapters(
        &client,
        &ScopeParams::new("proj"),
        Arc::new(QueryCache::new()),
    )
    .expect("inventory assembles")
}

fn adapter_for<'a>(adapters: &'a [Adapter], item_type: &str) -> &'a Adapter {
    adapters
        .iter()
        .find(|a| a.item_type() == item_type)
        .unwrap_or_else(|| panic!("no adapter for {item_type}"))
}

#[tokio::test]
async fn inventory_assembles_and_registers_permissions() {
    let (client, _handle) = testcontext();
    let adapters = assembled(client);

    let types: Vec<&str> = adapters.iter().map(|a| a.item_type()).collect();
    for expected in [
        "gcp-storage-bucket",
        "gcp-bigquery-dataset",
        "gcp-bigquery-table",
        "gcp-pubsub-topic",
        "gcp-artifactregistry-docker-image",
        "gcp-kms-crypto-key",
        "gcp-kms-crypto-key-version",
    ] {
        assert!(types.contains(&expected), "missing {expected}");
    }
    // zonal metas cannot be assembled without a zone
    assert!(!types.contains(&"gcp-compute-disk"));
    for adapter in &adapters {
        assert!(adapter.metadata().supported_methods.get.is_some());
        assert_eq!(adapter.scopes()[0], "proj");
    }

    let registered = surveyor_client::permissions::registered();
    for permission in [
        "pubsub.topics.get",
        "bigquery.tables.list",
        "cloudkms.cryptoKeyVersions.get",
    ] {
        assert!(
            registered.contains(&permission.to_string()),
            "permission {permission} not registered"
        );
    }
}

#[tokio::test]
async fn dataset_identity_comes_from_its_reference() {
    let (client, mut handle) = testcontext();
    let adapters = assembled(client);

    let provider = tokio::spawn(async move {
        let (request, send) = handle.next_request().await.expect("get not called");
        assert_eq!(
            request.uri().to_string(),
            "https://bigquery.googleapis.com/bigquery/v2/projects/proj/datasets/billing"
        );
        let body = serde_json::to_vec(&json!({
            "kind": "bigquery#dataset",
            "id": "proj:billing",
            "datasetReference": {"projectId": "proj", "datasetId": "billing"},
            "location": "US",
            "defaultEncryptionConfiguration": {
                "kmsKeyName": "projects/proj/locations/us/keyRings/ring/cryptoKeys/key",
            },
            "labels": {"team": "data"},
        }))
        .unwrap();
        send.send_response(Response::builder().body(Body::from(body)).unwrap());
    });

    let dataset = adapter_for(&adapters, "gcp-bigquery-dataset");
    let item = dataset.get("proj", "billing").await.expect("dataset resolves");
    assert_eq!(item.unique_attribute, "uniqueAttributeValue");
    assert_eq!(item.unique_attribute_value(), Some("billing"));
    assert_eq!(item.tags.get("team").map(String::as_str), Some("data"));

    // the encryption key became a scoped composite link
    assert_eq!(item.linked_item_queries.len(), 1);
    let link = &item.linked_item_queries[0];
    assert_eq!(link.query.item_type, "gcp-kms-crypto-key");
    assert_eq!(link.query.query, "us|ring|key");
    assert_eq!(link.query.scope, "proj");
    provider.await.expect("provider scenario");
}

#[tokio::test]
async fn docker_image_terraform_search_returns_one_item() {
    let (client, mut handle) = testcontext();
    let adapters = assembled(client);

    let provider = tokio::spawn(async move {
        let (request, send) = handle.next_request().await.expect("get not called");
        assert_eq!(
            request.uri().to_string(),
            "https://artifactregistry.googleapis.com/v1/projects/proj/locations/us/repositories/images/dockerImages/api"
        );
        let body = serde_json::to_vec(&json!({
            "name": "projects/proj/locations/us/repositories/images/dockerImages/api",
            "uri": "us-docker.pkg.dev/proj/images/api",
            "tags": ["latest"],
        }))
        .unwrap();
        send.send_response(Response::builder().body(Body::from(body)).unwrap());
    });

    let images = adapter_for(&adapters, "gcp-artifactregistry-docker-image");
    let items = images
        .search(
            "proj",
            "projects/proj/locations/us/repositories/images/dockerImages/api",
        )
        .await
        .expect("terraform search resolves");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].unique_attribute_value(), Some("us|images|api"));
    provider.await.expect("provider scenario");
}

#[tokio::test]
async fn key_version_list_maps_state_to_health() {
    use surveyor_core::item::Health;

    let (client, mut handle) = testcontext();
    let adapters = assembled(client);

    let provider = tokio::spawn(async move {
        let (request, send) = handle.next_request().await.expect("list not called");
        assert_eq!(
            request.uri().to_string(),
            "https://cloudkms.googleapis.com/v1/projects/proj/locations/us/keyRings/ring/cryptoKeys/key/cryptoKeyVersions"
        );
        let body = serde_json::to_vec(&json!({
            "cryptoKeyVersions": [
                {
                    "name": "projects/proj/locations/us/keyRings/ring/cryptoKeys/key/cryptoKeyVersions/1",
                    "state": "ENABLED",
                },
                {
                    "name": "projects/proj/locations/us/keyRings/ring/cryptoKeys/key/cryptoKeyVersions/2",
                    "state": "DESTROYED",
                },
            ],
        }))
        .unwrap();
        send.send_response(Response::builder().body(Body::from(body)).unwrap());
    });

    let versions = adapter_for(&adapters, "gcp-kms-crypto-key-version");
    let items = versions
        .search("proj", "us|ring|key")
        .await
        .expect("search completes");
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].unique_attribute_value(), Some("us|ring|key|1"));
    assert_eq!(items[0].health, Some(Health::Ok));
    assert_eq!(items[1].health, Some(Health::Error));
    provider.await.expect("provider scenario");
}

#[tokio::test]
async fn disk_assembles_with_a_zone_and_links_its_key_and_users() {
    use surveyor_core::item::Health;

    let (client, mut handle) = testcontext();
    let params = ScopeParams::new("proj").zone("us-central1-a");
    let adapters =
        surveyor_gcp::dynamic_adapters(&client, &params, Arc::new(QueryCache::new()))
            .expect("inventory assembles");

    let provider = tokio::spawn(async move {
        let (request, send) = handle.next_request().await.expect("get not called");
        assert_eq!(
            request.uri().to_string(),
            "https://compute.googleapis.com/compute/v1/projects/proj/zones/us-central1-a/disks/data"
        );
        let body = serde_json::to_vec(&json!({
            "name": "data",
            "status": "READY",
            "sizeGb": "500",
            "users": ["projects/proj/zones/us-central1-a/instances/vm1"],
            "diskEncryptionKey": {
                "kmsKeyName": "projects/proj/locations/us/keyRings/ring/cryptoKeys/key",
            },
        }))
        .unwrap();
        send.send_response(Response::builder().body(Body::from(body)).unwrap());
    });

    let disks = adapter_for(&adapters, "gcp-compute-disk");
    assert_eq!(disks.scopes()[0], "proj.us-central1-a");
    let item = disks.get("proj.us-central1-a", "data").await.expect("disk resolves");
    assert_eq!(item.health, Some(Health::Ok));

    let links: Vec<(&str, &str, &str)> = item
        .linked_item_queries
        .iter()
        .map(|l| {
            (
                l.query.item_type.as_str(),
                l.query.query.as_str(),
                l.query.scope.as_str(),
            )
        })
        .collect();
    assert_eq!(
        links,
        vec![
            ("gcp-compute-instance", "vm1", "proj.us-central1-a"),
            ("gcp-kms-crypto-key", "us|ring|key", "proj"),
        ]
    );
    provider.await.expect("provider scenario");
}
