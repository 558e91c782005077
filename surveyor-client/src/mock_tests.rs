//! Scenario tests for the dynamic engine against a mock provider.
use std::sync::Arc;

use futures::{StreamExt, TryStreamExt};
use http::{Request, Response, StatusCode};
use serde_json::{json, Value};
use surveyor_core::{
    item::BlastPropagation, AdapterCategory, ItemType, QueryErrorKind, ScopeParams, ScopeShape,
    TerraformMapping,
};
use tokio_util::sync::CancellationToken;

use crate::{
    adapter::Adapter,
    cache::QueryCache,
    client::{Body, Client},
    dynamic::{AdapterMeta, DynamicAdapter},
    linker::{LinkRegistry, Linker},
    params::QueryParams,
};

type ProviderHandle = tower_test::mock::Handle<Request<Body>, Response<Body>>;

fn testcontext() -> (Client, ProviderHandle) {
    let (mock_service, handle) = tower_test::mock::pair::<Request<Body>, Response<Body>>();
    (Client::new(mock_service), handle)
}

fn respond(send: tower_test::mock::SendResponse<Response<Body>>, body: Value) {
    let bytes = serde_json::to_vec(&body).expect("serializable response");
    send.send_response(Response::builder().body(Body::from(bytes)).expect("response"));
}

fn respond_status(
    send: tower_test::mock::SendResponse<Response<Body>>,
    status: StatusCode,
    body: Value,
) {
    let bytes = serde_json::to_vec(&body).expect("serializable response");
    send.send_response(
        Response::builder()
            .status(status)
            .body(Body::from(bytes))
            .expect("response"),
    );
}

fn link_registry() -> Arc<LinkRegistry> {
    Arc::new(
        LinkRegistry::new()
            .composite_target("gcp-kms-crypto-key", ScopeShape::Project, 3)
            .blast(
                "gcp-pubsub-topic",
                "gcp-kms-crypto-key",
                BlastPropagation::inward(),
            ),
    )
}

fn topic_meta() -> Arc<AdapterMeta> {
    Arc::new(
        AdapterMeta::new(
            ItemType::new("gcp", "pubsub", "topic"),
            ScopeShape::Project,
            AdapterCategory::Messaging,
            ["topics"],
            Arc::new(|p: &ScopeParams, q: &[String]| {
                Some(format!(
                    "https://pubsub.googleapis.com/v1/projects/{}/topics/{}",
                    p.project_id, q[0]
                ))
            }),
        )
        .list_endpoint(Arc::new(|p: &ScopeParams| {
            Some(format!(
                "https://pubsub.googleapis.com/v1/projects/{}/topics",
                p.project_id
            ))
        }))
        .items_key("topics")
        .link("kmsKeyName", "gcp-kms-crypto-key"),
    )
}

fn topic_adapter(client: Client) -> Adapter {
    let dynamic = DynamicAdapter::new(
        topic_meta(),
        ScopeParams::new("proj"),
        client,
        Linker::new(link_registry()),
    )
    .expect("project scope derivable");
    Adapter::new(dynamic.into_wrapper(), Arc::new(QueryCache::new())).expect("valid adapter")
}

fn docker_image_meta() -> Arc<AdapterMeta> {
    Arc::new(
        AdapterMeta::new(
            ItemType::new("gcp", "artifactregistry", "dockerImage"),
            ScopeShape::Project,
            AdapterCategory::Storage,
            ["locations", "repositories", "dockerImages"],
            Arc::new(|p: &ScopeParams, q: &[String]| {
                Some(format!(
                    "https://artifactregistry.googleapis.com/v1/projects/{}/locations/{}/repositories/{}/dockerImages/{}",
                    p.project_id, q[0], q[1], q[2]
                ))
            }),
        )
        .search_endpoint(
            ["location", "repository"],
            Arc::new(|p: &ScopeParams, q: &[String]| {
                Some(format!(
                    "https://artifactregistry.googleapis.com/v1/projects/{}/locations/{}/repositories/{}/dockerImages",
                    p.project_id, q[0], q[1]
                ))
            }),
        )
        .items_key("dockerImages")
        .terraform_mapping(TerraformMapping::search(
            "google_artifact_registry_docker_image.name",
        )),
    )
}

fn docker_image_adapter(client: Client) -> Adapter {
    let dynamic = DynamicAdapter::new(
        docker_image_meta(),
        ScopeParams::new("proj"),
        client,
        Linker::new(link_registry()),
    )
    .expect("project scope derivable");
    Adapter::new(dynamic.into_wrapper(), Arc::new(QueryCache::new())).expect("valid adapter")
}

#[tokio::test]
async fn get_transforms_tags_and_links() {
    let (client, mut handle) = testcontext();
    let adapter = topic_adapter(client);

    let provider = tokio::spawn(async move {
        let (request, send) = handle.next_request().await.expect("get not called");
        assert_eq!(
            request.uri().to_string(),
            "https://pubsub.googleapis.com/v1/projects/proj/topics/t1"
        );
        respond(
            send,
            json!({
                "name": "projects/proj/topics/t1",
                "labels": {"env": "prod"},
                "kmsKeyName": "projects/proj/locations/us/keyRings/ring/cryptoKeys/key",
            }),
        );
    });

    let item = adapter.get("proj", "t1").await.expect("topic resolves");
    assert_eq!(item.item_type, "gcp-pubsub-topic");
    assert_eq!(item.scope, "proj");
    // full resource names collapse to the final component
    assert_eq!(item.unique_attribute_value(), Some("t1"));
    // labels land on tags, not attributes
    assert!(item.attributes.get("labels").is_none());
    assert_eq!(item.tags.get("env").map(String::as_str), Some("prod"));
    // the kms reference became a scoped composite link
    assert_eq!(item.linked_item_queries.len(), 1);
    let link = &item.linked_item_queries[0];
    assert_eq!(link.query.item_type, "gcp-kms-crypto-key");
    assert_eq!(link.query.query, "us|ring|key");
    assert_eq!(link.query.scope, "proj");
    assert_eq!(link.blast_propagation, BlastPropagation::inward());
    provider.await.expect("provider scenario");
}

#[tokio::test]
async fn list_follows_page_tokens_to_completion() {
    let (client, mut handle) = testcontext();
    let adapter = topic_adapter(client);

    let provider = tokio::spawn(async move {
        let (request, send) = handle.next_request().await.expect("first page not requested");
        let uri = request.uri().to_string();
        assert!(!uri.contains("pageToken="), "first request carries no token");
        let topics: Vec<Value> = (0..100)
            .map(|i| json!({"name": format!("projects/proj/topics/t{i}")}))
            .collect();
        respond(send, json!({"topics": topics, "nextPageToken": "tok"}));

        let (request, send) = handle.next_request().await.expect("second page not requested");
        assert!(request.uri().to_string().contains("pageToken=tok"));
        respond(send, json!({"topics": [{"name": "projects/proj/topics/last"}]}));
    });

    let items = adapter.list("proj").await.expect("list completes");
    assert_eq!(items.len(), 101);
    assert_eq!(items[0].unique_attribute_value(), Some("t0"));
    assert_eq!(items[100].unique_attribute_value(), Some("last"));
    provider.await.expect("provider scenario");
}

#[tokio::test]
async fn list_stream_emits_pages_as_they_arrive() {
    let (client, mut handle) = testcontext();
    let adapter = topic_adapter(client);

    let provider = tokio::spawn(async move {
        let (_, send) = handle.next_request().await.expect("first page not requested");
        let topics: Vec<Value> = (0..100)
            .map(|i| json!({"name": format!("projects/proj/topics/t{i}")}))
            .collect();
        respond(send, json!({"topics": topics, "nextPageToken": "tok"}));
        let (_, send) = handle.next_request().await.expect("second page not requested");
        respond(send, json!({"topics": [{"name": "projects/proj/topics/last"}]}));
    });

    let items: Vec<_> = adapter
        .list_stream("proj", &QueryParams::default())
        .try_collect()
        .await
        .expect("stream completes");
    assert_eq!(items.len(), 101);
    provider.await.expect("provider scenario");
}

#[tokio::test]
async fn cancellation_stops_pagination_with_a_cancellation_error() {
    let (client, mut handle) = testcontext();
    let adapter = topic_adapter(client);
    let cancel = CancellationToken::new();
    let params = QueryParams::default().cancel(cancel.clone());

    let provider = tokio::spawn(async move {
        // Only the first page is ever served.
        let (_, send) = handle.next_request().await.expect("first page not requested");
        respond(
            send,
            json!({
                "topics": [{"name": "projects/proj/topics/t0"}],
                "nextPageToken": "tok",
            }),
        );
    });

    let mut stream = adapter.list_stream("proj", &params);
    let first = stream.next().await.expect("one item emitted");
    assert_eq!(
        first.expect("first item ok").unique_attribute_value(),
        Some("t0")
    );

    cancel.cancel();
    let err = stream
        .next()
        .await
        .expect("cancellation event")
        .expect_err("cancellation is an error");
    assert_eq!(err.kind, QueryErrorKind::Other);
    assert!(err.message.contains("cancelled"));
    assert!(stream.next().await.is_none(), "stream ends after the error");
    provider.await.expect("provider scenario");
}

#[tokio::test]
async fn provider_404_maps_to_notfound_with_the_provider_message() {
    let (client, mut handle) = testcontext();
    let adapter = topic_adapter(client);

    let provider = tokio::spawn(async move {
        let (_, send) = handle.next_request().await.expect("get not called");
        respond_status(
            send,
            StatusCode::NOT_FOUND,
            json!({"error": {"code": 404, "message": "Resource not found (resource=missing)."}}),
        );
    });

    let err = adapter.get("proj", "missing").await.unwrap_err();
    assert_eq!(err.kind, QueryErrorKind::NotFound);
    assert_eq!(err.message, "Resource not found (resource=missing).");
    assert_eq!(err.source_name.as_deref(), Some("gcp-pubsub-topic"));
    assert_eq!(err.scope.as_deref(), Some("proj"));
    provider.await.expect("provider scenario");
}

#[tokio::test]
async fn provider_401_maps_to_auth() {
    let (client, mut handle) = testcontext();
    let adapter = topic_adapter(client);

    let provider = tokio::spawn(async move {
        let (_, send) = handle.next_request().await.expect("get not called");
        respond_status(
            send,
            StatusCode::UNAUTHORIZED,
            json!({"error": {"message": "Request had invalid authentication credentials."}}),
        );
    });

    let err = adapter.get("proj", "t1").await.unwrap_err();
    assert_eq!(err.kind, QueryErrorKind::Auth);
    provider.await.expect("provider scenario");
}

#[tokio::test]
async fn terraform_search_routes_to_get_and_returns_one_item() {
    let (client, mut handle) = testcontext();
    let adapter = docker_image_adapter(client);

    let provider = tokio::spawn(async move {
        let (request, send) = handle.next_request().await.expect("get not called");
        assert_eq!(
            request.uri().to_string(),
            "https://artifactregistry.googleapis.com/v1/projects/proj/locations/L/repositories/R/dockerImages/IMG"
        );
        respond(
            send,
            json!({
                "name": "projects/proj/locations/L/repositories/R/dockerImages/IMG",
                "uri": "us-docker.pkg.dev/proj/R/IMG",
            }),
        );
    });

    let items = adapter
        .search("proj", "projects/P/locations/L/repositories/R/dockerImages/IMG")
        .await
        .expect("terraform search resolves");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].unique_attribute_value(), Some("L|R|IMG"));
    assert_eq!(items[0].unique_attribute, "uniqueAttributeValue");
    provider.await.expect("provider scenario");
}

#[tokio::test]
async fn composite_search_paginates_the_search_endpoint() {
    let (client, mut handle) = testcontext();
    let adapter = docker_image_adapter(client);

    let provider = tokio::spawn(async move {
        let (request, send) = handle.next_request().await.expect("search not called");
        assert_eq!(
            request.uri().to_string(),
            "https://artifactregistry.googleapis.com/v1/projects/proj/locations/L/repositories/R/dockerImages"
        );
        respond(
            send,
            json!({
                "dockerImages": [
                    {"name": "projects/proj/locations/L/repositories/R/dockerImages/a"},
                ],
                "nextPageToken": "more",
            }),
        );
        let (request, send) = handle.next_request().await.expect("second page not requested");
        assert!(request.uri().to_string().contains("pageToken=more"));
        respond(
            send,
            json!({
                "dockerImages": [
                    {"name": "projects/proj/locations/L/repositories/R/dockerImages/b"},
                ],
            }),
        );
    });

    let items = adapter.search("proj", "L|R").await.expect("search completes");
    let uniques: Vec<_> = items
        .iter()
        .map(|i| i.unique_attribute_value().unwrap_or_default())
        .collect();
    assert_eq!(uniques, vec!["L|R|a", "L|R|b"]);
    provider.await.expect("provider scenario");
}

#[tokio::test]
async fn composite_search_arity_is_validated_locally() {
    let (client, _handle) = testcontext();
    let adapter = docker_image_adapter(client);

    let err = adapter.search("proj", "only-location").await.unwrap_err();
    assert_eq!(err.kind, QueryErrorKind::NotFound);
    assert!(err.message.contains("invalid search query format"));
}

#[tokio::test]
async fn mid_pagination_failure_keeps_emitted_items_and_forwards_the_error() {
    let (client, mut handle) = testcontext();
    let adapter = topic_adapter(client);

    let provider = tokio::spawn(async move {
        let (_, send) = handle.next_request().await.expect("first page not requested");
        respond(
            send,
            json!({
                "topics": [{"name": "projects/proj/topics/t0"}],
                "nextPageToken": "tok",
            }),
        );
        let (_, send) = handle.next_request().await.expect("second page not requested");
        respond_status(
            send,
            StatusCode::SERVICE_UNAVAILABLE,
            json!({"error": {"message": "backend unavailable"}}),
        );
    });

    let mut stream = adapter.list_stream("proj", &QueryParams::default());
    let first = stream.next().await.expect("first item emitted");
    assert!(first.is_ok());
    let err = stream
        .next()
        .await
        .expect("error event")
        .expect_err("second page failed");
    assert_eq!(err.kind, QueryErrorKind::Other);
    assert!(err.message.contains("(retryable)"));
    assert!(stream.next().await.is_none());
    provider.await.expect("provider scenario");
}
