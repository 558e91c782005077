//! Pub/Sub topics, served by the dynamic engine.
use std::sync::Arc;

use surveyor_client::dynamic::AdapterMeta;
use surveyor_core::{AdapterCategory, ScopeParams, ScopeShape, TerraformMapping};

use crate::types;

/// `gcp-pubsub-topic`: GET by short name, LIST in project.
///
/// Topic names come back fully qualified (`projects/p/topics/t`); the engine
/// collapses them to the short name.
pub fn topic_meta() -> Arc<AdapterMeta> {
    Arc::new(
        AdapterMeta::new(
            types::pubsub_topic(),
            ScopeShape::Project,
            AdapterCategory::Messaging,
            ["topics"],
            Arc::new(|p: &ScopeParams, q: &[String]| {
                let [topic] = q else { return None };
                Some(format!(
                    "https://pubsub.googleapis.com/v1/projects/{}/topics/{topic}",
                    p.project_id
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
        .link("kmsKeyName", types::kms_crypto_key().to_string())
        .iam("roles/pubsub.viewer", ["pubsub.topics.get", "pubsub.topics.list"])
        .terraform_mapping(TerraformMapping::get("google_pubsub_topic.name")),
    )
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn endpoint_shapes_are_bit_exact() {
        let params = ScopeParams::new("proj");
        let meta = topic_meta();
        assert_eq!(
            (meta.get_endpoint)(&params, &["events".to_string()]).unwrap(),
            "https://pubsub.googleapis.com/v1/projects/proj/topics/events"
        );
        assert_eq!(
            meta.list_endpoint.as_ref().unwrap()(&params).unwrap(),
            "https://pubsub.googleapis.com/v1/projects/proj/topics"
        );
    }
}
