//! Artifact Registry docker images, served by the dynamic engine.
use std::sync::Arc;

use surveyor_client::dynamic::AdapterMeta;
use surveyor_core::{AdapterCategory, ScopeParams, ScopeShape, TerraformMapping};

use crate::types;

/// `gcp-artifactregistry-docker-image`: GET by
/// `location|repository|dockerImage`, SEARCH by `location|repository`.
///
/// Terraform state stores image addresses as full resource paths, which the
/// facade resolves through GET.
pub fn docker_image_meta() -> Arc<AdapterMeta> {
    Arc::new(
        AdapterMeta::new(
            types::artifactregistry_docker_image(),
            ScopeShape::Project,
            AdapterCategory::Storage,
            ["locations", "repositories", "dockerImages"],
            Arc::new(|p: &ScopeParams, q: &[String]| {
                let [location, repository, image] = q else { return None };
                Some(format!(
                    "https://artifactregistry.googleapis.com/v1/projects/{}/locations/{location}/repositories/{repository}/dockerImages/{image}",
                    p.project_id
                ))
            }),
        )
        .search_endpoint(
            ["location", "repository"],
            Arc::new(|p: &ScopeParams, q: &[String]| {
                let [location, repository] = q else { return None };
                Some(format!(
                    "https://artifactregistry.googleapis.com/v1/projects/{}/locations/{location}/repositories/{repository}/dockerImages",
                    p.project_id
                ))
            }),
        )
        .items_key("dockerImages")
        .iam(
            "roles/artifactregistry.reader",
            [
                "artifactregistry.dockerimages.get",
                "artifactregistry.dockerimages.list",
            ],
        )
        .terraform_mapping(TerraformMapping::search(
            "google_artifact_registry_docker_image.name",
        )),
    )
}
