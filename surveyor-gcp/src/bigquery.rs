//! BigQuery datasets and tables, served by the dynamic engine.
//!
//! BigQuery payloads carry no `name`; identity lives on the reference
//! objects, so both metas override the unique-value derivation.
use std::sync::Arc;

use serde_json::{Map, Value};
use surveyor_client::dynamic::AdapterMeta;
use surveyor_core::{
    composite_lookup_key, AdapterCategory, ScopeParams, ScopeShape, TerraformMapping,
};

use crate::types;

/// `gcp-bigquery-dataset`: GET by dataset id, LIST in project.
pub fn dataset_meta() -> Arc<AdapterMeta> {
    Arc::new(
        AdapterMeta::new(
            types::bigquery_dataset(),
            ScopeShape::Project,
            AdapterCategory::Database,
            ["datasets"],
            Arc::new(|p: &ScopeParams, q: &[String]| {
                let [dataset] = q else { return None };
                Some(format!(
                    "https://bigquery.googleapis.com/bigquery/v2/projects/{}/datasets/{dataset}",
                    p.project_id
                ))
            }),
        )
        .list_endpoint(Arc::new(|p: &ScopeParams| {
            Some(format!(
                "https://bigquery.googleapis.com/bigquery/v2/projects/{}/datasets",
                p.project_id
            ))
        }))
        .items_key("datasets")
        .unique_value(Arc::new(|attributes: &Map<String, Value>| {
            attributes
                .get("datasetReference")?
                .get("datasetId")?
                .as_str()
                .map(String::from)
        }))
        .link(
            "defaultEncryptionConfiguration.kmsKeyName",
            types::kms_crypto_key().to_string(),
        )
        .iam("roles/bigquery.metadataViewer", ["bigquery.datasets.get"])
        .terraform_mapping(TerraformMapping::get("google_bigquery_dataset.dataset_id")),
    )
}

/// `gcp-bigquery-table`: GET by `dataset|table`, SEARCH by dataset.
pub fn table_meta() -> Arc<AdapterMeta> {
    Arc::new(
        AdapterMeta::new(
            types::bigquery_table(),
            ScopeShape::Project,
            AdapterCategory::Database,
            ["datasets", "tables"],
            Arc::new(|p: &ScopeParams, q: &[String]| {
                let [dataset, table] = q else { return None };
                Some(format!(
                    "https://bigquery.googleapis.com/bigquery/v2/projects/{}/datasets/{dataset}/tables/{table}",
                    p.project_id
                ))
            }),
        )
        .search_endpoint(
            ["dataset"],
            Arc::new(|p: &ScopeParams, q: &[String]| {
                let [dataset] = q else { return None };
                Some(format!(
                    "https://bigquery.googleapis.com/bigquery/v2/projects/{}/datasets/{dataset}/tables",
                    p.project_id
                ))
            }),
        )
        .items_key("tables")
        .unique_value(Arc::new(|attributes: &Map<String, Value>| {
            let reference = attributes.get("tableReference")?;
            let dataset = reference.get("datasetId")?.as_str()?;
            let table = reference.get("tableId")?.as_str()?;
            Some(composite_lookup_key(&[dataset, table]))
        }))
        .link("tableReference.datasetId", types::bigquery_dataset().to_string())
        .iam(
            "roles/bigquery.metadataViewer",
            ["bigquery.tables.get", "bigquery.tables.list"],
        )
        .terraform_mapping(TerraformMapping::search("google_bigquery_table.id")),
    )
}
