//! GCP inventory for the surveyor discovery engine.
//!
//! Two kinds of adapters live here: handcrafted wrappers over typed SDK
//! surfaces ([`compute`]) and declarative [`AdapterMeta`] entries the
//! dynamic engine turns into adapters ([`compute::disk`], [`storage`],
//! [`bigquery`], [`pubsub`], [`artifactregistry`], [`kms`]). Both link
//! through the shared [`links::link_registry`] and validate against
//! [`roles::role_table`].
use std::sync::Arc;

use surveyor_client::{
    dynamic::{AdapterMeta, DynamicAdapter},
    linker::Linker,
    permissions, Adapter, AdapterError, Client, QueryCache,
};
use surveyor_core::ScopeParams;
use thiserror::Error;

pub mod artifactregistry;
pub mod bigquery;
pub mod compute;
pub mod kms;
pub mod links;
pub mod pubsub;
pub mod roles;
pub mod storage;
pub mod types;

/// Environment variable carrying the project to discover.
pub const PROJECT_ID_ENV: &str = "GCP_PROJECT_ID";
/// Environment variable carrying the region for regional adapters.
pub const REGION_ENV: &str = "GCP_REGION";
/// Environment variable carrying the zone for zonal adapters.
pub const ZONE_ENV: &str = "GCP_ZONE";

/// Why the inventory could not be assembled.
#[derive(Debug, Error)]
pub enum SetupError {
    /// A required environment variable is unset.
    #[error("environment variable {name} is not set")]
    MissingEnv {
        /// The variable name
        name: &'static str,
    },
    /// An adapter failed construction-time validation.
    #[error(transparent)]
    Adapter(#[from] AdapterError),
}

/// Read the scope parameters from the environment contract.
///
/// The project is required; region and zone are optional and gate which
/// regional/zonal adapters can be assembled.
pub fn scope_params_from_env() -> Result<ScopeParams, SetupError> {
    let project_id = std::env::var(PROJECT_ID_ENV)
        .map_err(|_| SetupError::MissingEnv { name: PROJECT_ID_ENV })?;
    let mut params = ScopeParams::new(project_id);
    if let Ok(region) = std::env::var(REGION_ENV) {
        params = params.region(region);
    }
    if let Ok(zone) = std::env::var(ZONE_ENV) {
        params = params.zone(zone);
    }
    Ok(params)
}

/// Every dynamic adapter meta in the inventory.
pub fn metas() -> Vec<Arc<AdapterMeta>> {
    vec![
        compute::disk::disk_meta(),
        storage::bucket_meta(),
        bigquery::dataset_meta(),
        bigquery::table_meta(),
        pubsub::topic_meta(),
        artifactregistry::docker_image_meta(),
        kms::crypto_key_meta(),
        kms::crypto_key_version_meta(),
    ]
}

/// A linker over the inventory's link registry.
pub fn linker() -> Linker {
    Linker::new(Arc::new(links::link_registry()))
}

/// Assemble the dynamic adapters for the bound parameters.
///
/// Metas still in development, or whose scope the parameters cannot
/// produce, are skipped. Every assembled adapter is validated against the
/// role table and has its IAM permissions registered process-wide.
pub fn dynamic_adapters(
    client: &Client,
    params: &ScopeParams,
    cache: Arc<QueryCache>,
) -> Result<Vec<Adapter>, SetupError> {
    assemble(metas(), client, params, cache)
}

/// [`dynamic_adapters`] over an explicit meta set.
pub fn assemble(
    metas: Vec<Arc<AdapterMeta>>,
    client: &Client,
    params: &ScopeParams,
    cache: Arc<QueryCache>,
) -> Result<Vec<Adapter>, SetupError> {
    let linker = linker();
    let roles = roles::role_table();
    let mut adapters = Vec::new();
    for meta in metas {
        if meta.in_development {
            tracing::debug!(item_type = %meta.item_type, "skipping in-development adapter");
            continue;
        }
        if meta.scope.scope_for(params).is_none() {
            tracing::debug!(item_type = %meta.item_type, "scope parameters cannot address adapter");
            continue;
        }
        let dynamic = DynamicAdapter::new(meta, params.clone(), client.clone(), linker.clone())?;
        let adapter = Adapter::with_role_table(dynamic.into_wrapper(), cache.clone(), &roles)?;
        permissions::register(adapter.iam_permissions());
        adapters.push(adapter);
    }
    Ok(adapters)
}
