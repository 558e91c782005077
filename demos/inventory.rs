//! Print the assembled inventory: every adapter, its scope, methods and
//! potential links. Needs `GCP_PROJECT_ID` (plus `GCP_REGION`/`GCP_ZONE`
//! for regional and zonal adapters); no credentials required since nothing
//! is queried.
use std::sync::Arc;

use anyhow::Result;
use surveyor::{ClientBuilder, QueryCache};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let params = surveyor::gcp::scope_params_from_env()?;
    let client = ClientBuilder::https(None)?.build();
    let cache = Arc::new(QueryCache::new());

    for adapter in surveyor::gcp::dynamic_adapters(&client, &params, cache)? {
        let metadata = adapter.metadata();
        println!("{} ({})", metadata.descriptive_name, adapter.name());
        println!("  scopes: {}", adapter.scopes().join(", "));
        for description in [
            metadata.supported_methods.get.as_deref(),
            metadata.supported_methods.list.as_deref(),
            metadata.supported_methods.search.as_deref(),
        ]
        .into_iter()
        .flatten()
        {
            println!("  - {description}");
        }
        if !metadata.potential_links.is_empty() {
            println!("  links to: {}", metadata.potential_links.join(", "));
        }
    }
    println!(
        "\nrequired permissions: {}",
        surveyor::permissions::registered().join(", ")
    );
    Ok(())
}
