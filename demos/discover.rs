//! List every resource the assembled adapters can see and print the items
//! with their linked-item queries. Needs `GCP_PROJECT_ID` and a
//! `GCP_ACCESS_TOKEN` with the inventory's viewer roles.
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::StreamExt;
use secrecy::SecretString;
use surveyor::{ClientBuilder, QueryCache, QueryParams};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let params = surveyor::gcp::scope_params_from_env()?;
    let token: SecretString = std::env::var("GCP_ACCESS_TOKEN")
        .context("GCP_ACCESS_TOKEN must be set")?
        .into();
    let client = ClientBuilder::https(Some(token))?.build();
    let cache = Arc::new(QueryCache::new());

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            let _ = tokio::signal::ctrl_c().await;
            cancel.cancel();
        }
    });

    for adapter in surveyor::gcp::dynamic_adapters(&client, &params, cache)? {
        if !adapter.supports_list() {
            continue;
        }
        let scope = adapter.scopes()[0].clone();
        println!("== {} in {scope}", adapter.item_type());
        let query_params = QueryParams::default().cancel(cancel.clone());
        let mut stream = adapter.list_stream(&scope, &query_params);
        while let Some(next) = stream.next().await {
            match next {
                Ok(item) => {
                    println!(
                        "{} {}",
                        item.item_type,
                        item.unique_attribute_value().unwrap_or("?")
                    );
                    for link in &item.linked_item_queries {
                        println!("  -> {}", link.query);
                    }
                }
                Err(err) => {
                    tracing::warn!(%err, "listing failed");
                    break;
                }
            }
        }
    }
    Ok(())
}
