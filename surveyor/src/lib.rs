//! Surveyor discovers cloud resources, normalizes them into a uniform item
//! model, and publishes linked-item queries a downstream graph engine can
//! traverse.
//!
//! This facade crate re-exports the layered workspace:
//! - [`core`]: the item model, type registry, scopes and error taxonomy
//! - [`client`] (flattened here): cache, linker, wrapper traits, the dynamic
//!   engine and the adapter facade
//! - [`gcp`]: the per-resource inventory
//!
//! A minimal assembly looks like:
//!
//! ```no_run
//! use std::sync::Arc;
//! use surveyor::{ClientBuilder, QueryCache};
//!
//! # async fn assemble() -> Result<(), Box<dyn std::error::Error>> {
//! let params = surveyor::gcp::scope_params_from_env()?;
//! let client = ClientBuilder::https(None)?.build();
//! let cache = Arc::new(QueryCache::new());
//! let adapters = surveyor::gcp::dynamic_adapters(&client, &params, cache)?;
//! for adapter in &adapters {
//!     println!("{}", adapter.metadata().descriptive_name);
//! }
//! # Ok(())
//! # }
//! ```

pub use surveyor_client::{
    adapter, cache, client, dynamic, linker, params, permissions, wrapper, Adapter, AdapterError,
    AdapterMeta, Body, CacheKey, Client, ClientBuilder, DynamicAdapter, Getter, ItemStream,
    LinkRegistry, LinkSpec, Linker, Lister, QueryCache, QueryParams, RoleTable, Searcher, Wrapper,
    DEFAULT_CACHE_TTL, DNS_TYPE, IP_TYPE,
};
pub use surveyor_core as core;
pub use surveyor_core::{
    AdapterCategory, AdapterMetadata, BlastPropagation, Health, Item, ItemType, ItemTypeLookup,
    LinkedItemQuery, Query, QueryError, QueryErrorKind, QueryMethod, ScopeParams, ScopeShape,
    SdkError, TerraformMapping, TerraformMethod,
};
pub use surveyor_gcp as gcp;
