//! Client machinery for the surveyor discovery engine.
//!
//! The crate layers, bottom up:
//! - [`client`]: a tower-based HTTP client with provider status mapping
//! - [`cache`]: the keyed TTL cache every adapter shares
//! - [`linker`]: reference parsing into scoped linked-item queries
//! - [`wrapper`]: the capability traits handcrafted handlers implement
//! - [`dynamic`]: the metadata-driven adapter engine
//! - [`adapter`]: the uniform facade callers query
//! - [`permissions`]: process-wide IAM accumulation and role validation

pub mod adapter;
pub use adapter::{Adapter, AdapterError};

pub mod cache;
pub use cache::{CacheKey, QueryCache, DEFAULT_CACHE_TTL};

pub mod client;
pub use client::{Body, Client, ClientBuilder};

pub mod dynamic;
pub use dynamic::{AdapterMeta, DynamicAdapter, LinkSpec};

pub mod linker;
pub use linker::{LinkRegistry, Linker, DNS_TYPE, IP_TYPE};

pub mod params;
pub use params::QueryParams;

pub mod permissions;
pub use permissions::RoleTable;

pub mod wrapper;
pub use wrapper::{Getter, ItemStream, Lister, Searcher, Wrapper};

pub use surveyor_core as core;

#[cfg(test)] mod mock_tests;
