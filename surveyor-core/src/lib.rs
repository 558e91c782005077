//! Core types for the surveyor discovery engine.
//!
//! This crate contains the client-less building blocks shared by every
//! adapter: the normalized [`Item`] model, the [`ItemType`] registry, scope
//! and resource-path utilities, the query protocol types and the error
//! taxonomy. The client machinery lives in `surveyor-client`.

pub mod error;
pub use error::{QueryError, QueryErrorKind, SdkError};

pub mod item;
pub use item::{BlastPropagation, Health, Item, LinkedItemQuery};

pub mod item_type;
pub use item_type::{composite_lookup_key, ItemType, ItemTypeLookup};

pub mod metadata;
pub use metadata::{AdapterCategory, AdapterMetadata, SupportedQueryMethods};

pub mod paths;

pub mod query;
pub use query::{Query, QueryMethod};

pub mod scope;
pub use scope::{ScopeParams, ScopeShape};

pub mod terraform;
pub use terraform::{TerraformMapping, TerraformMethod};

pub type Result<T, E = QueryError> = std::result::Result<T, E>;
