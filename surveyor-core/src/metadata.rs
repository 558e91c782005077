//! Adapter metadata published for discovery tooling.
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::terraform::TerraformMapping;

/// Rough functional grouping of a resource type.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum AdapterCategory {
    Compute,
    Network,
    Storage,
    Database,
    Security,
    Messaging,
    Configuration,
    Observability,
    Other,
}

impl fmt::Display for AdapterCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AdapterCategory::Compute => "compute",
            AdapterCategory::Network => "network",
            AdapterCategory::Storage => "storage",
            AdapterCategory::Database => "database",
            AdapterCategory::Security => "security",
            AdapterCategory::Messaging => "messaging",
            AdapterCategory::Configuration => "configuration",
            AdapterCategory::Observability => "observability",
            AdapterCategory::Other => "other",
        };
        f.write_str(s)
    }
}

/// Which query methods an adapter answers, with a human description of what
/// each accepts.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SupportedQueryMethods {
    /// Present when GET is supported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get: Option<String>,
    /// Present when LIST is supported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list: Option<String>,
    /// Present when SEARCH is supported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

/// Descriptive record for one adapter, synthesized at construction.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdapterMetadata {
    /// Item type string the adapter serves
    #[serde(rename = "type")]
    pub item_type: String,
    /// Readable name, e.g. `GCP Compute Address`
    pub descriptive_name: String,
    /// Functional grouping
    pub category: AdapterCategory,
    /// Supported methods with usage descriptions
    pub supported_methods: SupportedQueryMethods,
    /// Types this adapter may emit linked-item queries for
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub potential_links: Vec<String>,
    /// Terraform addresses the adapter resolves
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub terraform_mappings: Vec<TerraformMapping>,
}
