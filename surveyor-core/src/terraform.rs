//! Declarations mapping terraform addresses onto adapter queries.
use serde::{Deserialize, Serialize};

/// Which adapter method a terraform mapping routes to.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum TerraformMethod {
    /// The mapped value is a unique attribute value
    Get,
    /// The mapped value is a search term (typically a `projects/…` path)
    Search,
}

/// One terraform address fragment an adapter can resolve.
///
/// `query_map` names the terraform resource type and attribute carrying the
/// query value, e.g. `google_compute_address.name`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct TerraformMapping {
    /// Routed method
    pub method: TerraformMethod,
    /// `<terraform_type>.<attribute>` the query value is read from
    pub query_map: String,
}

impl TerraformMapping {
    /// Mapping that routes to GET.
    pub fn get(query_map: impl Into<String>) -> Self {
        Self {
            method: TerraformMethod::Get,
            query_map: query_map.into(),
        }
    }

    /// Mapping that routes to SEARCH.
    pub fn search(query_map: impl Into<String>) -> Self {
        Self {
            method: TerraformMethod::Search,
            query_map: query_map.into(),
        }
    }
}
