//! The query protocol spoken between callers and adapters.
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::QueryError;

/// The three read methods of the query protocol.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum QueryMethod {
    /// Fetch one item by its unique attribute value
    Get,
    /// Fetch every item in scope
    List,
    /// Fetch items matching a composite or terraform-style query
    Search,
}

impl QueryMethod {
    /// Wire spelling of the method.
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryMethod::Get => "GET",
            QueryMethod::List => "LIST",
            QueryMethod::Search => "SEARCH",
        }
    }
}

impl fmt::Display for QueryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One query against one adapter.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    /// Target item type string, e.g. `gcp-compute-network` or `ip`
    #[serde(rename = "type")]
    pub item_type: String,
    /// Method to execute
    pub method: QueryMethod,
    /// The query term
    pub query: String,
    /// Scope to execute in; `*` only on backlinks
    pub scope: String,
}

impl Query {
    /// Assemble a query.
    pub fn new(
        item_type: impl Into<String>,
        method: QueryMethod,
        query: impl Into<String>,
        scope: impl Into<String>,
    ) -> Self {
        Self {
            item_type: item_type.into(),
            method,
            query: query.into(),
            scope: scope.into(),
        }
    }

    /// Every field of a query must be present for a consumer to route it.
    pub fn validate(&self) -> Result<(), QueryError> {
        for (field, value) in [
            ("type", &self.item_type),
            ("query", &self.query),
            ("scope", &self.scope),
        ] {
            if value.is_empty() {
                return Err(QueryError::other(format!("query has empty {field}")));
            }
        }
        Ok(())
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {:?} in {}",
            self.method, self.item_type, self.query, self.scope
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn validation_catches_empty_fields() {
        let q = Query::new("gcp-compute-network", QueryMethod::Get, "net1", "proj");
        assert!(q.validate().is_ok());
        let q = Query::new("", QueryMethod::Get, "net1", "proj");
        assert!(q.validate().is_err());
    }

    #[test]
    fn serializes_with_wire_names() {
        let q = Query::new("ip", QueryMethod::Get, "10.0.0.5", "global");
        let json = serde_json::to_value(&q).unwrap();
        assert_eq!(json["type"], "ip");
        assert_eq!(json["method"], "GET");
    }
}
