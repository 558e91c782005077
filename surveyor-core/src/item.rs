//! The normalized representation of one cloud resource instance.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    error::QueryError,
    query::Query,
};

/// Attribute keys removed from payloads before transformation.
///
/// Provider labels/tags are carried on [`Item::tags`] instead of being
/// duplicated inside the attribute tree.
pub const DEFAULT_EXCLUDED_ATTRIBUTES: &[&str] = &["labels", "tags"];

/// Condensed health of a resource.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Health {
    /// The provider state did not map to anything known
    Unknown,
    /// The resource is being created, updated or deleted
    Pending,
    /// The resource is ready or in use
    Ok,
    /// The resource failed or is unavailable
    Error,
}

/// Directional failure-impact hint between two linked items.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlastPropagation {
    /// A failure of the link target propagates to this item
    #[serde(rename = "in")]
    pub in_: bool,
    /// A failure of this item propagates to the link target
    #[serde(rename = "out")]
    pub out: bool,
}

impl BlastPropagation {
    /// Explicit propagation directions.
    pub fn new(in_: bool, out: bool) -> Self {
        Self { in_, out }
    }

    /// Failures propagate both ways.
    pub fn both() -> Self {
        Self::new(true, true)
    }

    /// Only the target's failures reach this item.
    pub fn inward() -> Self {
        Self::new(true, false)
    }

    /// Only this item's failures reach the target.
    pub fn outward() -> Self {
        Self::new(false, true)
    }
}

/// A query for a related item, annotated with blast propagation.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LinkedItemQuery {
    /// The query resolving the related item
    pub query: Query,
    /// How failures travel across this link
    pub blast_propagation: BlastPropagation,
}

/// The published unit of discovery: one resource, normalized.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Type string, `source-api-resource`
    #[serde(rename = "type")]
    pub item_type: String,
    /// Name of the attribute whose value identifies this item within scope
    pub unique_attribute: String,
    /// The transformed provider payload
    pub attributes: Map<String, Value>,
    /// Provider labels/tags
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
    /// Scope the item lives in
    pub scope: String,
    /// Mapped health, when the resource reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health: Option<Health>,
    /// Queries resolving related items, in emission order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub linked_item_queries: Vec<LinkedItemQuery>,
}

impl Item {
    /// Assemble an item; links and tags are attached afterwards.
    pub fn new(
        item_type: impl Into<String>,
        unique_attribute: impl Into<String>,
        attributes: Map<String, Value>,
        scope: impl Into<String>,
    ) -> Self {
        Self {
            item_type: item_type.into(),
            unique_attribute: unique_attribute.into(),
            attributes,
            tags: BTreeMap::new(),
            scope: scope.into(),
            health: None,
            linked_item_queries: Vec::new(),
        }
    }

    /// The value of the unique attribute, when present and scalar.
    pub fn unique_attribute_value(&self) -> Option<&str> {
        self.attributes.get(&self.unique_attribute)?.as_str()
    }

    /// Read a nested attribute by dotted path.
    pub fn attribute(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let mut current = self.attributes.get(parts.next()?)?;
        for part in parts {
            current = current.get(part)?;
        }
        Some(current)
    }

    /// Append a linked-item query.
    pub fn push_link(&mut self, query: Query, blast_propagation: BlastPropagation) {
        self.linked_item_queries.push(LinkedItemQuery {
            query,
            blast_propagation,
        });
    }

    /// Check the publication invariants.
    ///
    /// Violations are OTHER errors: they indicate a broken transform, not a
    /// provider failure.
    pub fn validate(&self) -> Result<(), QueryError> {
        if self.item_type.is_empty() {
            return Err(QueryError::other("item has empty type"));
        }
        if self.scope.is_empty() {
            return Err(QueryError::other("item has empty scope"));
        }
        if self.unique_attribute.is_empty() {
            return Err(QueryError::other("item has empty unique attribute"));
        }
        match self.unique_attribute_value() {
            Some(v) if !v.is_empty() => {}
            _ => {
                return Err(QueryError::other(format!(
                    "attribute {:?} is missing or not a non-empty string",
                    self.unique_attribute
                )))
            }
        }
        for link in &self.linked_item_queries {
            link.query.validate()?;
        }
        Ok(())
    }
}

/// Turn a provider payload into the attribute map of an item.
///
/// The payload must serialize to a JSON object; keys in `excluded` are
/// removed so tags can be carried separately.
pub fn attributes_from_payload(
    payload: Value,
    excluded: &[&str],
) -> Result<Map<String, Value>, QueryError> {
    match payload {
        Value::Object(mut map) => {
            for key in excluded {
                map.remove(*key);
            }
            Ok(map)
        }
        other => Err(QueryError::other(format!(
            "cannot transform payload: expected a JSON object, got {other}"
        ))),
    }
}

/// Read a `labels`-shaped value into tags; anything non-string is skipped.
pub fn tags_from_value(value: Option<&Value>) -> BTreeMap<String, String> {
    let mut tags = BTreeMap::new();
    if let Some(Value::Object(map)) = value {
        for (k, v) in map {
            if let Some(s) = v.as_str() {
                tags.insert(k.clone(), s.to_string());
            }
        }
    }
    tags
}
