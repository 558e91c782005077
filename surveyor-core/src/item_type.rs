//! Type information for discovered resources.
use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Separator for multi-part lookup keys.
pub const COMPOSITE_SEPARATOR: char = '|';

/// Acronyms kept whole when splitting an all-caps run into words.
///
/// Longest first so that greedy matching prefers `HTTPS` over `HTTP`.
const ACRONYMS: &[&str] = &[
    "HTTPS", "REST", "GRPC", "HTTP", "API", "DNS", "IAM", "KMS", "TLS", "URL", "VPC", "SQL", "IP",
    "ID",
];

#[derive(Debug, Error)]
#[error("failed to parse item type: {0}")]
/// Failed to parse a `source-api-resource` string
pub struct ParseItemTypeError(pub String);

/// Identity of one resource kind: the `(source, api, resource)` triple.
///
/// The string form joins the normalized parts with `-`, e.g.
/// `gcp-compute-address`. Parts given in camel case are split into kebab
/// case at construction, so `("aws", "APIGateway", "RESTAPI")` becomes
/// `aws-api-gateway-rest-api`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemType {
    /// Provider the resource belongs to
    pub source: String,
    /// Provider API serving the resource
    pub api: String,
    /// Resource kind within the API
    pub resource: String,
}

impl ItemType {
    /// Construct from explicit source, api and resource parts.
    pub fn new(source: &str, api: &str, resource: &str) -> Self {
        Self {
            source: kebab(source),
            api: kebab(api),
            resource: kebab(resource),
        }
    }

    /// Human readable form: the source upper-cased, every other token
    /// title-cased, joined with spaces.
    ///
    /// `gcp-compute-instance` reads as `GCP Compute Instance`.
    pub fn readable(&self) -> String {
        let joined = self.to_string();
        let mut tokens = joined.split('-');
        let mut out = match tokens.next() {
            Some(source) => source.to_uppercase(),
            None => return String::new(),
        };
        for token in tokens {
            out.push(' ');
            out.push_str(&title_case(token));
        }
        out
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.source, self.api, self.resource)
    }
}

impl FromStr for ItemType {
    type Err = ParseItemTypeError;

    /// Parse a `source-api-resource` string.
    ///
    /// Multi-token apis cannot be told apart from multi-token resources, so
    /// everything after the second `-` is taken as the resource.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut split = s.splitn(3, '-');
        match (split.next(), split.next(), split.next()) {
            (Some(source), Some(api), Some(resource))
                if !source.is_empty() && !api.is_empty() && !resource.is_empty() =>
            {
                Ok(Self {
                    source: source.to_string(),
                    api: api.to_string(),
                    resource: resource.to_string(),
                })
            }
            _ => Err(ParseItemTypeError(s.into())),
        }
    }
}

/// Describes one input field a GET or SEARCH accepts for a type.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemTypeLookup {
    /// Attribute the lookup value is matched against
    pub field: String,
    /// The type being looked up
    pub item_type: ItemType,
}

impl ItemTypeLookup {
    /// Pair a lookup field with its type.
    pub fn new(field: impl Into<String>, item_type: ItemType) -> Self {
        Self {
            field: field.into(),
            item_type,
        }
    }
}

/// Join the parts of a multi-part resource name into a composite lookup key.
///
/// The inverse is a plain `split('|')`.
pub fn composite_lookup_key<S: AsRef<str>>(parts: &[S]) -> String {
    let mut out = String::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            out.push(COMPOSITE_SEPARATOR);
        }
        out.push_str(part.as_ref());
    }
    out
}

/// Normalize one name part to kebab case.
///
/// Splits on existing separators and camel boundaries; all-caps runs are
/// chopped greedily along [`ACRONYMS`] so `RESTAPI` becomes `rest-api`.
fn kebab(part: &str) -> String {
    let mut words = Vec::new();
    for chunk in part.split(['-', '_', ' ']).filter(|c| !c.is_empty()) {
        for word in camel_words(chunk) {
            if word.len() > 1 && word.chars().all(|c| c.is_ascii_uppercase()) {
                words.extend(split_acronym_run(&word));
            } else {
                words.push(word);
            }
        }
    }
    words
        .iter()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

/// Split a chunk at lower-to-upper boundaries and at the end of caps runs.
fn camel_words(chunk: &str) -> Vec<String> {
    let chars: Vec<char> = chunk.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();
    for (i, &c) in chars.iter().enumerate() {
        let prev_lower = i > 0 && (chars[i - 1].is_lowercase() || chars[i - 1].is_ascii_digit());
        let caps_run_end = i > 0
            && chars[i - 1].is_uppercase()
            && c.is_uppercase()
            && chars.get(i + 1).is_some_and(|n| n.is_lowercase());
        if !current.is_empty() && c.is_uppercase() && (prev_lower || caps_run_end) {
            words.push(std::mem::take(&mut current));
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn split_acronym_run(run: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut rest = run;
    while !rest.is_empty() {
        match ACRONYMS.iter().find(|a| rest.starts_with(*a)) {
            Some(acronym) => {
                words.push(acronym.to_string());
                rest = &rest[acronym.len()..];
            }
            None => {
                words.push(rest.to_string());
                break;
            }
        }
    }
    words
}

fn title_case(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn string_form_joins_with_dashes() {
        let ty = ItemType::new("gcp", "compute", "address");
        assert_eq!(ty.to_string(), "gcp-compute-address");
    }

    #[test]
    fn camel_parts_are_normalized() {
        let ty = ItemType::new("gcp", "artifactregistry", "dockerImage");
        assert_eq!(ty.to_string(), "gcp-artifactregistry-docker-image");
    }

    #[test]
    fn readable_gcp() {
        let ty = ItemType::new("GCP", "compute", "instance");
        assert_eq!(ty.readable(), "GCP Compute Instance");
    }

    #[test]
    fn readable_acronym_heavy() {
        let ty = ItemType::new("aws", "APIGateway", "RESTAPI");
        assert_eq!(ty.to_string(), "aws-api-gateway-rest-api");
        assert_eq!(ty.readable(), "AWS Api Gateway Rest Api");
    }

    #[test]
    fn parse_roundtrip() {
        let ty: ItemType = "gcp-pubsub-topic".parse().unwrap();
        assert_eq!(ty.source, "gcp");
        assert_eq!(ty.api, "pubsub");
        assert_eq!(ty.resource, "topic");
        assert!("gcp-pubsub".parse::<ItemType>().is_err());
    }

    #[test]
    fn composite_key_roundtrip() {
        let key = composite_lookup_key(&["us", "ring", "key"]);
        assert_eq!(key, "us|ring|key");
        let parts: Vec<&str> = key.split('|').collect();
        assert_eq!(parts, vec!["us", "ring", "key"]);
    }
}
