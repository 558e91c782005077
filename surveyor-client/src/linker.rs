//! Resolves provider reference strings into scoped linked-item queries.
//!
//! References arrive in many spellings: full HTTPS URLs, partial paths,
//! bare names, IP literals, hostnames. The linker classifies the reference,
//! derives the target's canonical name and scope from its registered scope
//! shape, and appends a linked-item query with the blast propagation
//! registered for the `(from, to)` type pair.
use std::{collections::HashMap, net::IpAddr, sync::Arc};

use serde_json::Value;
use surveyor_core::{
    composite_lookup_key,
    item::{BlastPropagation, Item},
    paths::{extract_path_param, extract_path_params_with_count, last_path_component, resource_path},
    query::{Query, QueryMethod},
    scope::{regional_scope, zonal_scope, ScopeShape, GLOBAL_SCOPE},
};

/// Type string of the provider-less IP built-in.
pub const IP_TYPE: &str = "ip";

/// Type string of the provider-less DNS built-in.
pub const DNS_TYPE: &str = "dns";

/// Scope shape and composite arity of one linkable target type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetSpec {
    /// How the target's scope string is formed
    pub shape: ScopeShape,
    /// Number of path values forming the target's unique attribute
    pub key_count: usize,
}

/// Static registry of linkable types and blast propagation between them.
///
/// Built once at startup by the per-provider inventory and read-only after.
#[derive(Debug, Default)]
pub struct LinkRegistry {
    targets: HashMap<String, TargetSpec>,
    blast: HashMap<(String, String), BlastPropagation>,
}

impl LinkRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a target type addressed by a single path value.
    #[must_use]
    pub fn target(self, item_type: impl Into<String>, shape: ScopeShape) -> Self {
        self.composite_target(item_type, shape, 1)
    }

    /// Register a target type addressed by a composite of `key_count` path
    /// values.
    #[must_use]
    pub fn composite_target(
        mut self,
        item_type: impl Into<String>,
        shape: ScopeShape,
        key_count: usize,
    ) -> Self {
        self.targets
            .insert(item_type.into(), TargetSpec { shape, key_count });
        self
    }

    /// Register blast propagation for links from `from` to `to`.
    #[must_use]
    pub fn blast(
        mut self,
        from: impl Into<String>,
        to: impl Into<String>,
        propagation: BlastPropagation,
    ) -> Self {
        self.blast.insert((from.into(), to.into()), propagation);
        self
    }

    /// The registered spec for a target type.
    pub fn target_spec(&self, item_type: &str) -> Option<TargetSpec> {
        self.targets.get(item_type).copied()
    }

    /// The registered blast propagation for a type pair.
    pub fn blast_for(&self, from: &str, to: &str) -> Option<BlastPropagation> {
        self.blast.get(&(from.to_string(), to.to_string())).copied()
    }
}

enum Reference {
    Ip(IpAddr),
    Dns(String),
    Path(String),
}

fn classify(raw: &str) -> Reference {
    if let Ok(ip) = raw.parse::<IpAddr>() {
        return Reference::Ip(ip);
    }
    let path = resource_path(raw).to_string();
    if looks_like_hostname(raw) {
        return Reference::Dns(raw.to_string());
    }
    Reference::Path(path)
}

/// A DNS-ish reference: dotted, slash-free, alphanumeric labels.
fn looks_like_hostname(raw: &str) -> bool {
    if raw.contains('/') || !raw.contains('.') || raw.starts_with('.') || raw.ends_with('.') {
        return false;
    }
    raw.chars().any(|c| c.is_ascii_alphabetic())
        && raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
}

/// Appends linked-item queries to items, scoped by a [`LinkRegistry`].
#[derive(Clone)]
pub struct Linker {
    registry: Arc<LinkRegistry>,
}

impl Linker {
    /// A linker over the given registry.
    pub fn new(registry: Arc<LinkRegistry>) -> Self {
        Self { registry }
    }

    /// Resolve `target_ref` as a reference to a `target_type` item and
    /// append the linked-item query to `item`.
    ///
    /// Skips silently when the reference cannot be scoped: that is missing
    /// data on the provider payload, not an error.
    pub fn link(&self, project_id: &str, item: &mut Item, target_ref: &str, target_type: &str) {
        if target_ref.is_empty() {
            return;
        }
        match classify(target_ref) {
            // IPs and DNS names are global built-ins with fixed propagation.
            Reference::Ip(ip) => item.push_link(
                Query::new(IP_TYPE, QueryMethod::Get, ip.to_string(), GLOBAL_SCOPE),
                BlastPropagation::both(),
            ),
            Reference::Dns(host) => item.push_link(
                Query::new(DNS_TYPE, QueryMethod::Search, host, GLOBAL_SCOPE),
                BlastPropagation::both(),
            ),
            Reference::Path(path) => self.link_path(project_id, item, &path, target_type),
        }
    }

    fn link_path(&self, project_id: &str, item: &mut Item, path: &str, target_type: &str) {
        let Some(propagation) = self.registry.blast_for(&item.item_type, target_type) else {
            tracing::trace!(from = %item.item_type, to = %target_type, "no blast propagation registered");
            return;
        };
        let Some(spec) = self.registry.target_spec(target_type) else {
            return;
        };

        let name = if spec.key_count > 1 {
            match extract_path_params_with_count(path, spec.key_count) {
                Some(values) => composite_lookup_key(&values),
                None => return,
            }
        } else {
            let name = last_path_component(path);
            if name.is_empty() {
                return;
            }
            name.to_string()
        };

        // References may point into another project.
        let project = extract_path_param("projects", path).unwrap_or(project_id);
        let scope = match spec.shape {
            ScopeShape::Global => GLOBAL_SCOPE.to_string(),
            ScopeShape::Project => project.to_string(),
            ScopeShape::Regional => match extract_path_param("regions", path) {
                Some(region) => regional_scope(project, region),
                None => return,
            },
            ScopeShape::Zonal => match extract_path_param("zones", path) {
                Some(zone) => zonal_scope(project, zone),
                None => return,
            },
        };

        // Never link an item back to itself.
        if target_type == item.item_type && item.unique_attribute_value() == Some(name.as_str()) {
            return;
        }

        item.push_link(
            Query::new(target_type, QueryMethod::Get, name, scope),
            propagation,
        );
    }

    /// Walk `field_path` (dotted, arrays fanned out) through the item's
    /// attributes and [`link`](Self::link) every reference found there.
    pub fn auto_link(&self, project_id: &str, item: &mut Item, target_type: &str, field_path: &str) {
        let mut parts = field_path.split('.');
        let Some(first) = parts.next() else { return };
        let rest: Vec<&str> = parts.collect();
        let mut references = Vec::new();
        if let Some(root) = item.attributes.get(first) {
            collect_references(root, &rest, &mut references);
        }
        for reference in references {
            self.link(project_id, item, &reference, target_type);
        }
    }
}

fn collect_references(value: &Value, path: &[&str], out: &mut Vec<String>) {
    match value {
        Value::Array(values) => {
            for v in values {
                collect_references(v, path, out);
            }
        }
        _ if path.is_empty() => {
            if let Some(s) = value.as_str() {
                if !s.is_empty() {
                    out.push(s.to_string());
                }
            }
        }
        Value::Object(map) => {
            if let Some(v) = map.get(path[0]) {
                collect_references(v, &path[1..], out);
            }
        }
        _ => {}
    }
}
