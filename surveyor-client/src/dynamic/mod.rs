//! The metadata-driven adapter engine.
//!
//! A [`DynamicAdapter`] binds an [`AdapterMeta`] to a project/region/zone
//! parameter set and an HTTP [`Client`], and implements the same capability
//! traits manual wrappers do: the facade cannot tell the two apart. Payloads
//! are walked as JSON trees keyed by dotted paths; no reflection of concrete
//! types is involved.
use std::sync::Arc;

use async_stream::try_stream;
use futures::stream;
use serde_json::{Map, Value};
use surveyor_core::{
    composite_lookup_key,
    item::{attributes_from_payload, tags_from_value, Health, Item},
    paths::{extract_path_params_with_count, last_path_component},
    AdapterCategory, ItemType, ItemTypeLookup, QueryError, ScopeParams, ScopeShape,
    TerraformMapping, TerraformMethod,
};
use tokio_util::sync::CancellationToken;

use crate::{
    adapter::AdapterError,
    client::Client,
    linker::Linker,
    wrapper::{ensure_not_cancelled, Getter, ItemStream, Lister, Searcher, Wrapper},
};

/// Builds the GET endpoint URL from the bound parameters and query parts.
///
/// `None` means the parameters cannot address the endpoint (e.g. a regional
/// endpoint with no region bound).
pub type GetEndpointFn = Arc<dyn Fn(&ScopeParams, &[String]) -> Option<String> + Send + Sync>;

/// Builds the LIST endpoint URL from the bound parameters.
pub type ListEndpointFn = Arc<dyn Fn(&ScopeParams) -> Option<String> + Send + Sync>;

/// Builds the SEARCH endpoint URL from the bound parameters and the
/// composite query parts.
pub type SearchEndpointFn = GetEndpointFn;

/// Derives an item's health from its transformed attributes.
pub type HealthFn = Arc<dyn Fn(&Map<String, Value>) -> Option<Health> + Send + Sync>;

/// Derives an item's unique attribute value from its transformed attributes,
/// for payloads that do not carry a standard `name`.
pub type UniqueValueFn = Arc<dyn Fn(&Map<String, Value>) -> Option<String> + Send + Sync>;

/// Attribute name the engine writes derived composite values under.
pub const UNIQUE_ATTRIBUTE_VALUE: &str = "uniqueAttributeValue";

/// One reference field the engine walks for links.
#[derive(Clone, Debug)]
pub struct LinkSpec {
    /// Dotted path from the payload root; arrays fan out
    pub field: String,
    /// Target type string the references resolve to
    pub target_type: String,
}

/// Declarative description of one dynamic adapter.
pub struct AdapterMeta {
    /// Type the adapter serves
    pub item_type: ItemType,
    /// How the adapter's scope string is formed
    pub scope: ScopeShape,
    /// Functional grouping
    pub category: AdapterCategory,
    /// Path keys whose values form the unique attribute, in order
    pub unique_attribute_keys: Vec<String>,
    /// GET lookup field names; derived from the keys unless overridden
    pub lookup_fields: Vec<String>,
    /// GET endpoint
    pub get_endpoint: GetEndpointFn,
    /// LIST endpoint, when the resource can be enumerated in scope
    pub list_endpoint: Option<ListEndpointFn>,
    /// SEARCH endpoint, when a composite search exists
    pub search_endpoint: Option<SearchEndpointFn>,
    /// Composite SEARCH field names
    pub search_fields: Vec<String>,
    /// Key of the item array in LIST/SEARCH responses
    pub list_items_key: String,
    /// Payload keys removed during transformation
    pub excluded_attributes: Vec<String>,
    /// Reference fields walked for links
    pub links: Vec<LinkSpec>,
    /// Health derivation, when the resource reports state
    pub health: Option<HealthFn>,
    /// Unique value derivation override
    pub unique_value: Option<UniqueValueFn>,
    /// IAM permissions the endpoints require
    pub iam_permissions: Vec<String>,
    /// Role expected to grant the permissions
    pub predefined_role: Option<String>,
    /// Terraform addresses routed to this adapter
    pub terraform_mappings: Vec<TerraformMapping>,
    /// Excluded from assembly while the adapter is being built out
    pub in_development: bool,
}

impl AdapterMeta {
    /// A GET-only meta; extend it with the builder methods.
    pub fn new(
        item_type: ItemType,
        scope: ScopeShape,
        category: AdapterCategory,
        unique_attribute_keys: impl IntoIterator<Item = impl Into<String>>,
        get_endpoint: GetEndpointFn,
    ) -> Self {
        let unique_attribute_keys: Vec<String> =
            unique_attribute_keys.into_iter().map(Into::into).collect();
        let lookup_fields = unique_attribute_keys.iter().map(|k| singularize(k)).collect();
        Self {
            item_type,
            scope,
            category,
            unique_attribute_keys,
            lookup_fields,
            get_endpoint,
            list_endpoint: None,
            search_endpoint: None,
            search_fields: Vec::new(),
            list_items_key: "items".to_string(),
            excluded_attributes: vec!["labels".to_string()],
            links: Vec::new(),
            health: None,
            unique_value: None,
            iam_permissions: Vec::new(),
            predefined_role: None,
            terraform_mappings: Vec::new(),
            in_development: false,
        }
    }

    /// Add a LIST endpoint.
    #[must_use]
    pub fn list_endpoint(mut self, endpoint: ListEndpointFn) -> Self {
        self.list_endpoint = Some(endpoint);
        self
    }

    /// Add a composite SEARCH endpoint with its field names.
    #[must_use]
    pub fn search_endpoint(
        mut self,
        fields: impl IntoIterator<Item = impl Into<String>>,
        endpoint: SearchEndpointFn,
    ) -> Self {
        self.search_fields = fields.into_iter().map(Into::into).collect();
        self.search_endpoint = Some(endpoint);
        self
    }

    /// Override the key of the item array in paged responses.
    #[must_use]
    pub fn items_key(mut self, key: impl Into<String>) -> Self {
        self.list_items_key = key.into();
        self
    }

    /// Walk a reference field for links.
    #[must_use]
    pub fn link(mut self, field: impl Into<String>, target_type: impl Into<String>) -> Self {
        self.links.push(LinkSpec {
            field: field.into(),
            target_type: target_type.into(),
        });
        self
    }

    /// Derive health from the attributes.
    #[must_use]
    pub fn health(mut self, health: HealthFn) -> Self {
        self.health = Some(health);
        self
    }

    /// Derive health from a status-like string attribute via
    /// [`health_from_provider_status`].
    #[must_use]
    pub fn health_from_status_field(self, field: &'static str) -> Self {
        self.health(Arc::new(move |attributes: &Map<String, Value>| {
            attributes
                .get(field)
                .and_then(Value::as_str)
                .map(health_from_provider_status)
        }))
    }

    /// Override how the unique attribute value is derived.
    #[must_use]
    pub fn unique_value(mut self, unique_value: UniqueValueFn) -> Self {
        self.unique_value = Some(unique_value);
        self
    }

    /// Declare the required IAM permissions and the role granting them.
    #[must_use]
    pub fn iam(
        mut self,
        role: impl Into<String>,
        permissions: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.predefined_role = Some(role.into());
        self.iam_permissions = permissions.into_iter().map(Into::into).collect();
        self
    }

    /// Add a terraform mapping.
    #[must_use]
    pub fn terraform_mapping(mut self, mapping: TerraformMapping) -> Self {
        self.terraform_mappings.push(mapping);
        self
    }

    /// Mark the adapter as not ready for assembly.
    #[must_use]
    pub fn in_development(mut self) -> Self {
        self.in_development = true;
        self
    }
}

/// Lookup field for a path key: `repositories` looks up a `repository`.
fn singularize(key: &str) -> String {
    if let Some(stem) = key.strip_suffix("ies") {
        format!("{stem}y")
    } else if let Some(stem) = key.strip_suffix('s') {
        stem.to_string()
    } else {
        key.to_string()
    }
}

/// Generic mapping from provider status strings to health.
///
/// Resources with richer state machines override via [`AdapterMeta::health`].
pub fn health_from_provider_status(status: &str) -> Health {
    match status.to_ascii_uppercase().as_str() {
        "READY" | "RUNNING" | "ACTIVE" | "ENABLED" | "IN_USE" | "RESERVED" | "UP" => Health::Ok,
        "CREATING" | "PENDING" | "PROVISIONING" | "STAGING" | "UPDATING" | "DELETING"
        | "RESERVING" | "RESTORING" | "PENDING_GENERATION" | "REPAIRING" => Health::Pending,
        "FAILED" | "ERROR" | "UNAVAILABLE" | "DISABLED" | "DESTROYED" | "DOWN" => Health::Error,
        _ => Health::Unknown,
    }
}

/// A wrapper generated from an [`AdapterMeta`], speaking the provider's
/// REST API over the injected [`Client`].
pub struct DynamicAdapter {
    meta: Arc<AdapterMeta>,
    params: ScopeParams,
    scope: String,
    client: Client,
    linker: Linker,
}

impl DynamicAdapter {
    /// Bind a meta to scope parameters.
    ///
    /// Fails when the parameters cannot produce the meta's scope (e.g. a
    /// zonal meta with no zone bound).
    pub fn new(
        meta: Arc<AdapterMeta>,
        params: ScopeParams,
        client: Client,
        linker: Linker,
    ) -> Result<Self, AdapterError> {
        let scope = meta
            .scope
            .scope_for(&params)
            .ok_or_else(|| AdapterError::MissingScopeParams {
                adapter: meta.item_type.to_string(),
            })?;
        Ok(Self {
            meta,
            params,
            scope,
            client,
            linker,
        })
    }

    /// Tag with the capability combination the meta supports.
    pub fn into_wrapper(self) -> Wrapper {
        match (self.meta.list_endpoint.is_some(), self.searchable()) {
            (true, true) => Wrapper::full(self),
            (true, false) => Wrapper::listable(self),
            (false, true) => Wrapper::searchable(self),
            (false, false) => Wrapper::get_only(self),
        }
    }

    fn searchable(&self) -> bool {
        self.meta.search_endpoint.is_some()
            || self
                .meta
                .terraform_mappings
                .iter()
                .any(|m| m.method == TerraformMethod::Search)
    }

    /// Transform one payload into an item and attach its links.
    fn transform(&self, payload: &Value) -> Result<Item, QueryError> {
        let excluded: Vec<&str> = self
            .meta
            .excluded_attributes
            .iter()
            .map(String::as_str)
            .collect();
        let mut attributes = attributes_from_payload(payload.clone(), &excluded)?;

        let unique_attribute = if let Some(derive) = &self.meta.unique_value {
            let value = derive(&attributes).ok_or_else(|| {
                QueryError::other(format!(
                    "could not derive the unique attribute of a {}",
                    self.meta.item_type
                ))
            })?;
            attributes.insert(UNIQUE_ATTRIBUTE_VALUE.into(), Value::String(value));
            UNIQUE_ATTRIBUTE_VALUE
        } else {
            let key_count = self.meta.unique_attribute_keys.len();
            let name = attributes
                .get("name")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    QueryError::other(format!(
                        "{} payload has no name attribute",
                        self.meta.item_type
                    ))
                })?;
            if key_count > 1 {
                let values =
                    extract_path_params_with_count(name, key_count).ok_or_else(|| {
                        QueryError::other(format!(
                            "resource name {name:?} does not carry {key_count} key/value pairs"
                        ))
                    })?;
                let composite = composite_lookup_key(&values);
                attributes.insert(UNIQUE_ATTRIBUTE_VALUE.into(), Value::String(composite));
                UNIQUE_ATTRIBUTE_VALUE
            } else {
                // Full resource names collapse to their final component.
                let short = last_path_component(name).to_string();
                attributes.insert("name".into(), Value::String(short));
                "name"
            }
        };

        let mut item = Item::new(
            self.meta.item_type.to_string(),
            unique_attribute,
            attributes,
            self.scope.clone(),
        );
        item.tags = tags_from_value(payload.get("labels"));
        if let Some(health) = &self.meta.health {
            item.health = health(&item.attributes);
        }
        for spec in &self.meta.links {
            self.linker
                .auto_link(&self.params.project_id, &mut item, &spec.target_type, &spec.field);
        }
        item.validate()?;
        Ok(item)
    }

    fn list_base_url(&self) -> Result<String, QueryError> {
        let endpoint = self
            .meta
            .list_endpoint
            .as_ref()
            .ok_or_else(|| QueryError::other("list endpoint not configured"))?;
        endpoint(&self.params).ok_or_else(|| self.unaddressable())
    }

    fn search_base_url(&self, query_parts: &[String]) -> Result<String, QueryError> {
        let endpoint = self
            .meta
            .search_endpoint
            .as_ref()
            .ok_or_else(|| QueryError::other("search endpoint not configured"))?;
        endpoint(&self.params, query_parts).ok_or_else(|| self.unaddressable())
    }

    fn unaddressable(&self) -> QueryError {
        QueryError::other(format!(
            "the bound scope parameters cannot address {}",
            self.meta.item_type
        ))
    }

    /// Fetch every page under `base_url` into one vector.
    async fn collect_paged(
        &self,
        base_url: String,
        cancel: &CancellationToken,
    ) -> Result<Vec<Item>, QueryError> {
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            ensure_not_cancelled(cancel)?;
            let url = match &page_token {
                Some(token) => with_page_token(&base_url, token),
                None => base_url.clone(),
            };
            let page = self.client.get_json(&url, "list").await?;
            for raw in page
                .get(self.meta.list_items_key.as_str())
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
            {
                items.push(self.transform(raw)?);
            }
            match next_page_token(&page) {
                Some(token) => page_token = Some(token),
                None => return Ok(items),
            }
        }
    }

    /// Stream every page under `base_url`, emitting items as pages arrive.
    fn paged_stream(
        self: Arc<Self>,
        base_url: String,
        cancel: CancellationToken,
    ) -> ItemStream {
        Box::pin(try_stream! {
            let mut page_token: Option<String> = None;
            loop {
                ensure_not_cancelled(&cancel)?;
                let url = match &page_token {
                    Some(token) => with_page_token(&base_url, token),
                    None => base_url.clone(),
                };
                let page = self.client.get_json(&url, "list").await?;
                for raw in page
                    .get(self.meta.list_items_key.as_str())
                    .and_then(Value::as_array)
                    .into_iter()
                    .flatten()
                {
                    yield self.transform(raw)?;
                }
                match next_page_token(&page) {
                    Some(token) => page_token = Some(token),
                    None => break,
                }
            }
        })
    }
}

fn next_page_token(page: &Value) -> Option<String> {
    match page.get("nextPageToken").and_then(Value::as_str) {
        Some(token) if !token.is_empty() => Some(token.to_string()),
        _ => None,
    }
}

fn with_page_token(base_url: &str, token: &str) -> String {
    let sep = if base_url.contains('?') { '&' } else { '?' };
    let encoded: String = form_urlencoded::byte_serialize(token.as_bytes()).collect();
    format!("{base_url}{sep}pageToken={encoded}")
}

#[async_trait::async_trait]
impl Getter for DynamicAdapter {
    fn item_type(&self) -> ItemType {
        self.meta.item_type.clone()
    }

    fn scopes(&self) -> Vec<String> {
        vec![self.scope.clone()]
    }

    fn category(&self) -> AdapterCategory {
        self.meta.category
    }

    fn get_lookups(&self) -> Vec<ItemTypeLookup> {
        self.meta
            .lookup_fields
            .iter()
            .map(|field| ItemTypeLookup::new(field.clone(), self.meta.item_type.clone()))
            .collect()
    }

    async fn get(
        &self,
        cancel: &CancellationToken,
        query_parts: &[String],
    ) -> Result<Item, QueryError> {
        ensure_not_cancelled(cancel)?;
        let url =
            (self.meta.get_endpoint)(&self.params, query_parts).ok_or_else(|| self.unaddressable())?;
        let payload = self.client.get_json(&url, "get").await?;
        self.transform(&payload)
    }

    fn potential_links(&self) -> Vec<String> {
        let mut targets: Vec<String> = self
            .meta
            .links
            .iter()
            .map(|spec| spec.target_type.clone())
            .collect();
        targets.sort();
        targets.dedup();
        targets
    }

    fn terraform_mappings(&self) -> Vec<TerraformMapping> {
        self.meta.terraform_mappings.clone()
    }

    fn iam_permissions(&self) -> Vec<String> {
        self.meta.iam_permissions.clone()
    }

    fn predefined_role(&self) -> Option<String> {
        self.meta.predefined_role.clone()
    }
}

#[async_trait::async_trait]
impl Lister for DynamicAdapter {
    async fn list(&self, cancel: &CancellationToken) -> Result<Vec<Item>, QueryError> {
        let base_url = self.list_base_url()?;
        self.collect_paged(base_url, cancel).await
    }

    fn list_stream(self: Arc<Self>, cancel: CancellationToken) -> ItemStream {
        match self.list_base_url() {
            Ok(base_url) => self.paged_stream(base_url, cancel),
            Err(err) => Box::pin(stream::once(async move { Err(err) })),
        }
    }
}

#[async_trait::async_trait]
impl Searcher for DynamicAdapter {
    fn search_lookups(&self) -> Vec<ItemTypeLookup> {
        self.meta
            .search_fields
            .iter()
            .map(|field| ItemTypeLookup::new(field.clone(), self.meta.item_type.clone()))
            .collect()
    }

    async fn search(
        &self,
        cancel: &CancellationToken,
        query_parts: &[String],
    ) -> Result<Vec<Item>, QueryError> {
        let base_url = self.search_base_url(query_parts)?;
        self.collect_paged(base_url, cancel).await
    }

    fn search_stream(
        self: Arc<Self>,
        cancel: CancellationToken,
        query_parts: Vec<String>,
    ) -> ItemStream {
        match self.search_base_url(&query_parts) {
            Ok(base_url) => self.paged_stream(base_url, cancel),
            Err(err) => Box::pin(stream::once(async move { Err(err) })),
        }
    }
}
