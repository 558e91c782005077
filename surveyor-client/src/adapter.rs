//! The adapter facade: one uniform query surface per resource type.
//!
//! An [`Adapter`] wraps any [`Wrapper`] (handcrafted or dynamic) and adds
//! what every resource type needs: construction-time validation, scope
//! checking, query parsing, caching, streaming and metadata synthesis. An
//! adapter that fails validation is never handed out, so a constructed
//! adapter is always ready to serve.
use std::{sync::Arc, time::Duration};

use async_stream::try_stream;
use futures::{stream, StreamExt};
use surveyor_core::{
    paths::extract_path_params_with_count,
    scope::WILDCARD_SCOPE,
    AdapterMetadata, Item, QueryError, QueryMethod, SupportedQueryMethods, TerraformMethod,
};
use thiserror::Error;

use crate::{
    cache::{CacheKey, QueryCache, DEFAULT_CACHE_TTL},
    params::QueryParams,
    permissions::RoleTable,
    wrapper::{ItemStream, Wrapper},
};

/// Why an adapter could not be constructed.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The wrapper declares no scopes.
    #[error("adapter {adapter} declares no scopes")]
    MissingScopes {
        /// Adapter name
        adapter: String,
    },
    /// The wrapper declares no GET lookups.
    #[error("adapter {adapter} declares no get lookups")]
    MissingLookups {
        /// Adapter name
        adapter: String,
    },
    /// The bound scope parameters cannot produce the adapter's scope.
    #[error("adapter {adapter} cannot derive its scope from the bound parameters")]
    MissingScopeParams {
        /// Adapter name
        adapter: String,
    },
    /// Role validation was requested but the wrapper declares no role.
    #[error("adapter {adapter} declares no predefined role")]
    MissingRole {
        /// Adapter name
        adapter: String,
    },
    /// The declared role is not in the provider's role table.
    #[error("predefined role {role} of adapter {adapter} is not registered")]
    UnknownRole {
        /// Adapter name
        adapter: String,
        /// The unregistered role
        role: String,
    },
    /// A declared permission is not granted by the declared role.
    #[error("permission {permission} of adapter {adapter} is not granted by role {role}")]
    UngrantedPermission {
        /// Adapter name
        adapter: String,
        /// The declared role
        role: String,
        /// The missing permission
        permission: String,
    },
}

/// The uniform query-facing unit for one resource type.
#[derive(Debug)]
pub struct Adapter {
    wrapper: Wrapper,
    cache: Arc<QueryCache>,
    cache_ttl: Duration,
    name: String,
    scopes: Vec<String>,
    terraform_search: bool,
    metadata: AdapterMetadata,
}

impl Adapter {
    /// Wrap and validate, without role validation.
    pub fn new(wrapper: Wrapper, cache: Arc<QueryCache>) -> Result<Self, AdapterError> {
        Self::validated(wrapper, cache, None)
    }

    /// Wrap and validate against a provider role table: the wrapper must
    /// declare a registered role granting every declared permission.
    pub fn with_role_table(
        wrapper: Wrapper,
        cache: Arc<QueryCache>,
        roles: &RoleTable,
    ) -> Result<Self, AdapterError> {
        Self::validated(wrapper, cache, Some(roles))
    }

    fn validated(
        wrapper: Wrapper,
        cache: Arc<QueryCache>,
        roles: Option<&RoleTable>,
    ) -> Result<Self, AdapterError> {
        let name = wrapper.name();
        let scopes = wrapper.scopes();
        if scopes.is_empty() {
            return Err(AdapterError::MissingScopes { adapter: name });
        }
        if wrapper.get_lookups().is_empty() {
            return Err(AdapterError::MissingLookups { adapter: name });
        }
        if let Some(roles) = roles {
            let role = wrapper
                .predefined_role()
                .ok_or_else(|| AdapterError::MissingRole {
                    adapter: name.clone(),
                })?;
            let granted =
                roles
                    .permissions(&role)
                    .ok_or_else(|| AdapterError::UnknownRole {
                        adapter: name.clone(),
                        role: role.clone(),
                    })?;
            for permission in wrapper.iam_permissions() {
                if !granted.contains(&permission) {
                    return Err(AdapterError::UngrantedPermission {
                        adapter: name,
                        role,
                        permission,
                    });
                }
            }
        }

        // Terraform `projects/…` searches route through GET, so mappings
        // make an otherwise search-less GCP wrapper searchable.
        let terraform_search = wrapper.item_type().source == "gcp"
            && wrapper
                .terraform_mappings()
                .iter()
                .any(|m| m.method == TerraformMethod::Search);
        let metadata = synthesize_metadata(&wrapper, terraform_search);
        Ok(Self {
            wrapper,
            cache,
            cache_ttl: DEFAULT_CACHE_TTL,
            name,
            scopes,
            terraform_search,
            metadata,
        })
    }

    /// Adapter name (the type string unless the wrapper overrides it).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Served item type string.
    pub fn item_type(&self) -> &str {
        &self.metadata.item_type
    }

    /// Scopes this adapter answers for.
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    /// Synthesized adapter metadata.
    pub fn metadata(&self) -> &AdapterMetadata {
        &self.metadata
    }

    /// IAM permissions the underlying wrapper requires.
    pub fn iam_permissions(&self) -> Vec<String> {
        self.wrapper.iam_permissions()
    }

    /// Whether LIST is available.
    pub fn supports_list(&self) -> bool {
        self.wrapper.supports_list()
    }

    /// Whether SEARCH (composite or terraform) is available.
    pub fn supports_search(&self) -> bool {
        self.wrapper.supports_search() || self.terraform_search
    }

    /// Get one item by query.
    pub async fn get(&self, scope: &str, query: &str) -> Result<Item, QueryError> {
        self.get_with(scope, query, &QueryParams::default()).await
    }

    /// [`get`](Self::get) with explicit [`QueryParams`].
    pub async fn get_with(
        &self,
        scope: &str,
        query: &str,
        params: &QueryParams,
    ) -> Result<Item, QueryError> {
        self.check_scope(scope)?;
        let expected = self.wrapper.get_lookups().len();
        let parts = split_query(query, expected, "invalid query format")
            .map_err(|e| self.tagged(e, scope))?;

        let key = self.cache_key(QueryMethod::Get, scope, query);
        if let Some(items) = self.cache.lookup(&key, params.ignore_cache) {
            if let Some(item) = items.into_iter().next() {
                return Ok(item);
            }
        }
        let item = self
            .wrapper
            .get(&params.cancel, &parts)
            .await
            .map_err(|e| self.tagged(e, scope))?;
        self.cache.store(key, vec![item.clone()], self.cache_ttl);
        Ok(item)
    }

    /// List every item in scope.
    pub async fn list(&self, scope: &str) -> Result<Vec<Item>, QueryError> {
        self.list_with(scope, &QueryParams::default()).await
    }

    /// [`list`](Self::list) with explicit [`QueryParams`].
    pub async fn list_with(
        &self,
        scope: &str,
        params: &QueryParams,
    ) -> Result<Vec<Item>, QueryError> {
        self.check_scope(scope)?;
        let lister = self
            .wrapper
            .lister()
            .ok_or_else(|| self.tagged(self.unsupported(QueryMethod::List), scope))?;

        let key = self.cache_key(QueryMethod::List, scope, "");
        if let Some(items) = self.cache.lookup(&key, params.ignore_cache) {
            return Ok(items);
        }
        let items = lister
            .list(&params.cancel)
            .await
            .map_err(|e| self.tagged(e, scope))?;
        self.cache.store(key, items.clone(), self.cache_ttl);
        Ok(items)
    }

    /// Stream every item in scope, emitting as the wrapper produces them.
    pub fn list_stream(&self, scope: &str, params: &QueryParams) -> ItemStream {
        if let Err(err) = self.check_scope(scope) {
            return err_stream(err);
        }
        let Some(lister) = self.wrapper.lister() else {
            return err_stream(self.tagged(self.unsupported(QueryMethod::List), scope));
        };
        let key = self.cache_key(QueryMethod::List, scope, "");
        if let Some(items) = self.cache.lookup(&key, params.ignore_cache) {
            return Box::pin(stream::iter(items.into_iter().map(Ok)));
        }
        let inner = lister.list_stream(params.cancel.clone());
        self.cached_stream(key, inner)
    }

    /// Search for items by composite or terraform-style query.
    pub async fn search(&self, scope: &str, query: &str) -> Result<Vec<Item>, QueryError> {
        self.search_with(scope, query, &QueryParams::default()).await
    }

    /// [`search`](Self::search) with explicit [`QueryParams`].
    pub async fn search_with(
        &self,
        scope: &str,
        query: &str,
        params: &QueryParams,
    ) -> Result<Vec<Item>, QueryError> {
        self.check_scope(scope)?;
        if !self.supports_search() {
            return Err(self.tagged(self.unsupported(QueryMethod::Search), scope));
        }
        // A terraform-shaped search resolves through GET but is cached under
        // the original SEARCH query string.
        let key = self.cache_key(QueryMethod::Search, scope, query);
        if let Some(items) = self.cache.lookup(&key, params.ignore_cache) {
            return Ok(items);
        }
        let items = self
            .execute_search(query, params)
            .await
            .map_err(|e| self.tagged(e, scope))?;
        self.cache.store(key, items.clone(), self.cache_ttl);
        Ok(items)
    }

    /// Stream search results, emitting as the wrapper produces them.
    pub fn search_stream(&self, scope: &str, query: &str, params: &QueryParams) -> ItemStream {
        if let Err(err) = self.check_scope(scope) {
            return err_stream(err);
        }
        if !self.supports_search() {
            return err_stream(self.tagged(self.unsupported(QueryMethod::Search), scope));
        }
        let key = self.cache_key(QueryMethod::Search, scope, query);
        if let Some(items) = self.cache.lookup(&key, params.ignore_cache) {
            return Box::pin(stream::iter(items.into_iter().map(Ok)));
        }

        let inner: ItemStream = if self.is_terraform_query(query) {
            let wrapper = self.wrapper.clone();
            let cancel = params.cancel.clone();
            let arity = self.wrapper.get_lookups().len();
            let query = query.to_string();
            Box::pin(try_stream! {
                let parts = terraform_parts(&query, arity)?;
                let item = wrapper.get(&cancel, &parts).await?;
                yield item;
            })
        } else {
            let Some(searcher) = self.wrapper.searcher() else {
                return err_stream(self.tagged(self.unsupported(QueryMethod::Search), scope));
            };
            let expected = searcher.search_lookups().len();
            match split_query(query, expected, "invalid search query format") {
                Ok(parts) => searcher.search_stream(params.cancel.clone(), parts),
                Err(err) => return err_stream(self.tagged(err, scope)),
            }
        };
        self.cached_stream(key, inner)
    }

    async fn execute_search(
        &self,
        query: &str,
        params: &QueryParams,
    ) -> Result<Vec<Item>, QueryError> {
        if self.is_terraform_query(query) {
            let arity = self.wrapper.get_lookups().len();
            let parts = terraform_parts(query, arity)?;
            let item = self.wrapper.get(&params.cancel, &parts).await?;
            return Ok(vec![item]);
        }
        let searcher = self
            .wrapper
            .searcher()
            .ok_or_else(|| self.unsupported(QueryMethod::Search))?;
        let expected = searcher.search_lookups().len();
        let parts = split_query(query, expected, "invalid search query format")?;
        searcher.search(&params.cancel, &parts).await
    }

    /// Whether a SEARCH query should route through the terraform mapping.
    fn is_terraform_query(&self, query: &str) -> bool {
        self.metadata.item_type.starts_with("gcp-") && query.starts_with("projects/")
    }

    fn check_scope(&self, scope: &str) -> Result<(), QueryError> {
        if scope == WILDCARD_SCOPE || self.scopes.iter().any(|s| s == scope) {
            return Ok(());
        }
        Err(self.tagged(
            QueryError::no_scope(format!(
                "scope {scope:?} is not served by this adapter (known scopes: {:?})",
                self.scopes
            )),
            scope,
        ))
    }

    fn cache_key(&self, method: QueryMethod, scope: &str, query: &str) -> CacheKey {
        CacheKey::new(
            self.name.clone(),
            method,
            scope,
            self.metadata.item_type.clone(),
            query,
        )
    }

    fn unsupported(&self, method: QueryMethod) -> QueryError {
        QueryError::other(format!(
            "adapter {} does not support {method}",
            self.name
        ))
    }

    fn tagged(&self, err: QueryError, scope: &str) -> QueryError {
        err.with_source(self.name.clone())
            .with_scope(scope)
            .with_item_type(self.metadata.item_type.clone())
    }

    /// Forward a wrapper stream while teeing items into the cache; the
    /// entry is stored only when the stream completes cleanly.
    fn cached_stream(&self, key: CacheKey, inner: ItemStream) -> ItemStream {
        let cache = self.cache.clone();
        let ttl = self.cache_ttl;
        let name = self.name.clone();
        let scope = key.scope.clone();
        let item_type = key.item_type.clone();
        Box::pin(async_stream::stream! {
            let mut inner = inner;
            let mut collected = Vec::new();
            let mut clean = true;
            while let Some(next) = inner.next().await {
                match next {
                    Ok(item) => {
                        collected.push(item.clone());
                        yield Ok(item);
                    }
                    Err(err) => {
                        clean = false;
                        yield Err(err
                            .with_source(name.clone())
                            .with_scope(scope.clone())
                            .with_item_type(item_type.clone()));
                        break;
                    }
                }
            }
            if clean {
                cache.store(key, collected, ttl);
            }
        })
    }
}

fn err_stream(err: QueryError) -> ItemStream {
    Box::pin(stream::once(async move { Err(err) }))
}

/// Split a composite query and check its arity against the declared lookups.
fn split_query(query: &str, expected: usize, message: &str) -> Result<Vec<String>, QueryError> {
    let parts: Vec<String> = query.split('|').map(str::to_string).collect();
    if parts.len() != expected || parts.iter().any(String::is_empty) {
        return Err(QueryError::not_found(format!(
            "{message}: expected {expected} part(s), got {:?}",
            query
        )));
    }
    Ok(parts)
}

/// Extract the GET lookup values from a terraform `projects/…` query.
fn terraform_parts(query: &str, arity: usize) -> Result<Vec<String>, QueryError> {
    let values = extract_path_params_with_count(query, arity).ok_or_else(|| {
        QueryError::not_found(format!(
            "could not extract {arity} lookup value(s) from terraform query {query:?}"
        ))
    })?;
    Ok(values.into_iter().map(str::to_string).collect())
}

fn synthesize_metadata(wrapper: &Wrapper, terraform_search: bool) -> AdapterMetadata {
    let item_type = wrapper.item_type();
    let readable = item_type.readable();
    let get_fields: Vec<String> = wrapper.get_lookups().into_iter().map(|l| l.field).collect();

    let mut methods = SupportedQueryMethods {
        get: Some(format!(
            "get a {readable} by \"{}\"",
            get_fields.join("|")
        )),
        ..Default::default()
    };
    if wrapper.supports_list() {
        methods.list = Some(format!("list all {readable} resources in the scope"));
    }
    let mut search_forms = Vec::new();
    if let Some(searcher) = wrapper.searcher() {
        let fields: Vec<String> = searcher
            .search_lookups()
            .into_iter()
            .map(|l| l.field)
            .collect();
        search_forms.push(format!("by \"{}\"", fields.join("|")));
    }
    if terraform_search {
        search_forms.push("by terraform mapping query".to_string());
    }
    if !search_forms.is_empty() {
        methods.search = Some(format!(
            "search for {readable} resources {}",
            search_forms.join(" or ")
        ));
    }

    AdapterMetadata {
        item_type: item_type.to_string(),
        descriptive_name: readable,
        category: wrapper.category(),
        supported_methods: methods,
        potential_links: wrapper.potential_links(),
        terraform_mappings: wrapper.terraform_mappings(),
    }
}
