//! The pre-facade handler interface adapters wrap.
//!
//! A wrapper's capability set is expressed as traits: every wrapper is a
//! [`Getter`], and may additionally be a [`Lister`], a [`Searcher`], or
//! both. The [`Wrapper`] enum tags the combination at construction so the
//! facade can discover capabilities without downcasting.
use std::{fmt, sync::Arc};

use async_stream::try_stream;
use async_trait::async_trait;
use futures::stream::BoxStream;
use surveyor_core::{
    AdapterCategory, Item, ItemType, ItemTypeLookup, QueryError, TerraformMapping,
};
use tokio_util::sync::CancellationToken;

/// Stream of transformed items; errors terminate the stream.
pub type ItemStream = BoxStream<'static, Result<Item, QueryError>>;

/// Bail out with a cancellation error once `cancel` has fired.
///
/// Wrappers call this before every provider round trip so an aborted query
/// stops fetching instead of finishing the page walk.
pub fn ensure_not_cancelled(cancel: &CancellationToken) -> Result<(), QueryError> {
    if cancel.is_cancelled() {
        Err(QueryError::cancelled())
    } else {
        Ok(())
    }
}

/// The required capability: fetch one item by its lookup values.
#[async_trait]
pub trait Getter: Send + Sync + 'static {
    /// Type served by this wrapper.
    fn item_type(&self) -> ItemType;

    /// Unique name of this wrapper; defaults to the type string.
    fn name(&self) -> String {
        self.item_type().to_string()
    }

    /// Scopes this wrapper answers for.
    fn scopes(&self) -> Vec<String>;

    /// Functional grouping for metadata.
    fn category(&self) -> AdapterCategory;

    /// The lookup fields a GET accepts, in composite order.
    fn get_lookups(&self) -> Vec<ItemTypeLookup>;

    /// Fetch one item; `query_parts` has exactly `get_lookups().len()`
    /// entries, already split by the facade.
    async fn get(
        &self,
        cancel: &CancellationToken,
        query_parts: &[String],
    ) -> Result<Item, QueryError>;

    /// Types this wrapper may emit linked-item queries for.
    fn potential_links(&self) -> Vec<String> {
        Vec::new()
    }

    /// Terraform addresses resolvable through this wrapper.
    fn terraform_mappings(&self) -> Vec<TerraformMapping> {
        Vec::new()
    }

    /// IAM permissions the wrapper's calls require.
    fn iam_permissions(&self) -> Vec<String> {
        Vec::new()
    }

    /// The provider role expected to grant [`Getter::iam_permissions`].
    fn predefined_role(&self) -> Option<String> {
        None
    }
}

/// Optional capability: enumerate every item in scope.
#[async_trait]
pub trait Lister: Getter {
    /// Fetch all items in scope.
    async fn list(&self, cancel: &CancellationToken) -> Result<Vec<Item>, QueryError>;

    /// Stream items as they are produced.
    ///
    /// The default drains [`Lister::list`]; paginating wrappers override it
    /// to emit per page.
    fn list_stream(self: Arc<Self>, cancel: CancellationToken) -> ItemStream {
        Box::pin(try_stream! {
            let items = self.list(&cancel).await?;
            for item in items {
                yield item;
            }
        })
    }
}

/// Optional capability: fetch items matching a composite query.
#[async_trait]
pub trait Searcher: Getter {
    /// The lookup fields a composite SEARCH accepts, in order.
    fn search_lookups(&self) -> Vec<ItemTypeLookup>;

    /// Fetch all items matching the query parts.
    async fn search(
        &self,
        cancel: &CancellationToken,
        query_parts: &[String],
    ) -> Result<Vec<Item>, QueryError>;

    /// Stream matching items as they are produced.
    fn search_stream(
        self: Arc<Self>,
        cancel: CancellationToken,
        query_parts: Vec<String>,
    ) -> ItemStream {
        Box::pin(try_stream! {
            let items = self.search(&cancel, &query_parts).await?;
            for item in items {
                yield item;
            }
        })
    }
}

macro_rules! dispatch {
    ($self:expr, $w:pat => $body:expr) => {
        match $self {
            Wrapper::Get($w) => $body,
            Wrapper::List($w) => $body,
            Wrapper::Search($w) => $body,
            Wrapper::Full { list: $w, .. } => $body,
        }
    };
}

/// A wrapper tagged with its capability combination.
#[derive(Clone)]
pub enum Wrapper {
    /// GET only
    Get(Arc<dyn Getter>),
    /// GET + LIST
    List(Arc<dyn Lister>),
    /// GET + SEARCH
    Search(Arc<dyn Searcher>),
    /// GET + LIST + SEARCH; both arcs point at the same wrapper
    Full {
        /// The wrapper as a lister
        list: Arc<dyn Lister>,
        /// The wrapper as a searcher
        search: Arc<dyn Searcher>,
    },
}

impl fmt::Debug for Wrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let variant = match self {
            Wrapper::Get(_) => "Get",
            Wrapper::List(_) => "List",
            Wrapper::Search(_) => "Search",
            Wrapper::Full { .. } => "Full",
        };
        f.debug_tuple("Wrapper").field(&variant).finish()
    }
}

impl Wrapper {
    /// Wrap a GET-only handler.
    pub fn get_only<W: Getter>(wrapper: W) -> Self {
        Wrapper::Get(Arc::new(wrapper))
    }

    /// Wrap a handler that can also LIST.
    pub fn listable<W: Lister>(wrapper: W) -> Self {
        Wrapper::List(Arc::new(wrapper))
    }

    /// Wrap a handler that can also SEARCH.
    pub fn searchable<W: Searcher>(wrapper: W) -> Self {
        Wrapper::Search(Arc::new(wrapper))
    }

    /// Wrap a handler with the full capability set.
    pub fn full<W: Lister + Searcher>(wrapper: W) -> Self {
        let wrapper = Arc::new(wrapper);
        Wrapper::Full {
            list: wrapper.clone(),
            search: wrapper,
        }
    }

    /// Type served by the wrapper.
    pub fn item_type(&self) -> ItemType {
        dispatch!(self, w => w.item_type())
    }

    /// Wrapper name.
    pub fn name(&self) -> String {
        dispatch!(self, w => w.name())
    }

    /// Scopes the wrapper answers for.
    pub fn scopes(&self) -> Vec<String> {
        dispatch!(self, w => w.scopes())
    }

    /// Functional grouping.
    pub fn category(&self) -> AdapterCategory {
        dispatch!(self, w => w.category())
    }

    /// GET lookup fields.
    pub fn get_lookups(&self) -> Vec<ItemTypeLookup> {
        dispatch!(self, w => w.get_lookups())
    }

    /// Potential link targets.
    pub fn potential_links(&self) -> Vec<String> {
        dispatch!(self, w => w.potential_links())
    }

    /// Terraform mappings.
    pub fn terraform_mappings(&self) -> Vec<TerraformMapping> {
        dispatch!(self, w => w.terraform_mappings())
    }

    /// Required IAM permissions.
    pub fn iam_permissions(&self) -> Vec<String> {
        dispatch!(self, w => w.iam_permissions())
    }

    /// Declared predefined role.
    pub fn predefined_role(&self) -> Option<String> {
        dispatch!(self, w => w.predefined_role())
    }

    /// Execute a GET.
    pub async fn get(
        &self,
        cancel: &CancellationToken,
        query_parts: &[String],
    ) -> Result<Item, QueryError> {
        dispatch!(self, w => w.get(cancel, query_parts).await)
    }

    /// The wrapper as a lister, when it has the capability.
    pub fn lister(&self) -> Option<Arc<dyn Lister>> {
        match self {
            Wrapper::List(w) => Some(w.clone()),
            Wrapper::Full { list, .. } => Some(list.clone()),
            _ => None,
        }
    }

    /// The wrapper as a searcher, when it has the capability.
    pub fn searcher(&self) -> Option<Arc<dyn Searcher>> {
        match self {
            Wrapper::Search(w) => Some(w.clone()),
            Wrapper::Full { search, .. } => Some(search.clone()),
            _ => None,
        }
    }

    /// Whether LIST is supported.
    pub fn supports_list(&self) -> bool {
        matches!(self, Wrapper::List(_) | Wrapper::Full { .. })
    }

    /// Whether composite SEARCH is supported.
    pub fn supports_search(&self) -> bool {
        matches!(self, Wrapper::Search(_) | Wrapper::Full { .. })
    }
}
