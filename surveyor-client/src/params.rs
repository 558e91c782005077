//! Per-request options for the query surface.
use tokio_util::sync::CancellationToken;

/// Options accepted by the `*_with` variants of every query method.
///
/// ```
/// use surveyor_client::QueryParams;
/// use tokio_util::sync::CancellationToken;
///
/// let cancel = CancellationToken::new();
/// let params = QueryParams::default().ignore_cache().cancel(cancel.clone());
/// ```
#[derive(Clone, Debug, Default)]
pub struct QueryParams {
    /// Bypass the cache for this request; the fresh result is still stored.
    pub ignore_cache: bool,
    /// Token aborting in-flight work; checked before every page fetch.
    pub cancel: CancellationToken,
}

impl QueryParams {
    /// Bypass the cache.
    #[must_use]
    pub fn ignore_cache(mut self) -> Self {
        self.ignore_cache = true;
        self
    }

    /// Attach a cancellation token.
    #[must_use]
    pub fn cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }
}
