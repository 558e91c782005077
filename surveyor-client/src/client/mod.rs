//! A thin HTTP client for talking to provider REST APIs.
//!
//! The [`Client`] wraps an arbitrary tower [`Service`] stack, which is how
//! tests inject fake providers and how the default stack layers TLS, auth
//! and tracing. Provider HTTP statuses are mapped into the query error
//! taxonomy here, at the boundary, and nowhere else.
use bytes::Bytes;
use futures::future::BoxFuture;
use http::{Request, Response, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use surveyor_core::QueryError;
use thiserror::Error;
use tower::{buffer::Buffer, util::BoxService, BoxError, Layer, Service, ServiceExt};
use tower_http::map_response_body::MapResponseBodyLayer;

mod body;
mod builder;

pub use body::Body;
pub use builder::ClientBuilder;

/// Errors constructing a client; query failures are [`QueryError`] instead.
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to load the native TLS root store.
    #[error("failed to load native TLS roots: {0}")]
    NativeRoots(#[source] std::io::Error),
}

/// HTTP client for provider APIs.
///
/// Cheap to clone; all clones share the underlying service.
#[derive(Clone)]
pub struct Client {
    // - `Buffer` for cheap clone
    // - `BoxService` for dynamic response future type
    inner: Buffer<Request<Body>, BoxFuture<'static, Result<Response<Body>, BoxError>>>,
}

impl Client {
    /// Create a [`Client`] from a custom `Service` stack.
    ///
    /// [`ClientBuilder`] provides the default stack; tests typically pass a
    /// `tower_test::mock` pair here.
    pub fn new<S, B>(service: S) -> Self
    where
        S: Service<Request<Body>, Response = Response<B>> + Send + 'static,
        S::Future: Send + 'static,
        S::Error: Into<BoxError>,
        B: http_body::Body<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        // Erase the response body type so callers only ever see `Body`.
        let service = MapResponseBodyLayer::new(|b: B| Body::wrap_body(b))
            .layer(service)
            .map_err(|e| e.into());
        Self {
            inner: Buffer::new(BoxService::new(service), 1024),
        }
    }

    /// Perform a raw request and return the raw response.
    pub async fn send(&self, request: Request<Body>) -> Result<Response<Body>, QueryError> {
        let mut svc = self.inner.clone();
        svc.ready()
            .await
            .map_err(|err| QueryError::other(format!("client not ready: {err}")))?
            .call(request)
            .await
            .map_err(|err| QueryError::other(format!("request failed: {err}")))
    }

    /// GET a URL and parse the response as JSON.
    ///
    /// `purpose` names the operation on the request extensions so the trace
    /// layer can label the span.
    pub async fn get_json(&self, url: &str, purpose: &'static str) -> Result<Value, QueryError> {
        let mut request = Request::get(url)
            .body(Body::empty())
            .map_err(|err| QueryError::other(format!("failed to build request: {err}")))?;
        request.extensions_mut().insert(purpose);

        let response = self.send(request).await?;
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .map_err(|err| QueryError::other(format!("failed to read response body: {err}")))?
            .to_bytes();
        let text = String::from_utf8_lossy(&bytes);

        if !status.is_success() {
            return Err(error_for_status(status, &text));
        }
        serde_json::from_str(&text).map_err(|err| {
            tracing::warn!(%err, "response was not valid JSON");
            QueryError::other(format!("error parsing response: {err}"))
        })
    }
}

/// Map a non-2xx provider status into the taxonomy.
///
/// 400/403/404 are NOTFOUND (a 403 does not reveal whether the resource
/// exists), 401 is AUTH, 429 and 5xx are OTHER with a retry hint; anything
/// else is OTHER.
pub(crate) fn error_for_status(status: StatusCode, body: &str) -> QueryError {
    let message = provider_message(body)
        .unwrap_or_else(|| format!("provider returned status {status}"));
    match status.as_u16() {
        400 | 403 | 404 => QueryError::not_found(message),
        401 => QueryError::auth(message),
        429 => QueryError::other(format!("{message} (retryable)")),
        500..=599 => QueryError::other(format!("{message} (retryable)")),
        _ => QueryError::other(message),
    }
}

/// Pull the human message out of a provider error body when there is one.
fn provider_message(body: &str) -> Option<String> {
    if body.trim().is_empty() {
        return None;
    }
    if let Ok(parsed) = serde_json::from_str::<Value>(body) {
        if let Some(message) = parsed
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(Value::as_str)
        {
            return Some(message.to_string());
        }
    }
    Some(body.trim().to_string())
}
