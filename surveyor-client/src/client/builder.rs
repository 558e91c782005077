use http::{Request, Response};
use hyper_util::{client::legacy::connect::HttpConnector, rt::TokioExecutor};
use secrecy::{ExposeSecret, SecretString};
use tower::{util::BoxService, BoxError, Layer, Service, ServiceBuilder, ServiceExt};
use tower_http::{
    auth::AddAuthorizationLayer, classify::ServerErrorsFailureClass,
    map_response_body::MapResponseBodyLayer, trace::TraceLayer,
};

use super::{Body, Client, Error};

/// Builder for [`Client`] instances with customized [tower](`Service`) middleware.
pub struct ClientBuilder<Svc> {
    service: Svc,
}

impl<Svc> ClientBuilder<Svc> {
    /// Construct a [`ClientBuilder`] from a fully custom [`Service`] stack.
    ///
    /// Most callers want [`ClientBuilder::https`], which provides the
    /// default stack as a starting point.
    pub fn new(service: Svc) -> Self
    where
        Svc: Service<Request<Body>>,
    {
        Self { service }
    }

    /// Add a [`Layer`] to the current [`Service`] stack.
    pub fn with_layer<L: Layer<Svc>>(self, layer: &L) -> ClientBuilder<L::Service> {
        ClientBuilder {
            service: layer.layer(self.service),
        }
    }

    /// Build a [`Client`] from the current [`Service`] stack.
    pub fn build<B>(self) -> Client
    where
        Svc: Service<Request<Body>, Response = Response<B>> + Send + 'static,
        Svc::Future: Send + 'static,
        Svc::Error: Into<BoxError>,
        B: http_body::Body<Data = bytes::Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        Client::new(self.service)
    }
}

type DefaultService = BoxService<Request<Body>, Response<Body>, BoxError>;

impl ClientBuilder<DefaultService> {
    /// The default stack: a rustls HTTPS connector with the native root
    /// store, an optional bearer token, and HTTP span instrumentation.
    ///
    /// Credential acquisition is the caller's concern; whatever produced the
    /// token stays outside this crate.
    pub fn https(bearer_token: Option<SecretString>) -> Result<Self, Error> {
        let mut connector = HttpConnector::new();
        connector.enforce_http(false);
        let connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_native_roots()
            .map_err(Error::NativeRoots)?
            .https_or_http()
            .enable_http1()
            .wrap_connector(connector);

        let client: hyper_util::client::legacy::Client<_, Body> =
            hyper_util::client::legacy::Client::builder(TokioExecutor::new()).build(connector);

        let auth_layer = bearer_token
            .as_ref()
            .map(|token| AddAuthorizationLayer::bearer(token.expose_secret()).as_sensitive(true));

        let service = ServiceBuilder::new()
            .option_layer(auth_layer)
            .layer(
                // Attribute names follow OpenTelemetry semantic conventions.
                TraceLayer::new_for_http()
                    .make_span_with(|req: &Request<Body>| {
                        tracing::debug_span!(
                            "HTTP",
                            http.method = %req.method(),
                            http.url = %req.uri(),
                            http.status_code = tracing::field::Empty,
                            otel.name = req.extensions().get::<&'static str>().unwrap_or(&"HTTP"),
                            otel.kind = "client",
                            otel.status_code = tracing::field::Empty,
                        )
                    })
                    .on_response(
                        |res: &Response<hyper::body::Incoming>,
                         _latency: std::time::Duration,
                         span: &tracing::Span| {
                            let status = res.status();
                            span.record("http.status_code", status.as_u16());
                            if status.is_client_error() || status.is_server_error() {
                                span.record("otel.status_code", "ERROR");
                            }
                        },
                    )
                    .on_failure(
                        |class: ServerErrorsFailureClass,
                         _latency: std::time::Duration,
                         span: &tracing::Span| {
                            span.record("otel.status_code", "ERROR");
                            match class {
                                ServerErrorsFailureClass::StatusCode(status) => {
                                    span.record("http.status_code", status.as_u16());
                                    tracing::debug!("failed with status {status}");
                                }
                                ServerErrorsFailureClass::Error(err) => {
                                    tracing::debug!("failed with error {err}");
                                }
                            }
                        },
                    ),
            )
            .service(client)
            .map_err(|e| Into::<BoxError>::into(e));

        let service = MapResponseBodyLayer::new(|b| Body::wrap_body(b)).layer(service);

        Ok(Self {
            service: BoxService::new(service),
        })
    }
}
