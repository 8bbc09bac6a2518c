//! Upstream HTTP client abstraction.
//!
//! See [`UpstreamClient`] for details.

use bytes::Bytes;
use futures::future::BoxFuture;
use http::{Request, Response};
use http_body_util::{combinators, BodyExt, Empty, Full};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;

use crate::error::BoxError;

/// Body of an outbound request to Sora. Always empty.
pub type RequestBody = Empty<Bytes>;

/// Boxed HTTP body of an upstream response.
pub type ResponseBody = combinators::BoxBody<Bytes, BoxError>;

/// Sends one HTTP request and resolves to one response or an error.
///
/// Only transport failures are errors. A response with a non-2xx status is
/// still a response.
///
/// ```
/// # use sora_exporter::client::{full, RequestBody, ResponseBody, UpstreamClient};
/// # use sora_exporter::error::BoxError;
/// # use futures::future::BoxFuture;
/// # use http::{Request, Response};
/// #[derive(Debug)]
/// struct Fixed;
///
/// impl UpstreamClient for Fixed {
///     fn send(
///         &self,
///         _request: Request<RequestBody>,
///     ) -> BoxFuture<'_, Result<Response<ResponseBody>, BoxError>> {
///         Box::pin(async { Ok(Response::new(full(r#"{"total_connection_created": 1}"#))) })
///     }
/// }
/// ```
pub trait UpstreamClient: std::fmt::Debug + Send + Sync + 'static {
    /// Send `request` upstream.
    fn send(
        &self,
        request: Request<RequestBody>,
    ) -> BoxFuture<'_, Result<Response<ResponseBody>, BoxError>>;
}

/// [`UpstreamClient`] backed by a pooled hyper HTTP/1 client.
///
/// Both `http` and `https` URLs are accepted. TLS trusts the platform's
/// root certificates, or the bundled webpki roots when those cannot be
/// loaded.
#[derive(Debug, Clone)]
pub struct HyperClient {
    inner: Client<HttpsConnector<HttpConnector>, RequestBody>,
}

impl HyperClient {
    /// Create a new client with the default connector.
    pub fn new() -> Self {
        let builder = match HttpsConnectorBuilder::new().with_native_roots() {
            Ok(builder) => builder,
            Err(error) => {
                tracing::warn!(%error, "failed to load native root certificates");
                HttpsConnectorBuilder::new().with_webpki_roots()
            }
        };
        let connector = builder.https_or_http().enable_http1().build();

        HyperClient {
            inner: Client::builder(TokioExecutor::new()).build(connector),
        }
    }
}

impl Default for HyperClient {
    fn default() -> Self {
        Self::new()
    }
}

impl UpstreamClient for HyperClient {
    fn send(
        &self,
        request: Request<RequestBody>,
    ) -> BoxFuture<'_, Result<Response<ResponseBody>, BoxError>> {
        Box::pin(async move {
            let response = self.inner.request(request).await?;
            Ok(response.map(|body| body.map_err(BoxError::from).boxed()))
        })
    }
}

/// Helper function to build a full boxed response body.
pub fn full(body: impl Into<Bytes>) -> ResponseBody {
    Full::new(body.into())
        .map_err(|never| match never {})
        .boxed()
}
