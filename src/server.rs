//! HTTP server exposing the scrape endpoint.

use std::convert::Infallible;
use std::future::Future;
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::{header, Request, Response, StatusCode};
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use prometheus_client::encoding::text::encode;
use prometheus_client::registry::Registry;
use tokio::net::TcpListener;
use tokio::pin;
use tokio::sync::watch;
use tokio::task::JoinSet;

use crate::collector::{Scrape, SoraCollector};
use crate::metrics::{register_build_info, HandlerMetrics, PREFIX};
use crate::version::Version;

/// Content type of the OpenMetrics text exposition.
pub const CONTENT_TYPE: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";

/// Time open connections get to finish once shutdown is requested.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Pause after a failed accept, e.g. when out of file descriptors.
pub const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Serves scrapes of a [`SoraCollector`] together with the exporter's own
/// metrics.
#[derive(Debug)]
pub struct Exporter {
    collector: SoraCollector,
    metrics_path: String,
    handler_metrics: HandlerMetrics,
    version: Version,
}

impl Exporter {
    /// Create a new exporter answering scrapes on `metrics_path`.
    pub fn new(collector: SoraCollector, metrics_path: impl Into<String>, version: Version) -> Self {
        Exporter {
            collector,
            metrics_path: metrics_path.into(),
            handler_metrics: HandlerMetrics::default(),
            version,
        }
    }

    /// Returns the handler instrumentation.
    pub fn handler_metrics(&self) -> &HandlerMetrics {
        &self.handler_metrics
    }

    /// Run one scrape and encode it in the OpenMetrics text format.
    pub async fn scrape(&self) -> Result<String, std::fmt::Error> {
        let samples = self.collector.collect().await;

        let mut registry = Registry::default();
        registry.register_collector(Box::new(Scrape::new(samples)));
        let own = registry.sub_registry_with_prefix(PREFIX);
        self.handler_metrics.register(own);
        register_build_info(own, &self.version);

        let mut buffer = String::new();
        encode(&mut buffer, &registry)?;
        Ok(buffer)
    }

    /// Answer one HTTP request.
    pub async fn handle<B>(&self, request: Request<B>) -> Response<Full<Bytes>> {
        if request.uri().path() != self.metrics_path {
            return plain(StatusCode::NOT_FOUND, "404 page not found\n");
        }

        let _in_flight = self.handler_metrics.start();
        let response = match self.scrape().await {
            Ok(buffer) => Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, CONTENT_TYPE)
                .body(Full::new(Bytes::from(buffer)))
                .unwrap_or_else(|_| plain(StatusCode::INTERNAL_SERVER_ERROR, "")),
            Err(error) => {
                tracing::error!(%error, "failed to encode metrics");
                plain(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An error has occurred while serving metrics.\n",
                )
            }
        };
        self.handler_metrics.observe(response.status());
        response
    }
}

fn plain(status: StatusCode, body: &'static str) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from_static(body.as_bytes())));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

/// Bind the listen address.
///
/// The unspecified IPv6 address `[::]` accepts IPv4 clients as well. Hosts
/// without IPv6 get `0.0.0.0` on the same port instead.
pub async fn bind(addr: SocketAddr) -> io::Result<TcpListener> {
    match TcpListener::bind(addr).await {
        Err(error) if addr.ip() == IpAddr::V6(Ipv6Addr::UNSPECIFIED) => {
            let fallback = SocketAddr::from((Ipv4Addr::UNSPECIFIED, addr.port()));
            tracing::warn!(%error, %addr, %fallback, "failed to bind IPv6, falling back to IPv4");
            TcpListener::bind(fallback).await
        }
        result => result,
    }
}

/// Retry `accept` until it succeeds, sleeping [`ACCEPT_BACKOFF`] after each
/// failure.
async fn accept_with_backoff<F, Fut, T>(mut accept: F) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<T>>,
{
    loop {
        match accept().await {
            Ok(accepted) => return accepted,
            Err(error) => {
                tracing::warn!(%error, "failed to accept connection");
                tokio::time::sleep(ACCEPT_BACKOFF).await;
            }
        }
    }
}

/// Serve `exporter` on `listener` until `shutdown` resolves.
///
/// Once `shutdown` resolves no new connections are accepted. Open connections
/// are asked to finish and get [`SHUTDOWN_TIMEOUT`] to do so.
pub async fn serve(
    listener: TcpListener,
    exporter: Arc<Exporter>,
    shutdown: impl Future<Output = ()>,
) {
    let server = http1::Builder::new();
    let (stop_tx, stop_rx) = watch::channel(());
    let mut connections = JoinSet::new();
    pin!(shutdown);

    loop {
        let (stream, remote) = tokio::select! {
            accepted = accept_with_backoff(|| listener.accept()) => accepted,
            _ = &mut shutdown => break,
        };

        let io = TokioIo::new(stream);
        let server = server.clone();
        let exporter = exporter.clone();
        let mut stop = stop_rx.clone();
        connections.spawn(async move {
            let service = service_fn(move |request: Request<Incoming>| {
                let exporter = exporter.clone();
                async move { Ok::<_, Infallible>(exporter.handle(request).await) }
            });
            let conn = server.serve_connection(io, service);
            pin!(conn);
            let result = tokio::select! {
                result = conn.as_mut() => result,
                _ = stop.changed() => {
                    conn.as_mut().graceful_shutdown();
                    conn.as_mut().await
                }
            };
            if let Err(error) = result {
                tracing::debug!(%error, %remote, "connection closed with error");
            }
        });

        while connections.try_join_next().is_some() {}
    }

    drop(listener);
    let _ = stop_tx.send(());
    let drained = tokio::time::timeout(SHUTDOWN_TIMEOUT, async {
        while connections.join_next().await.is_some() {}
    })
    .await;
    if drained.is_err() {
        tracing::error!("failed to shutdown: connections still open");
        connections.abort_all();
    }
}
