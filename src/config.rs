//! Collector configuration.

use std::sync::Arc;
use std::time::Duration;

use tracing::Dispatch;

use crate::client::{HyperClient, UpstreamClient};

/// Default per-scrape timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Default Sora endpoint.
pub const DEFAULT_SORA_URL: &str = "http://127.0.0.1:3000/";

/// Configuration of a [`SoraCollector`](crate::collector::SoraCollector).
///
/// Starts from defaults, each `with_*` call overrides one field. Later calls
/// win.
///
/// ```
/// # use sora_exporter::config::Config;
/// # use std::time::Duration;
/// let config = Config::default()
///     .with_timeout(Duration::from_secs(5))
///     .with_sora_url("http://sora.internal:3000/");
/// assert_eq!(Duration::from_secs(5), config.timeout());
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    client: Arc<dyn UpstreamClient>,
    logger: Option<Dispatch>,
    timeout: Duration,
    sora_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            client: Arc::new(HyperClient::new()),
            logger: None,
            timeout: DEFAULT_TIMEOUT,
            sora_url: DEFAULT_SORA_URL.to_string(),
        }
    }
}

impl Config {
    /// Use `client` to talk to Sora.
    pub fn with_client(mut self, client: impl UpstreamClient) -> Self {
        self.client = Arc::new(client);
        self
    }

    /// Send scrape logs to `logger` instead of the global subscriber.
    pub fn with_logger(mut self, logger: impl Into<Dispatch>) -> Self {
        self.logger = Some(logger.into());
        self
    }

    /// Bound every scrape by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Scrape the Sora instance at `url`.
    pub fn with_sora_url(mut self, url: impl Into<String>) -> Self {
        self.sora_url = url.into();
        self
    }

    /// Returns the upstream client.
    pub fn client(&self) -> &dyn UpstreamClient {
        self.client.as_ref()
    }

    /// Returns the logger, if one was set.
    pub fn logger(&self) -> Option<&Dispatch> {
        self.logger.as_ref()
    }

    /// Returns the per-scrape timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the Sora URL.
    pub fn sora_url(&self) -> &str {
        &self.sora_url
    }
}
