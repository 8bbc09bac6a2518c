//! Errors of a single scrape cycle.

use std::time::Duration;

/// Boxed error returned by [`UpstreamClient`](crate::client::UpstreamClient)
/// implementations and response bodies.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Reason a scrape cycle produced no samples.
///
/// None of these are fatal. The next scrape starts from scratch. The
/// underlying cause is kept as the error [`source`](std::error::Error::source)
/// rather than repeated in the message.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The upstream request could not be built, e.g. a malformed URL.
    #[error("failed to create request to sora")]
    Request(#[from] http::Error),
    /// The upstream client failed to deliver a response.
    #[error("failed to request to sora")]
    Transport(#[source] BoxError),
    /// The exchange did not finish within the configured timeout.
    #[error("failed to request to sora: timed out after {0:?}")]
    Timeout(Duration),
    /// The response body could not be read.
    #[error("failed to read response body from sora")]
    Body(#[source] BoxError),
    /// The response body is not a valid stats report.
    #[error("failed to decode response body from sora")]
    Decode(#[from] serde_json::Error),
}

impl Error {
    /// Whether the error happened while talking to the upstream, including
    /// running out of time.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::Timeout(_))
    }
}
