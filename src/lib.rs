#![deny(missing_docs)]
#![forbid(unsafe_code)]
#![warn(missing_debug_implementations)]

//! Prometheus / [OpenMetrics](https://github.com/OpenObservability/OpenMetrics)
//! exporter for the connection statistics of a
//! [Sora](https://sora.shiguredo.jp/) WebRTC SFU.
//!
//! On each scrape the [`SoraCollector`](collector::SoraCollector) asks Sora for
//! its stats report and translates it into eleven metrics. A scrape either
//! yields all of them or, if Sora cannot be reached in time or answers with
//! something that is not a stats report, none.
//!
//! # Examples
//!
//! ```no_run
//! use prometheus_client::encoding::text::encode;
//! use prometheus_client::registry::Registry;
//! use sora_exporter::collector::{Scrape, SoraCollector};
//! use sora_exporter::config::Config;
//! use std::time::Duration;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let collector = SoraCollector::new(
//!     Config::default()
//!         .with_timeout(Duration::from_secs(5))
//!         .with_sora_url("http://127.0.0.1:3000/"),
//! );
//!
//! // Every metric the collector may produce, without asking Sora.
//! for descriptor in collector.describe() {
//!     println!("{}: {}", descriptor.exposed_name(), descriptor.help());
//! }
//!
//! // Scrape Sora and encode the result in the text format.
//! let mut registry = Registry::default();
//! registry.register_collector(Box::new(Scrape::new(collector.collect().await)));
//! let mut buffer = String::new();
//! encode(&mut buffer, &registry).unwrap();
//! # }
//! ```
//!
//! The `sora-exporter` binary wraps this in an HTTP server, see [`server`].

pub mod args;
pub mod client;
pub mod collector;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod report;
pub mod server;
pub mod version;

pub use error::Error;
