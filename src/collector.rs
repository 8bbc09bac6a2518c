//! The Sora collector.
//!
//! See [`SoraCollector`] for details.

use bytes::Bytes;
use http::{Method, Request};
use http_body_util::{BodyExt, Empty};
use prometheus_client::collector::Collector;
use prometheus_client::encoding::{DescriptorEncoder, EncodeMetric};
use prometheus_client::metrics::counter::ConstCounter;
use prometheus_client::metrics::gauge::ConstGauge;
use tracing::instrument::WithSubscriber;

use crate::client::RequestBody;
use crate::config::Config;
use crate::descriptor::{Descriptor, Descriptors, Kind};
use crate::error::Error;
use crate::report::StatsReport;

/// Header naming the Sora API operation.
pub const TARGET_HEADER: &str = "x-sora-target";

/// Operation returning the connection statistics report.
pub const GET_STATS_REPORT: &str = "Sora_20171010.GetStatsReport";

/// One produced metric value.
#[derive(Debug, Clone)]
pub struct Sample {
    descriptor: Descriptor,
    value: f64,
}

impl Sample {
    fn new(descriptor: &Descriptor, value: f64) -> Self {
        Sample {
            descriptor: descriptor.clone(),
            value,
        }
    }

    /// Returns the descriptor labelling this sample.
    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    /// Returns the sample value.
    pub fn value(&self) -> f64 {
        self.value
    }
}

/// Fetches a stats report from Sora on each scrape and translates it into
/// eleven metric samples.
///
/// The collector keeps no state between scrapes. Concurrent calls to
/// [`SoraCollector::collect`] are independent of each other.
#[derive(Debug)]
pub struct SoraCollector {
    config: Config,
    descriptors: Descriptors,
}

impl SoraCollector {
    /// Create a new collector.
    pub fn new(config: Config) -> Self {
        SoraCollector {
            config,
            descriptors: Descriptors::new(),
        }
    }

    /// Returns the collector configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// All metrics this collector can produce. Never talks to Sora.
    pub fn describe(&self) -> impl Iterator<Item = &Descriptor> {
        self.descriptors.iter()
    }

    /// Run one scrape cycle.
    ///
    /// Yields either all eleven samples or, if any step fails, none. Failures
    /// are logged at error level.
    pub async fn collect(&self) -> Vec<Sample> {
        let cycle = async {
            match self.try_collect().await {
                Ok(samples) => samples,
                Err(error) => {
                    let error = anyhow::Error::new(error);
                    tracing::error!(error = %format!("{error:#}"), "scrape of sora failed");
                    Vec::new()
                }
            }
        };

        match self.config.logger() {
            Some(logger) => cycle.with_subscriber(logger.clone()).await,
            None => cycle.await,
        }
    }

    /// Run one scrape cycle, returning the reason of a failure.
    pub async fn try_collect(&self) -> Result<Vec<Sample>, Error> {
        let request = Request::builder()
            .method(Method::POST)
            .uri(self.config.sora_url())
            .header(TARGET_HEADER, GET_STATS_REPORT)
            .body(Empty::new())?;

        let timeout = self.config.timeout();
        let body = tokio::time::timeout(timeout, self.exchange(request))
            .await
            .map_err(|_| Error::Timeout(timeout))??;

        let report = StatsReport::from_slice(&body)?;
        Ok(self.samples(&report))
    }

    async fn exchange(&self, request: Request<RequestBody>) -> Result<Bytes, Error> {
        let response = self
            .config
            .client()
            .send(request)
            .await
            .map_err(Error::Transport)?;
        tracing::debug!(status = %response.status(), "received response from sora");

        let collected = response.into_body().collect().await.map_err(Error::Body)?;
        Ok(collected.to_bytes())
    }

    fn samples(&self, report: &StatsReport) -> Vec<Sample> {
        let d = &self.descriptors;
        vec![
            Sample::new(&d.connections_created, report.total_connection_created as f64),
            Sample::new(&d.connections_updated, report.total_connection_updated as f64),
            Sample::new(&d.connections_destroyed, report.total_connection_destroyed as f64),
            Sample::new(&d.successful_connections, report.total_successful_connections as f64),
            Sample::new(&d.ongoing_connections, report.total_ongoing_connections as f64),
            Sample::new(&d.failed_connections, report.total_failed_connections as f64),
            Sample::new(&d.duration, report.total_duration_sec as f64),
            Sample::new(&d.turn_udp_connections, report.total_turn_udp_connections as f64),
            Sample::new(&d.turn_tcp_connections, report.total_turn_tcp_connections as f64),
            Sample::new(&d.average_duration, report.average_duration_sec as f64),
            Sample::new(&d.average_setup_time, report.average_setup_time_seconds()),
        ]
    }
}

/// The samples of one finished scrape cycle, ready to be registered with a
/// [`Registry`](prometheus_client::registry::Registry) and encoded.
#[derive(Debug, Default)]
pub struct Scrape {
    samples: Vec<Sample>,
}

impl Scrape {
    /// Wrap the samples of a scrape cycle.
    pub fn new(samples: Vec<Sample>) -> Self {
        Scrape { samples }
    }

    /// Returns the wrapped samples.
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }
}

impl Collector for Scrape {
    fn encode(&self, mut encoder: DescriptorEncoder) -> Result<(), std::fmt::Error> {
        for sample in &self.samples {
            let descriptor = sample.descriptor();
            let metric_encoder = encoder.encode_descriptor(
                descriptor.name(),
                descriptor.help(),
                descriptor.unit(),
                descriptor.kind().metric_type(),
            )?;
            match descriptor.kind() {
                Kind::Counter => ConstCounter::new(sample.value()).encode(metric_encoder)?,
                Kind::Gauge => ConstGauge::new(sample.value()).encode(metric_encoder)?,
            }
        }

        Ok(())
    }
}
