//! Metrics about the exporter itself.

use http::StatusCode;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::metrics::info::Info;
use prometheus_client::registry::Registry;

use crate::version::Version;

/// Prefix of all exporter self metrics.
pub const PREFIX: &str = "sora_exporter";

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct CodeLabels {
    code: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct BuildLabels {
    version: String,
    commit: String,
}

/// Instrumentation of the metrics endpoint.
///
/// Cloning is cheap, clones share the underlying values.
#[derive(Debug, Clone, Default)]
pub struct HandlerMetrics {
    requests: Family<CodeLabels, Counter>,
    in_flight: Gauge,
}

impl HandlerMetrics {
    /// Register the handler metrics with `registry`.
    pub fn register(&self, registry: &mut Registry) {
        registry.register(
            "metric_handler_requests",
            "Total number of scrapes by HTTP status code",
            self.requests.clone(),
        );
        registry.register(
            "metric_handler_requests_in_flight",
            "Current number of scrapes being served",
            self.in_flight.clone(),
        );
    }

    /// Mark a scrape as started. The scrape counts as in flight until the
    /// returned guard is dropped.
    pub fn start(&self) -> InFlight {
        self.in_flight.inc();
        InFlight {
            gauge: self.in_flight.clone(),
        }
    }

    /// Count a finished scrape answered with `status`.
    pub fn observe(&self, status: StatusCode) {
        self.requests
            .get_or_create(&CodeLabels {
                code: status.as_u16().to_string(),
            })
            .inc();
    }

    #[cfg(test)]
    pub(crate) fn requests(&self, status: StatusCode) -> u64 {
        self.requests
            .get_or_create(&CodeLabels {
                code: status.as_u16().to_string(),
            })
            .get()
    }

    /// Number of scrapes currently being served.
    pub fn in_flight(&self) -> i64 {
        self.in_flight.get()
    }
}

/// Guard decrementing the in-flight gauge on drop.
#[derive(Debug)]
pub struct InFlight {
    gauge: Gauge,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.gauge.dec();
    }
}

/// Register the `build_info` metric for `version` with `registry`.
pub fn register_build_info(registry: &mut Registry, version: &Version) {
    registry.register(
        "build",
        "Build information of the exporter",
        Info::new(BuildLabels {
            version: version.version.clone(),
            commit: version.commit.clone(),
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus_client::encoding::text::encode;

    #[test]
    fn in_flight_guard() {
        let metrics = HandlerMetrics::default();
        let first = metrics.start();
        let second = metrics.clone().start();
        assert_eq!(2, metrics.in_flight());
        drop(first);
        assert_eq!(1, metrics.in_flight());
        drop(second);
        assert_eq!(0, metrics.in_flight());
    }

    #[test]
    fn requests_by_code() {
        let metrics = HandlerMetrics::default();
        metrics.observe(StatusCode::OK);
        metrics.observe(StatusCode::OK);
        metrics.observe(StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(2, metrics.requests(StatusCode::OK));
        assert_eq!(1, metrics.requests(StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[test]
    fn encode_self_metrics() {
        let metrics = HandlerMetrics::default();
        metrics.observe(StatusCode::OK);

        let mut registry = Registry::with_prefix(PREFIX);
        metrics.register(&mut registry);
        register_build_info(
            &mut registry,
            &Version {
                version: "1.0.0".to_string(),
                commit: "abc".to_string(),
                date: "2024-01-01T00:00:00Z".to_string(),
            },
        );

        let mut buffer = String::new();
        encode(&mut buffer, &registry).unwrap();

        assert!(buffer.contains("sora_exporter_metric_handler_requests_total{code=\"200\"} 1\n"));
        assert!(buffer.contains("sora_exporter_metric_handler_requests_in_flight 0\n"));
        assert!(buffer.contains("sora_exporter_build_info{version=\"1.0.0\",commit=\"abc\"} 1\n"));
    }
}
