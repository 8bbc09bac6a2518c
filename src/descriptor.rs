//! Module describing the fixed set of metrics exposed by the exporter.
//!
//! See [`Descriptors`] for details.

use prometheus_client::metrics::MetricType;
use prometheus_client::registry::Unit;

/// Namespace of every exposed Sora metric.
pub const NAMESPACE: &str = "sora";

/// Subsystem of every exposed Sora metric.
pub const SUBSYSTEM: &str = "exporter";

/// Number of metrics a successful scrape produces.
pub const METRIC_COUNT: usize = 11;

/// Kind of an exposed metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Monotonic upstream value, passed through as is.
    Counter,
    /// Value that may move in either direction between scrapes.
    Gauge,
}

impl Kind {
    /// The OpenMetrics type the kind is encoded as.
    pub fn metric_type(&self) -> MetricType {
        match self {
            Kind::Counter => MetricType::Counter,
            Kind::Gauge => MetricType::Gauge,
        }
    }
}

/// Identity of one exposed metric.
///
/// `name` is the fully-qualified base name, i.e. namespace, subsystem and
/// metric name joined by `_`. The unit and the `_total` counter suffix are
/// added by the OpenMetrics encoder, see [`Descriptor::exposed_name`].
#[derive(Debug, Clone)]
pub struct Descriptor {
    name: String,
    help: String,
    kind: Kind,
    unit: Option<Unit>,
}

impl Descriptor {
    fn new(name: &str, help: &str, kind: Kind, unit: Option<Unit>) -> Self {
        Descriptor {
            name: fq_name(NAMESPACE, SUBSYSTEM, name),
            help: help.to_string(),
            kind,
            unit,
        }
    }

    fn counter(name: &str, help: &str) -> Self {
        Self::new(name, help, Kind::Counter, None)
    }

    fn seconds(name: &str, help: &str, kind: Kind) -> Self {
        Self::new(name, help, kind, Some(Unit::Seconds))
    }

    /// Returns the fully-qualified base name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the help text.
    pub fn help(&self) -> &str {
        &self.help
    }

    /// Returns the metric kind.
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Returns the unit, if any.
    pub fn unit(&self) -> Option<&Unit> {
        self.unit.as_ref()
    }

    /// Name of the sample line as it appears in the text exposition.
    pub fn exposed_name(&self) -> String {
        let mut name = self.name.clone();
        if let Some(unit) = &self.unit {
            name.push('_');
            name.push_str(unit.as_str());
        }
        if self.kind == Kind::Counter {
            name.push_str("_total");
        }
        name
    }
}

/// Joins the non-empty parts of a metric name with `_`.
pub fn fq_name(namespace: &str, subsystem: &str, name: &str) -> String {
    [namespace, subsystem, name]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("_")
}

/// The table of all metrics the collector can produce.
///
/// Built once per collector and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Descriptors {
    pub(crate) connections_created: Descriptor,
    pub(crate) connections_updated: Descriptor,
    pub(crate) connections_destroyed: Descriptor,
    pub(crate) successful_connections: Descriptor,
    pub(crate) ongoing_connections: Descriptor,
    pub(crate) failed_connections: Descriptor,
    pub(crate) duration: Descriptor,
    pub(crate) turn_udp_connections: Descriptor,
    pub(crate) turn_tcp_connections: Descriptor,
    pub(crate) average_duration: Descriptor,
    pub(crate) average_setup_time: Descriptor,
}

impl Descriptors {
    /// Create the descriptor table.
    pub fn new() -> Self {
        Descriptors {
            connections_created: Descriptor::counter(
                "connections_created",
                "The total number of connections created",
            ),
            connections_updated: Descriptor::counter(
                "connections_updated",
                "The total number of connections updated",
            ),
            connections_destroyed: Descriptor::counter(
                "connections_destroyed",
                "The total number of connections destroyed",
            ),
            // The misspelling is part of the exposed metric name.
            successful_connections: Descriptor::counter(
                "successfull_connections",
                "The total number of successful connections",
            ),
            ongoing_connections: Descriptor::counter(
                "ongoing_connections",
                "The total number of ongoing connections",
            ),
            failed_connections: Descriptor::counter(
                "failed_connections",
                "The total number of failed connections",
            ),
            duration: Descriptor::seconds(
                "duration",
                "The total duration of connections",
                Kind::Counter,
            ),
            turn_udp_connections: Descriptor::counter(
                "turn_udp_connections",
                "The total number of connections with TURN-UDP",
            ),
            turn_tcp_connections: Descriptor::counter(
                "turn_tcp_connections",
                "The total number of connections with TURN-TCP",
            ),
            average_duration: Descriptor::seconds(
                "average_duration",
                "The average connection duration in seconds",
                Kind::Gauge,
            ),
            average_setup_time: Descriptor::seconds(
                "average_setup_time",
                "The average setup time in seconds",
                Kind::Gauge,
            ),
        }
    }

    /// All descriptors in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Descriptor> {
        [
            &self.connections_created,
            &self.connections_updated,
            &self.connections_destroyed,
            &self.successful_connections,
            &self.ongoing_connections,
            &self.failed_connections,
            &self.duration,
            &self.turn_udp_connections,
            &self.turn_tcp_connections,
            &self.average_duration,
            &self.average_setup_time,
        ]
        .into_iter()
    }
}

impl Default for Descriptors {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn exposed_names() {
        let names: Vec<String> = Descriptors::new()
            .iter()
            .map(Descriptor::exposed_name)
            .collect();

        let expected = [
            "sora_exporter_connections_created_total",
            "sora_exporter_connections_updated_total",
            "sora_exporter_connections_destroyed_total",
            "sora_exporter_successfull_connections_total",
            "sora_exporter_ongoing_connections_total",
            "sora_exporter_failed_connections_total",
            "sora_exporter_duration_seconds_total",
            "sora_exporter_turn_udp_connections_total",
            "sora_exporter_turn_tcp_connections_total",
            "sora_exporter_average_duration_seconds",
            "sora_exporter_average_setup_time_seconds",
        ];
        assert_eq!(expected.to_vec(), names);
    }

    #[test]
    fn names_are_unique() {
        let descriptors = Descriptors::new();
        let names: HashSet<&str> = descriptors.iter().map(Descriptor::name).collect();
        assert_eq!(METRIC_COUNT, names.len());
    }

    #[test]
    fn averages_are_gauges() {
        let descriptors = Descriptors::new();
        let gauges: Vec<&str> = descriptors
            .iter()
            .filter(|d| d.kind() == Kind::Gauge)
            .map(Descriptor::name)
            .collect();
        assert_eq!(
            vec![
                "sora_exporter_average_duration",
                "sora_exporter_average_setup_time"
            ],
            gauges
        );
    }

    #[test]
    fn fq_name_skips_empty_parts() {
        assert_eq!("sora_exporter_up", fq_name("sora", "exporter", "up"));
        assert_eq!("sora_up", fq_name("sora", "", "up"));
        assert_eq!("up", fq_name("", "", "up"));
    }
}
