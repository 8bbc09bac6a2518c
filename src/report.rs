//! Decoding of the Sora `GetStatsReport` response.

use serde::{Deserialize, Deserializer};

/// One statistics snapshot as returned by Sora.
///
/// Keys are matched exactly. Unknown keys are ignored, missing keys and
/// `null` values decode as zero.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StatsReport {
    /// Connections created since Sora started.
    #[serde(deserialize_with = "null_as_zero")]
    pub total_connection_created: i64,
    /// Connections updated since Sora started.
    #[serde(deserialize_with = "null_as_zero")]
    pub total_connection_updated: i64,
    /// Connections destroyed since Sora started.
    #[serde(deserialize_with = "null_as_zero")]
    pub total_connection_destroyed: i64,
    /// Connections that were established successfully.
    #[serde(deserialize_with = "null_as_zero")]
    pub total_successful_connections: i64,
    /// Connections currently in progress.
    #[serde(deserialize_with = "null_as_zero")]
    pub total_ongoing_connections: i64,
    /// Connections that failed.
    #[serde(deserialize_with = "null_as_zero")]
    pub total_failed_connections: i64,
    /// Cumulative connection duration in seconds.
    #[serde(deserialize_with = "null_as_zero")]
    pub total_duration_sec: i64,
    /// Connections relayed with TURN over UDP.
    #[serde(deserialize_with = "null_as_zero")]
    pub total_turn_udp_connections: i64,
    /// Connections relayed with TURN over TCP.
    #[serde(deserialize_with = "null_as_zero")]
    pub total_turn_tcp_connections: i64,
    /// Average connection duration in seconds.
    #[serde(deserialize_with = "null_as_zero")]
    pub average_duration_sec: i64,
    /// Average connection setup time in milliseconds.
    #[serde(deserialize_with = "null_as_zero")]
    pub average_setup_time_msec: i64,
}

impl StatsReport {
    /// Decode a report from a response body.
    ///
    /// Only the first JSON value of the body is read, anything after it is
    /// ignored. A `null` body is an all-zero report.
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        match serde_json::Deserializer::from_slice(body)
            .into_iter::<Option<StatsReport>>()
            .next()
        {
            Some(report) => Ok(report?.unwrap_or_default()),
            None => Err(serde::de::Error::custom("empty response body")),
        }
    }

    /// Average setup time converted from milliseconds to seconds.
    pub fn average_setup_time_seconds(&self) -> f64 {
        self.average_setup_time_msec as f64 / 1000.0
    }
}

fn null_as_zero<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<i64>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_full_report() {
        let body = br#"{
            "total_connection_created": 5,
            "total_connection_updated": 6,
            "total_connection_destroyed": 4,
            "total_successful_connections": 3,
            "total_ongoing_connections": 1,
            "total_failed_connections": 2,
            "total_duration_sec": 120,
            "total_turn_udp_connections": 8,
            "total_turn_tcp_connections": 9,
            "average_duration_sec": 7,
            "average_setup_time_msec": 2500
        }"#;

        let report = StatsReport::from_slice(body).unwrap();
        assert_eq!(5, report.total_connection_created);
        assert_eq!(6, report.total_connection_updated);
        assert_eq!(4, report.total_connection_destroyed);
        assert_eq!(3, report.total_successful_connections);
        assert_eq!(1, report.total_ongoing_connections);
        assert_eq!(2, report.total_failed_connections);
        assert_eq!(120, report.total_duration_sec);
        assert_eq!(8, report.total_turn_udp_connections);
        assert_eq!(9, report.total_turn_tcp_connections);
        assert_eq!(7, report.average_duration_sec);
        assert_eq!(2500, report.average_setup_time_msec);
        assert_eq!(2.5, report.average_setup_time_seconds());
    }

    #[test]
    fn missing_keys_default_to_zero() {
        let report =
            StatsReport::from_slice(br#"{"total_connection_created": 5}"#).unwrap();
        assert_eq!(
            StatsReport {
                total_connection_created: 5,
                ..Default::default()
            },
            report
        );

        assert_eq!(StatsReport::default(), StatsReport::from_slice(b"{}").unwrap());
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let report = StatsReport::from_slice(
            br#"{"total_failed_connections": 2, "sora_version": "2024.1", "nested": {"a": [1]}}"#,
        )
        .unwrap();
        assert_eq!(2, report.total_failed_connections);
    }

    #[test]
    fn null_fields_decode_as_zero() {
        let report = StatsReport::from_slice(
            br#"{"total_connection_created": null, "total_connection_updated": 6}"#,
        )
        .unwrap();
        assert_eq!(
            StatsReport {
                total_connection_updated: 6,
                ..Default::default()
            },
            report
        );
    }

    #[test]
    fn null_body_is_an_empty_report() {
        assert_eq!(StatsReport::default(), StatsReport::from_slice(b"null").unwrap());
        assert_eq!(StatsReport::default(), StatsReport::from_slice(b" null\n").unwrap());
    }

    #[test]
    fn data_after_first_value_is_ignored() {
        let report =
            StatsReport::from_slice(br#"{"total_connection_created": 1}{"x":1}"#).unwrap();
        assert_eq!(1, report.total_connection_created);

        let report =
            StatsReport::from_slice(b"{\"total_failed_connections\": 2}\ngarbage").unwrap();
        assert_eq!(2, report.total_failed_connections);
    }

    #[test]
    fn negative_values_pass_through() {
        let report = StatsReport::from_slice(br#"{"average_duration_sec": -3}"#).unwrap();
        assert_eq!(-3, report.average_duration_sec);
    }

    #[test]
    fn reject_malformed_body() {
        assert!(StatsReport::from_slice(b"").is_err());
        assert!(StatsReport::from_slice(b"  \n").is_err());
        assert!(StatsReport::from_slice(b"not json").is_err());
        assert!(StatsReport::from_slice(b"42").is_err());
        assert!(StatsReport::from_slice(br#"{"total_connection_created": "five"}"#).is_err());
        assert!(StatsReport::from_slice(br#"{"total_connection_created": 1.5}"#).is_err());
    }

    #[test]
    fn setup_time_conversion() {
        fn prop(msec: i32) -> bool {
            let report = StatsReport {
                average_setup_time_msec: msec as i64,
                ..Default::default()
            };
            (report.average_setup_time_seconds() * 1000.0 - msec as f64).abs() < 1e-6
        }

        quickcheck::QuickCheck::new()
            .tests(1000)
            .quickcheck(prop as fn(i32) -> bool);
    }
}
