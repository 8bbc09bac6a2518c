//! Command-line arguments of the `sora-exporter` binary.

use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Duration;

use clap::Parser;

use crate::config::Config;

/// Parse a listen address. A bare `:port` listens on all interfaces, IPv4
/// and IPv6 alike.
fn parse_listen_addr(s: &str) -> Result<SocketAddr, String> {
    let addr = match s.strip_prefix(':') {
        Some(port) => format!("[::]:{port}"),
        None => s.to_string(),
    };
    addr.to_socket_addrs()
        .map_err(|e| format!("invalid listen address {s:?}: {e}"))?
        .next()
        .ok_or_else(|| format!("listen address {s:?} did not resolve"))
}

/// Parse the metrics path, which must be absolute.
fn parse_metrics_path(s: &str) -> Result<String, String> {
    if s.starts_with('/') {
        Ok(s.to_string())
    } else {
        Err(format!("metrics path must start with '/': {s:?}"))
    }
}

/// Prometheus exporter for Sora connection statistics.
#[derive(Parser, Debug, Clone)]
#[command(name = "sora-exporter")]
pub struct Args {
    /// Address to listen for telemetry
    #[arg(
        long,
        env = "SORA_EXPORTER_LISTEN_ADDR",
        default_value = ":9199",
        value_parser = parse_listen_addr
    )]
    pub listen_addr: SocketAddr,

    /// Path under which to expose metrics
    #[arg(
        long,
        env = "SORA_EXPORTER_METRICS_PATH",
        default_value = "/metrics",
        value_parser = parse_metrics_path
    )]
    pub metrics_path: String,

    /// Timeout for scraping to sora, e.g. `5s` or `1500ms`
    #[arg(
        long,
        env = "SORA_EXPORTER_TIMEOUT",
        default_value = "5s",
        value_parser = humantime::parse_duration
    )]
    pub timeout: Duration,

    /// URL for sora stats endpoint
    #[arg(long, env = "SORA_EXPORTER_SORA_URL", default_value = "http://127.0.0.1:3000")]
    pub sora_url: String,

    /// Print version and exit
    #[arg(long)]
    pub version: bool,
}

impl Args {
    /// Collector configuration derived from the arguments.
    pub fn config(&self) -> Config {
        Config::default()
            .with_timeout(self.timeout)
            .with_sora_url(self.sora_url.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_command() {
        Args::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["sora-exporter"]).unwrap();
        assert_eq!("[::]:9199".parse::<SocketAddr>().unwrap(), args.listen_addr);
        assert_eq!("/metrics", args.metrics_path);
        assert_eq!(Duration::from_secs(5), args.timeout);
        assert_eq!("http://127.0.0.1:3000", args.sora_url);
        assert!(!args.version);

        let config = args.config();
        assert_eq!(Duration::from_secs(5), config.timeout());
        assert_eq!("http://127.0.0.1:3000", config.sora_url());
    }

    #[test]
    fn overrides() {
        let args = Args::try_parse_from([
            "sora-exporter",
            "--listen-addr",
            "127.0.0.1:9300",
            "--metrics-path",
            "/sora",
            "--timeout",
            "1500ms",
            "--sora-url",
            "http://sora.internal:3000/",
            "--version",
        ])
        .unwrap();
        assert_eq!("127.0.0.1:9300".parse::<SocketAddr>().unwrap(), args.listen_addr);
        assert_eq!("/sora", args.metrics_path);
        assert_eq!(Duration::from_millis(1500), args.timeout);
        assert_eq!("http://sora.internal:3000/", args.sora_url);
        assert!(args.version);
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(Args::try_parse_from(["sora-exporter", "--timeout", "soon"]).is_err());
        assert!(Args::try_parse_from(["sora-exporter", "--metrics-path", "metrics"]).is_err());
        assert!(Args::try_parse_from(["sora-exporter", "--listen-addr", "nowhere"]).is_err());
    }

    #[test]
    fn bare_port_listens_everywhere() {
        assert_eq!(
            "[::]:9199".parse::<SocketAddr>().unwrap(),
            parse_listen_addr(":9199").unwrap()
        );
        assert_eq!(
            "0.0.0.0:9199".parse::<SocketAddr>().unwrap(),
            parse_listen_addr("0.0.0.0:9199").unwrap()
        );
        assert_eq!(
            "[::1]:9199".parse::<SocketAddr>().unwrap(),
            parse_listen_addr("[::1]:9199").unwrap()
        );
    }
}
