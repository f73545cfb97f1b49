//! Metrics exporter configuration parsing from environment variables.

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Metrics exporter environment configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsEnvConfig {
    pub enabled: bool,
    pub port: u16,
    pub bind_address: IpAddr,
    /// Prefix for every metric family name; `None` keeps the bare names
    pub namespace: Option<String>,
}

impl Default for MetricsEnvConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 9431,
            bind_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            namespace: None,
        }
    }
}

impl MetricsEnvConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enabled: env::var("METRICS_ENABLED")
                .ok()
                .and_then(|v| v.parse::<bool>().ok())
                .unwrap_or(defaults.enabled),
            port: env::var("METRICS_PORT")
                .ok()
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(defaults.port),
            bind_address: env::var("METRICS_BIND_ADDRESS")
                .ok()
                .and_then(|v| v.parse::<IpAddr>().ok())
                .unwrap_or(defaults.bind_address),
            namespace: env::var("METRICS_NAMESPACE")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
        }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_config_defaults() {
        let config = MetricsEnvConfig::default();
        assert!(config.enabled);
        assert_eq!(config.port, 9431);
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:9431");
        assert!(config.namespace.is_none());
    }
}
