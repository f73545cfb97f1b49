//! hpfeeds broker core server
//!
//! Loads the credential store, builds the metrics registry and serves the
//! scrape endpoints. The wire protocol layer attaches to the shared
//! connection registry and resolver.
//!
//! # Usage
//! ```sh
//! CREDENTIALS_FILE=creds.toml cargo run --bin server -- --metrics-port 9431
//! ```
//!
//! # Environment Variables
//! - `CREDENTIALS_FILE` - TOML/JSON credential map
//! - `CREDENTIALS_YIELDING` - Yield before each credential lookup (default: false)
//! - `METRICS_ENABLED` - Serve `/metrics` and `/healthz` (default: true)
//! - `METRICS_BIND_ADDRESS` / `METRICS_PORT` - Exporter address (default: 127.0.0.1:9431)
//! - `METRICS_NAMESPACE` - Prefix for metric names (default: none)

use anyhow::{Context, Result};
use clap::Parser;
use hpfeeds_broker::config::Config;
use hpfeeds_broker::domain::ports::CredentialResolver;
use hpfeeds_broker::infrastructure::{
    BrokerMetrics, ConnectionRegistry, MetricsExporter, YieldingResolver,
};
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{Level, info};
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(author, version, about = "hpfeeds broker core", long_about = None)]
struct Cli {
    /// Credential file (overrides CREDENTIALS_FILE)
    #[arg(short, long)]
    credentials: Option<PathBuf>,

    /// Metrics bind address (overrides METRICS_BIND_ADDRESS)
    #[arg(long)]
    metrics_bind: Option<IpAddr>,

    /// Metrics port (overrides METRICS_PORT)
    #[arg(long)]
    metrics_port: Option<u16>,

    /// Do not serve metrics
    #[arg(long)]
    no_metrics: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    info!("hpfeeds broker core {} starting...", env!("CARGO_PKG_VERSION"));

    let mut config = Config::from_env()?;
    if let Some(path) = cli.credentials {
        config.auth.credentials_file = Some(path);
    }
    if let Some(addr) = cli.metrics_bind {
        config.metrics.bind_address = addr;
    }
    if let Some(port) = cli.metrics_port {
        config.metrics.port = port;
    }
    if cli.no_metrics {
        config.metrics.enabled = false;
    }

    let store = config.credential_store()?;
    info!("Credential store ready: {} idents", store.len());

    let resolver: Arc<dyn CredentialResolver> = if config.auth.yielding_resolver {
        Arc::new(YieldingResolver::new(store))
    } else {
        Arc::new(store)
    };
    resolver.start().await.context("Credential resolver failed to start")?;

    let metrics = BrokerMetrics::with_namespace(config.metrics.namespace.as_deref())
        .context("Failed to build metrics registry")?;
    let connections = Arc::new(ConnectionRegistry::new());

    let exporter = if config.metrics.enabled {
        Some(
            MetricsExporter::start(metrics.clone(), connections.clone(), config.metrics.socket_addr())
                .await
                .context("Failed to start metrics exporter")?,
        )
    } else {
        info!("Metrics exporter disabled.");
        None
    };

    info!("Broker core running. Press Ctrl+C to shutdown.");
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Exiting...");

    if let Some(exporter) = exporter {
        exporter.close().await;
    }
    resolver.close();

    Ok(())
}
