//! HTTP scrape endpoint for the broker's metrics.
//!
//! Serves:
//! - `/metrics`: Prometheus text exposition, recomputing buffer gauges first
//! - `/healthz`: liveness check, always `{}`
//!
//! The authenticated-connections collector is registered when the exporter
//! starts and unregistered when it is closed, after the server has stopped
//! answering scrapes. During a scrape the collector and the buffer aggregator
//! read the same connection snapshot.

use super::aggregator::aggregate_buffer_sizes;
use super::collector::AuthenticatedConnectionsCollector;
use super::metrics::BrokerMetrics;
use crate::domain::connection::ConnectionSnapshot;
use crate::domain::errors::ExporterError;
use crate::domain::ports::ConnectionSource;
use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use std::net::SocketAddr;
use std::sync::{Arc, MutexGuard, PoisonError};
use tokio::net::TcpListener;
use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;
use tracing::{info, warn};

pub const METRICS_CONTENT_TYPE: &str = "text/plain; charset=utf-8";
pub const HEALTHZ_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Connection source that holds one snapshot for the length of a scrape.
struct ScrapeSource {
    live: Arc<dyn ConnectionSource>,
    pinned: std::sync::Mutex<Option<Vec<ConnectionSnapshot>>>,
}

/// Releases the pinned snapshot when dropped.
struct Pinned<'a>(&'a ScrapeSource);

impl Drop for Pinned<'_> {
    fn drop(&mut self) {
        *self.0.pinned() = None;
    }
}

impl ScrapeSource {
    fn new(live: Arc<dyn ConnectionSource>) -> Self {
        Self {
            live,
            pinned: std::sync::Mutex::new(None),
        }
    }

    fn pin(&self) -> (Vec<ConnectionSnapshot>, Pinned<'_>) {
        let connections = self.live.snapshot();
        *self.pinned() = Some(connections.clone());
        (connections, Pinned(self))
    }

    fn pinned(&self) -> MutexGuard<'_, Option<Vec<ConnectionSnapshot>>> {
        self.pinned.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ConnectionSource for ScrapeSource {
    fn snapshot(&self) -> Vec<ConnectionSnapshot> {
        if let Some(connections) = self.pinned().as_ref() {
            return connections.clone();
        }
        self.live.snapshot()
    }
}

/// Shared state behind the exporter routes
#[derive(Clone)]
pub struct ExporterState {
    metrics: BrokerMetrics,
    source: Arc<ScrapeSource>,
    scrape_lock: Arc<Mutex<()>>,
}

impl ExporterState {
    pub fn new(metrics: BrokerMetrics, connections: Arc<dyn ConnectionSource>) -> Self {
        Self {
            metrics,
            source: Arc::new(ScrapeSource::new(connections)),
            scrape_lock: Arc::new(Mutex::new(())),
        }
    }

    /// The source collectors should read from so they see the same
    /// connections as the aggregator within a scrape.
    pub fn connection_source(&self) -> Arc<dyn ConnectionSource> {
        self.source.clone()
    }

    /// Recompute buffer gauges and render the whole registry.
    ///
    /// Concurrent scrapes are serialized so one pass's gauge reset never
    /// lands in the middle of another's render.
    pub async fn scrape(&self) -> prometheus::Result<String> {
        let _guard = self.scrape_lock.lock().await;
        let (connections, _pinned) = self.source.pin();
        aggregate_buffer_sizes(&self.metrics, &connections);
        self.metrics.render()
    }
}

/// Build the exporter router without binding it.
pub fn router(state: ExporterState) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/healthz", get(healthz_handler))
        .with_state(state)
}

async fn metrics_handler(State(state): State<ExporterState>) -> Response {
    match state.scrape().await {
        Ok(body) => ([(header::CONTENT_TYPE, METRICS_CONTENT_TYPE)], body).into_response(),
        Err(e) => {
            warn!("Failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn healthz_handler() -> Response {
    ([(header::CONTENT_TYPE, HEALTHZ_CONTENT_TYPE)], "{}").into_response()
}

/// Starts the metrics HTTP server.
pub struct MetricsExporter;

impl MetricsExporter {
    /// Register the authenticated-connections collector and start serving on
    /// `addr`. Use port 0 to let the OS pick one; the bound address is on the
    /// returned handle.
    pub async fn start(
        metrics: BrokerMetrics,
        connections: Arc<dyn ConnectionSource>,
        addr: SocketAddr,
    ) -> Result<ExporterHandle, ExporterError> {
        let state = ExporterState::new(metrics.clone(), connections);
        let collector = AuthenticatedConnectionsCollector::new(state.connection_source())?;
        metrics.registry().register(Box::new(collector.clone()))?;

        let bound = match TcpListener::bind(addr).await {
            Ok(listener) => listener.local_addr().map(|local_addr| (listener, local_addr)),
            Err(e) => Err(e),
        };
        let (listener, local_addr) = match bound {
            Ok(bound) => bound,
            Err(source) => {
                let _ = metrics.registry().unregister(Box::new(collector));
                return Err(ExporterError::Bind { addr, source });
            }
        };

        let app = router(state);
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            axum::serve(listener, app.into_make_service())
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        info!("Metrics exporter listening on http://{}", local_addr);

        Ok(ExporterHandle {
            local_addr,
            shutdown_tx,
            task,
            metrics,
            collector,
        })
    }
}

/// Running exporter. Call [`ExporterHandle::close`] to stop it.
pub struct ExporterHandle {
    local_addr: SocketAddr,
    shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<std::io::Result<()>>,
    metrics: BrokerMetrics,
    collector: AuthenticatedConnectionsCollector,
}

impl ExporterHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop serving, then unregister the collector.
    ///
    /// The collector is unregistered even if the server task failed, so the
    /// registry never reads from a connection set that is being torn down.
    pub async fn close(self) {
        let _ = self.shutdown_tx.send(());
        match self.task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Metrics exporter stopped with error: {}", e),
            Err(e) => warn!("Metrics exporter task failed: {}", e),
        }
        if let Err(e) = self.metrics.registry().unregister(Box::new(self.collector)) {
            warn!("Failed to unregister connections collector: {}", e);
        }
        info!("Metrics exporter on {} stopped", self.local_addr);
    }
}
