//! Prometheus instruments for the broker
//!
//! Every instrument is created and registered by [`BrokerMetrics::new`]. The
//! value is owned by the server context and cloned into whatever needs to
//! update or read it; clones share the same underlying registry.

use prometheus::{
    HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, IntGaugeVec, Opts,
    Registry, TextEncoder, exponential_buckets,
};
use std::sync::Arc;

/// Histogram buckets for published payload sizes: 1 KiB doubling up to 4 MiB
fn publish_size_buckets() -> prometheus::Result<Vec<f64>> {
    exponential_buckets(1024.0, 2.0, 13)
}

/// Broker health, backpressure and subscription metrics
#[derive(Clone)]
pub struct BrokerMetrics {
    registry: Arc<Registry>,
    /// Number of clients connected to broker
    pub client_connections: IntGauge,
    /// Number of connections established
    pub connection_made: IntCounter,
    /// Connections established and authenticated, by ident
    pub connection_ready: IntCounterVec,
    /// Connections that hit a protocol error, by ident and category
    pub connection_error: IntCounterVec,
    /// Connections lost, by ident
    pub connection_lost: IntCounterVec,
    /// Bytes queued for transmission, by ident
    pub send_buffer_size: IntGaugeVec,
    /// Bytes received but not yet parsed, by ident
    pub receive_buffer_size: IntGaugeVec,
    pub receive_buffer_fill: IntCounterVec,
    pub send_buffer_fill: IntCounterVec,
    pub send_buffer_drain: IntCounterVec,
    /// High watermark exceeded, connection put on a deadline timer
    pub send_buffer_deadline_start: IntCounterVec,
    /// Buffer back at low watermark, deadline timer cancelled
    pub send_buffer_deadline_recover: IntCounterVec,
    /// Subscriptions per ident and channel
    pub subscriptions: IntGaugeVec,
    pub receive_publish_count: IntCounterVec,
    pub receive_publish_size: HistogramVec,
}

impl BrokerMetrics {
    /// Create a new registry with every broker instrument registered
    pub fn new() -> prometheus::Result<Self> {
        Self::with_namespace(None)
    }

    /// Like [`BrokerMetrics::new`], prefixing every family name (including
    /// those produced by collectors registered later) with `namespace_`.
    pub fn with_namespace(namespace: Option<&str>) -> prometheus::Result<Self> {
        let registry = Registry::new_custom(namespace.map(str::to_string), None)?;

        let client_connections = IntGauge::with_opts(Opts::new(
            "client_connections",
            "Number of clients connected to broker",
        ))?;
        registry.register(Box::new(client_connections.clone()))?;

        let connection_made = IntCounter::with_opts(Opts::new(
            "connection_made",
            "Number of connections established",
        ))?;
        registry.register(Box::new(connection_made.clone()))?;

        let connection_ready = IntCounterVec::new(
            Opts::new(
                "connection_ready",
                "Number of connections established + authenticated",
            ),
            &["ident"],
        )?;
        registry.register(Box::new(connection_ready.clone()))?;

        let connection_error = IntCounterVec::new(
            Opts::new(
                "connection_error",
                "Number of connections that experienced a protocol error",
            ),
            &["ident", "category"],
        )?;
        registry.register(Box::new(connection_error.clone()))?;

        let connection_lost = IntCounterVec::new(
            Opts::new("connection_lost", "Number of connections lost"),
            &["ident"],
        )?;
        registry.register(Box::new(connection_lost.clone()))?;

        let send_buffer_size = IntGaugeVec::new(
            Opts::new(
                "connection_send_buffer_size",
                "Number of bytes queued for transmission",
            ),
            &["ident"],
        )?;
        registry.register(Box::new(send_buffer_size.clone()))?;

        let receive_buffer_size = IntGaugeVec::new(
            Opts::new(
                "connection_receive_buffer_size",
                "Number of bytes received but not yet parsed",
            ),
            &["ident"],
        )?;
        registry.register(Box::new(receive_buffer_size.clone()))?;

        let receive_buffer_fill = IntCounterVec::new(
            Opts::new(
                "connection_receive_buffer_fill",
                "Number of bytes queued in the parsing buffer",
            ),
            &["ident"],
        )?;
        registry.register(Box::new(receive_buffer_fill.clone()))?;

        let send_buffer_fill = IntCounterVec::new(
            Opts::new(
                "connection_send_buffer_fill",
                "Number of bytes queued in the send buffer",
            ),
            &["ident"],
        )?;
        registry.register(Box::new(send_buffer_fill.clone()))?;

        let send_buffer_drain = IntCounterVec::new(
            Opts::new(
                "connection_send_buffer_drain",
                "Number of bytes drained from the send buffer and sent",
            ),
            &["ident"],
        )?;
        registry.register(Box::new(send_buffer_drain.clone()))?;

        let send_buffer_deadline_start = IntCounterVec::new(
            Opts::new(
                "connection_send_buffer_deadline_start",
                "High watermark was exceeded and this connection was put on a deadline timer",
            ),
            &["ident"],
        )?;
        registry.register(Box::new(send_buffer_deadline_start.clone()))?;

        let send_buffer_deadline_recover = IntCounterVec::new(
            Opts::new(
                "connection_send_buffer_deadline_recover",
                "Buffer recovered to low watermark or better and deadline timer was cancelled",
            ),
            &["ident"],
        )?;
        registry.register(Box::new(send_buffer_deadline_recover.clone()))?;

        let subscriptions = IntGaugeVec::new(
            Opts::new("subscriptions", "Number of subscriptions to a channel"),
            &["ident", "chan"],
        )?;
        registry.register(Box::new(subscriptions.clone()))?;

        let receive_publish_count = IntCounterVec::new(
            Opts::new(
                "receive_publish_count",
                "Number of events received by broker for a channel",
            ),
            &["ident", "chan"],
        )?;
        registry.register(Box::new(receive_publish_count.clone()))?;

        let receive_publish_size = HistogramVec::new(
            HistogramOpts::new(
                "receive_publish_size",
                "Sizes of messages received by broker for a channel",
            )
            .buckets(publish_size_buckets()?),
            &["ident", "chan"],
        )?;
        registry.register(Box::new(receive_publish_size.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            client_connections,
            connection_made,
            connection_ready,
            connection_error,
            connection_lost,
            send_buffer_size,
            receive_buffer_size,
            receive_buffer_fill,
            send_buffer_fill,
            send_buffer_drain,
            send_buffer_deadline_start,
            send_buffer_deadline_recover,
            subscriptions,
            receive_publish_count,
            receive_publish_size,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render all metrics in Prometheus text format
    pub fn render(&self) -> prometheus::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder.encode_to_string(&metric_families)
    }

    /// Clear every instrument back to zero with no label values.
    ///
    /// Only for isolating tests that share one registry. Callers must make
    /// sure no update or scrape runs concurrently.
    pub fn reset(&self) {
        self.client_connections.set(0);
        self.connection_made.reset();
        self.connection_ready.reset();
        self.connection_error.reset();
        self.connection_lost.reset();
        self.send_buffer_size.reset();
        self.receive_buffer_size.reset();
        self.receive_buffer_fill.reset();
        self.send_buffer_fill.reset();
        self.send_buffer_drain.reset();
        self.send_buffer_deadline_start.reset();
        self.send_buffer_deadline_recover.reset();
        self.subscriptions.reset();
        self.receive_publish_count.reset();
        self.receive_publish_size.reset();
    }

    pub fn connection_made(&self) {
        self.connection_made.inc();
    }

    pub fn client_connected(&self) {
        self.client_connections.inc();
    }

    pub fn client_disconnected(&self) {
        self.client_connections.dec();
    }

    pub fn set_client_connections(&self, count: i64) {
        self.client_connections.set(count);
    }

    pub fn connection_ready(&self, ident: &str) {
        self.connection_ready.with_label_values(&[ident]).inc();
    }

    pub fn connection_error(&self, ident: &str, category: &str) {
        self.connection_error
            .with_label_values(&[ident, category])
            .inc();
    }

    pub fn connection_lost(&self, ident: &str) {
        self.connection_lost.with_label_values(&[ident]).inc();
    }

    pub fn receive_buffer_fill(&self, ident: &str, bytes: u64) {
        self.receive_buffer_fill
            .with_label_values(&[ident])
            .inc_by(bytes);
    }

    pub fn send_buffer_fill(&self, ident: &str, bytes: u64) {
        self.send_buffer_fill.with_label_values(&[ident]).inc_by(bytes);
    }

    pub fn send_buffer_drain(&self, ident: &str, bytes: u64) {
        self.send_buffer_drain
            .with_label_values(&[ident])
            .inc_by(bytes);
    }

    pub fn send_buffer_deadline_start(&self, ident: &str) {
        self.send_buffer_deadline_start
            .with_label_values(&[ident])
            .inc();
    }

    pub fn send_buffer_deadline_recover(&self, ident: &str) {
        self.send_buffer_deadline_recover
            .with_label_values(&[ident])
            .inc();
    }

    pub fn set_subscriptions(&self, ident: &str, chan: &str, count: i64) {
        self.subscriptions
            .with_label_values(&[ident, chan])
            .set(count);
    }

    /// Count a published message and record its payload size
    pub fn receive_publish(&self, ident: &str, chan: &str, size: usize) {
        self.receive_publish_count
            .with_label_values(&[ident, chan])
            .inc();
        self.receive_publish_size
            .with_label_values(&[ident, chan])
            .observe(size as f64);
    }
}
