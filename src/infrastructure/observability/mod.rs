//! Pull-based observability for the broker
//!
//! Instruments are updated in place by protocol event handlers and read by a
//! scrape of the exporter's `/metrics` route. Values derived from the live
//! connection set are computed at scrape time:
//!
//! 1. **Buffer gauges**: rebuilt by the aggregator before each render
//! 2. **Authenticated connections**: produced by a collector during render

pub mod aggregator;
pub mod collector;
pub mod exporter;
pub mod metrics;

pub use aggregator::aggregate_buffer_sizes;
pub use collector::AuthenticatedConnectionsCollector;
pub use exporter::{ExporterHandle, ExporterState, MetricsExporter};
pub use metrics::BrokerMetrics;
