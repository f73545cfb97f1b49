pub mod auth;
pub mod connections;
pub mod observability;

pub use auth::{CredentialStore, YieldingResolver};
pub use connections::{ConnectionId, ConnectionRegistry};
pub use observability::{BrokerMetrics, MetricsExporter};
