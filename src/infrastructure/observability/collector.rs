use crate::domain::connection::ConnectionSnapshot;
use crate::domain::ports::ConnectionSource;
use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{IntGaugeVec, Opts};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

const FAMILY_NAME: &str = "client_authenticated_connections";
const FAMILY_HELP: &str = "Authenticated connections";
const LABELS: [&str; 2] = ["ident", "owner"];

/// Number of open connections per `(ident, owner)` pair.
///
/// Owner absence is reported as the empty string.
pub fn count_authenticated(connections: &[ConnectionSnapshot]) -> BTreeMap<(String, String), i64> {
    let mut counts = BTreeMap::new();
    for conn in connections {
        let Some(ident) = conn.ident() else {
            continue;
        };
        let owner = conn.owner.clone().unwrap_or_default();
        *counts.entry((ident.to_string(), owner)).or_insert(0) += 1;
    }
    counts
}

/// Scrape-time producer of the `client_authenticated_connections` family.
///
/// Holds nothing but a handle to the connection set; each `collect` starts
/// from an empty tally.
#[derive(Clone)]
pub struct AuthenticatedConnectionsCollector {
    source: Arc<dyn ConnectionSource>,
    opts: Opts,
    descs: Vec<Desc>,
}

impl AuthenticatedConnectionsCollector {
    pub fn new(source: Arc<dyn ConnectionSource>) -> prometheus::Result<Self> {
        let opts = Opts::new(FAMILY_NAME, FAMILY_HELP);
        let template = IntGaugeVec::new(opts.clone(), &LABELS)?;
        let descs = template.desc().into_iter().cloned().collect();
        Ok(Self {
            source,
            opts,
            descs,
        })
    }

    /// Fresh `((ident, owner), count)` entries for the current connection set.
    pub fn entries(&self) -> impl Iterator<Item = ((String, String), i64)> {
        count_authenticated(&self.source.snapshot()).into_iter()
    }
}

impl Collector for AuthenticatedConnectionsCollector {
    fn desc(&self) -> Vec<&Desc> {
        self.descs.iter().collect()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let gauge = match IntGaugeVec::new(self.opts.clone(), &LABELS) {
            Ok(gauge) => gauge,
            Err(e) => {
                warn!("Failed to build {} family: {}", FAMILY_NAME, e);
                return Vec::new();
            }
        };
        for ((ident, owner), count) in self.entries() {
            gauge
                .with_label_values(&[ident.as_str(), owner.as_str()])
                .set(count);
        }
        gauge.collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::connections::ConnectionRegistry;

    struct FixedConnections(Vec<ConnectionSnapshot>);

    impl ConnectionSource for FixedConnections {
        fn snapshot(&self) -> Vec<ConnectionSnapshot> {
            self.0.clone()
        }
    }

    fn three_connections() -> Vec<ConnectionSnapshot> {
        vec![
            ConnectionSnapshot::authenticated("a", Some("u1".to_string())),
            ConnectionSnapshot::authenticated("a", Some("u1".to_string())),
            ConnectionSnapshot::authenticated("b", None),
            ConnectionSnapshot::unauthenticated(),
        ]
    }

    #[test]
    fn test_count_authenticated() {
        let counts = count_authenticated(&three_connections());
        let entries: Vec<_> = counts.into_iter().collect();
        assert_eq!(
            entries,
            vec![
                (("a".to_string(), "u1".to_string()), 2),
                (("b".to_string(), String::new()), 1),
            ]
        );
    }

    #[test]
    fn test_empty_ident_is_not_counted() {
        let counts = count_authenticated(&[
            ConnectionSnapshot::authenticated("", None),
            ConnectionSnapshot::authenticated("", Some("u1".to_string())),
        ]);
        assert!(counts.is_empty());
    }

    #[test]
    fn test_collect_emits_one_sample_per_key() {
        let collector =
            AuthenticatedConnectionsCollector::new(Arc::new(FixedConnections(three_connections())))
                .expect("collector");
        let registry = prometheus::Registry::new();
        registry
            .register(Box::new(collector.clone()))
            .expect("register");

        let output = prometheus::TextEncoder::new()
            .encode_to_string(&registry.gather())
            .expect("encode");
        assert!(output.contains("# TYPE client_authenticated_connections gauge"));
        assert!(output.contains(r#"client_authenticated_connections{ident="a",owner="u1"} 2"#));
        assert!(output.contains(r#"client_authenticated_connections{ident="b",owner=""} 1"#));
        assert_eq!(
            output
                .lines()
                .filter(|l| l.starts_with("client_authenticated_connections{"))
                .count(),
            2
        );
    }

    #[test]
    fn test_collect_starts_from_zero_each_time() {
        let connections = Arc::new(ConnectionRegistry::new());
        let collector = AuthenticatedConnectionsCollector::new(connections.clone()).expect("collector");

        let id = connections.open();
        connections.authenticate(id, "a", None);
        assert_eq!(collector.entries().count(), 1);
        assert_eq!(collector.entries().next().map(|(_, n)| n), Some(1));

        connections.close(id);
        assert_eq!(collector.entries().count(), 0);

        let registry = prometheus::Registry::new();
        registry.register(Box::new(collector)).expect("register");
        let output = prometheus::TextEncoder::new()
            .encode_to_string(&registry.gather())
            .expect("encode");
        assert!(!output.contains("client_authenticated_connections{"));
    }

    #[test]
    fn test_unregister_removes_family() {
        let collector =
            AuthenticatedConnectionsCollector::new(Arc::new(FixedConnections(three_connections())))
                .expect("collector");
        let registry = prometheus::Registry::new();
        registry
            .register(Box::new(collector.clone()))
            .expect("register");
        registry
            .unregister(Box::new(collector))
            .expect("unregister");
        assert!(registry.gather().is_empty());
    }
}
