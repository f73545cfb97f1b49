//! Per-identity buffer occupancy.
//!
//! Runs synchronously on the scrape path. Both buffer gauges are wiped and
//! rebuilt from the connection set on every pass, so an ident whose last
//! connection went away disappears instead of lingering at a stale value.

use super::metrics::BrokerMetrics;
use crate::domain::connection::ConnectionSnapshot;
use std::collections::HashMap;

/// Summed buffer sizes for one ident
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BufferTotals {
    pub send_bytes: u64,
    pub receive_bytes: u64,
}

/// Group authenticated connections by ident and sum their buffers.
pub fn sum_buffers_by_ident(connections: &[ConnectionSnapshot]) -> HashMap<&str, BufferTotals> {
    let mut totals: HashMap<&str, BufferTotals> = HashMap::new();
    for conn in connections {
        let Some(ident) = conn.ident() else {
            continue;
        };
        let entry = totals.entry(ident).or_default();
        entry.send_bytes = entry.send_bytes.saturating_add(conn.send_buffer_bytes);
        entry.receive_bytes = entry.receive_bytes.saturating_add(conn.receive_buffer_bytes);
    }
    totals
}

/// Overwrite the send/receive buffer gauges with the current totals.
pub fn aggregate_buffer_sizes(metrics: &BrokerMetrics, connections: &[ConnectionSnapshot]) {
    let totals = sum_buffers_by_ident(connections);

    metrics.send_buffer_size.reset();
    metrics.receive_buffer_size.reset();

    for (ident, total) in totals {
        metrics
            .send_buffer_size
            .with_label_values(&[ident])
            .set(saturating_i64(total.send_bytes));
        metrics
            .receive_buffer_size
            .with_label_values(&[ident])
            .set(saturating_i64(total.receive_bytes));
    }
}

fn saturating_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn(ident: Option<&str>, send: u64, receive: u64) -> ConnectionSnapshot {
        let snapshot = match ident {
            Some(ident) => ConnectionSnapshot::authenticated(ident, None),
            None => ConnectionSnapshot::unauthenticated(),
        };
        snapshot.with_buffers(send, receive)
    }

    #[test]
    fn test_sums_per_ident() {
        let connections = vec![
            conn(Some("a"), 10, 1),
            conn(Some("a"), 5, 2),
            conn(Some("b"), 7, 0),
            conn(None, 1000, 1000),
        ];
        let totals = sum_buffers_by_ident(&connections);
        assert_eq!(totals.len(), 2);
        assert_eq!(
            totals["a"],
            BufferTotals {
                send_bytes: 15,
                receive_bytes: 3
            }
        );
        assert_eq!(totals["b"].send_bytes, 7);
    }

    #[test]
    fn test_empty_ident_is_skipped() {
        let metrics = BrokerMetrics::new().expect("metrics");
        let connections = vec![conn(Some(""), 10, 10), conn(Some("a"), 1, 1)];
        let totals = sum_buffers_by_ident(&connections);
        assert_eq!(totals.len(), 1);
        assert!(totals.contains_key("a"));

        aggregate_buffer_sizes(&metrics, &connections);
        let output = metrics.render().expect("render");
        assert!(!output.contains(r#"ident="""#));
    }

    #[test]
    fn test_sums_saturate_instead_of_overflowing() {
        let metrics = BrokerMetrics::new().expect("metrics");
        let connections = vec![conn(Some("a"), u64::MAX, u64::MAX), conn(Some("a"), 1, 1)];
        let totals = sum_buffers_by_ident(&connections);
        assert_eq!(totals["a"].send_bytes, u64::MAX);
        assert_eq!(totals["a"].receive_bytes, u64::MAX);

        aggregate_buffer_sizes(&metrics, &connections);
        assert_eq!(
            metrics.send_buffer_size.with_label_values(&["a"]).get(),
            i64::MAX
        );
    }

    #[test]
    fn test_gauges_reflect_sums() {
        let metrics = BrokerMetrics::new().expect("metrics");
        aggregate_buffer_sizes(
            &metrics,
            &[conn(Some("a"), 10, 1), conn(Some("a"), 5, 2), conn(Some("b"), 7, 0)],
        );
        assert_eq!(metrics.send_buffer_size.with_label_values(&["a"]).get(), 15);
        assert_eq!(metrics.receive_buffer_size.with_label_values(&["a"]).get(), 3);
        assert_eq!(metrics.send_buffer_size.with_label_values(&["b"]).get(), 7);
    }

    #[test]
    fn test_vanished_ident_is_dropped() {
        let metrics = BrokerMetrics::new().expect("metrics");
        aggregate_buffer_sizes(&metrics, &[conn(Some("a"), 10, 1), conn(Some("b"), 7, 0)]);
        aggregate_buffer_sizes(&metrics, &[conn(Some("b"), 3, 0)]);

        let output = metrics.render().expect("render");
        assert!(!output.contains(r#"ident="a""#));
        assert!(output.contains(r#"connection_send_buffer_size{ident="b"} 3"#));
    }

    #[test]
    fn test_unauthenticated_only_leaves_gauges_empty() {
        let metrics = BrokerMetrics::new().expect("metrics");
        aggregate_buffer_sizes(&metrics, &[conn(None, 10, 10)]);
        let output = metrics.render().expect("render");
        assert!(!output.contains("connection_send_buffer_size{"));
        assert!(!output.contains("connection_receive_buffer_size{"));
    }
}
