//! Per-cycle attribute values.

use crate::TransportError;
use crate::queue::{AttributeCollector, QueueRegistry};
use crate::reporter::ReportTarget;
use crate::zabbix::{Metric, Packet};

/// Builds the monitoring packet: one metric per (queue, attribute) reported.
#[derive(Debug, Clone)]
pub struct MetricsReporter {
    collector: AttributeCollector,
    target: ReportTarget,
}

impl MetricsReporter {
    pub fn new(collector: AttributeCollector, target: ReportTarget) -> Self {
        Self { collector, target }
    }

    /// Item key for one queue attribute: `<prefix>[<queue>,<attribute>]`.
    pub fn item_key(prefix: &str, queue: &str, attribute: &str) -> String {
        format!("{prefix}[{queue},{attribute}]")
    }

    /// Build the monitoring packet for `registry`.
    ///
    /// Values are forwarded verbatim.
    ///
    /// # Errors
    /// Aborts on the first queue whose attributes cannot be fetched.
    pub async fn build(&self, registry: &QueueRegistry) -> Result<Packet, TransportError> {
        let mut packet = Packet::default();

        for (name, handle) in registry.iter() {
            let attrs = self.collector.fetch(handle).await?;
            for (attr, value) in attrs.iter() {
                packet.push(Metric::new(
                    &self.target.host,
                    Self::item_key(&self.target.item_key, name, attr),
                    value,
                ));
            }
        }

        tracing::debug!(
            queues = registry.len(),
            metrics = packet.len(),
            "Built metrics packet"
        );
        Ok(packet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeQueueService;
    use std::collections::HashSet;
    use std::sync::Arc;

    async fn build(service: FakeQueueService) -> Result<Packet, TransportError> {
        let registry = QueueRegistry::snapshot(&service).await.unwrap();
        MetricsReporter::new(
            AttributeCollector::new(Arc::new(service)),
            ReportTarget::new("mq-host"),
        )
        .build(&registry)
        .await
    }

    #[test]
    fn test_item_key_format() {
        assert_eq!(
            MetricsReporter::item_key("elasticmq.queue", "orders", "ApproximateNumberOfMessages"),
            "elasticmq.queue[orders,ApproximateNumberOfMessages]"
        );
    }

    #[tokio::test]
    async fn test_single_queue_scenario() {
        let packet = build(
            FakeQueueService::new().with_queue("q1", &[("ApproximateNumberOfMessages", "5")]),
        )
        .await
        .unwrap();

        assert_eq!(
            packet,
            Packet::new(vec![Metric::new(
                "mq-host",
                "elasticmq.queue[q1,ApproximateNumberOfMessages]",
                "5",
            )])
        );
    }

    #[tokio::test]
    async fn test_one_metric_per_reported_attribute() {
        let packet = build(
            FakeQueueService::new()
                .with_queue(
                    "orders",
                    &[
                        ("ApproximateNumberOfMessages", "10"),
                        ("ApproximateNumberOfMessagesDelayed", "1"),
                        ("ApproximateNumberOfMessagesNotVisible", "2"),
                    ],
                )
                .with_queue("payments", &[("ApproximateNumberOfMessages", "0")])
                .with_queue("idle", &[]),
        )
        .await
        .unwrap();

        assert_eq!(packet.len(), 4);
        let keys: HashSet<_> = packet.metrics().iter().map(|m| m.key.clone()).collect();
        assert_eq!(keys.len(), 4, "item keys must be unique");
        assert!(keys.contains("elasticmq.queue[payments,ApproximateNumberOfMessages]"));
        assert!(keys.contains("elasticmq.queue[orders,ApproximateNumberOfMessages]"));
    }

    #[tokio::test]
    async fn test_values_pass_through_verbatim() {
        let packet = build(
            FakeQueueService::new().with_queue("q1", &[("ApproximateNumberOfMessages", "n/a")]),
        )
        .await
        .unwrap();
        assert_eq!(packet.metrics()[0].value, "n/a");
    }

    #[tokio::test]
    async fn test_empty_registry() {
        let packet = build(FakeQueueService::new()).await.unwrap();
        assert!(packet.is_empty());
    }

    #[tokio::test]
    async fn test_collector_failure_aborts() {
        let result = build(
            FakeQueueService::new()
                .with_queue("a", &[("ApproximateNumberOfMessages", "1")])
                .with_failing_queue("b"),
        )
        .await;
        assert!(matches!(result, Err(TransportError::Status { .. })));
    }
}
