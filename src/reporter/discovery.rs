//! Low-level discovery payloads.

use serde::Serialize;

use crate::TransportError;
use crate::queue::{AttributeCollector, QueueRegistry};
use crate::reporter::ReportTarget;
use crate::zabbix::{Metric, Packet};

/// One monitorable (queue, attribute) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveryItem {
    #[serde(rename = "{#QUEUE}")]
    pub queue: String,
    #[serde(rename = "{#ITEM}")]
    pub item: String,
}

#[derive(Serialize)]
struct DiscoveryData<'a> {
    data: &'a [DiscoveryItem],
}

impl DiscoveryItem {
    pub fn new(queue: impl Into<String>, item: impl Into<String>) -> Self {
        Self {
            queue: queue.into(),
            item: item.into(),
        }
    }

    /// Encode as a single-entry LLD document: `{"data":[{...}]}`.
    pub fn to_lld_json(&self) -> String {
        let doc = DiscoveryData {
            data: std::slice::from_ref(self),
        };
        // Two string fields cannot fail to serialize.
        serde_json::to_string(&doc).unwrap_or_default()
    }
}

/// Builds the discovery packet.
///
/// Every (queue, attribute) pair becomes its own metric under the same
/// discovery key, so the backend must treat repeated discovery values as
/// additive.
#[derive(Debug, Clone)]
pub struct DiscoveryReporter {
    collector: AttributeCollector,
    target: ReportTarget,
}

impl DiscoveryReporter {
    pub fn new(collector: AttributeCollector, target: ReportTarget) -> Self {
        Self { collector, target }
    }

    /// Collect attributes for every queue and return the discovery items.
    ///
    /// # Errors
    /// Aborts on the first queue whose attributes cannot be fetched.
    pub async fn items(
        &self,
        registry: &QueueRegistry,
    ) -> Result<Vec<DiscoveryItem>, TransportError> {
        let mut items = Vec::new();
        for (name, handle) in registry.iter() {
            let attrs = self.collector.fetch(handle).await?;
            items.extend(attrs.names().map(|attr| DiscoveryItem::new(name, attr)));
        }
        Ok(items)
    }

    /// Build the discovery packet for `registry`.
    ///
    /// # Errors
    /// Aborts on the first queue whose attributes cannot be fetched.
    pub async fn build(&self, registry: &QueueRegistry) -> Result<Packet, TransportError> {
        let packet: Packet = self
            .items(registry)
            .await?
            .iter()
            .map(|item| {
                Metric::new(
                    &self.target.host,
                    &self.target.discovery_key,
                    item.to_lld_json(),
                )
            })
            .collect();

        tracing::debug!(
            queues = registry.len(),
            items = packet.len(),
            "Built discovery packet"
        );
        Ok(packet)
    }
}
