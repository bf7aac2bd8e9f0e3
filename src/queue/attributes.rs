//! Queue depth attributes and their collector.

use std::collections::BTreeMap;
use std::sync::Arc;

use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};

use crate::TransportError;
use crate::queue::{QueueHandle, QueueService};

/// The fixed set of attributes requested for every queue.
///
/// Variant names match the service's attribute names exactly.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display, AsRefStr, IntoStaticStr, EnumIter,
)]
pub enum QueueAttribute {
    /// Messages available for retrieval (in flight on the queue).
    ApproximateNumberOfMessages,
    /// Messages waiting out their delay.
    ApproximateNumberOfMessagesDelayed,
    /// Messages received but not yet deleted.
    ApproximateNumberOfMessagesNotVisible,
}

impl QueueAttribute {
    /// Attribute names in request order.
    pub fn names() -> Vec<&'static str> {
        Self::iter().map(Into::into).collect()
    }
}

/// Attribute name → raw value, as reported by the queue service.
///
/// Values are kept as strings; nothing here interprets them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeSet(BTreeMap<String, String>);

impl AttributeSet {
    /// Look up one attribute value.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Iterate `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Attribute names in name order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<BTreeMap<String, String>> for AttributeSet {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

/// Fetches the depth attributes of a queue.
///
/// One remote call per [`fetch`](Self::fetch); no caching and no retry.
#[derive(Clone)]
pub struct AttributeCollector {
    service: Arc<dyn QueueService>,
    names: Vec<&'static str>,
}

impl AttributeCollector {
    /// Create a collector requesting every [`QueueAttribute`].
    pub fn new(service: Arc<dyn QueueService>) -> Self {
        Self {
            service,
            names: QueueAttribute::names(),
        }
    }

    /// Fetch the current attributes of `handle`.
    ///
    /// A response missing some attributes is returned as-is.
    pub async fn fetch(&self, handle: &QueueHandle) -> Result<AttributeSet, TransportError> {
        let attrs = self
            .service
            .get_attributes(handle.url(), &self.names)
            .await
            .inspect_err(|e| {
                tracing::warn!(queue = %handle.name(), error = %e, "Failed to fetch queue attributes")
            })?;

        tracing::debug!(queue = %handle.name(), count = attrs.len(), "Fetched queue attributes");
        Ok(AttributeSet::from(attrs))
    }
}

impl std::fmt::Debug for AttributeCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributeCollector")
            .field("names", &self.names)
            .finish_non_exhaustive()
    }
}
