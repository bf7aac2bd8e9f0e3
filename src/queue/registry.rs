//! Startup snapshot of known queues.

use std::collections::BTreeMap;

use crate::TransportError;
use crate::queue::QueueService;

/// A queue as seen at startup: its URL and the name derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueHandle {
    name: String,
    url: String,
}

impl QueueHandle {
    /// Build a handle from a queue URL.
    ///
    /// The name is the URL's final path segment, ignoring trailing slashes.
    pub fn from_url(url: impl Into<String>) -> Self {
        let url = url.into();
        let name = queue_name(&url).to_string();
        Self { name, url }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

fn queue_name(url: &str) -> &str {
    let trimmed = url.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Immutable name → handle mapping captured once at startup.
///
/// Queues created after the snapshot stay invisible until the process
/// restarts. Iteration is ordered by queue name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueRegistry {
    queues: BTreeMap<String, QueueHandle>,
}

impl QueueRegistry {
    /// List the service's queues and capture them.
    ///
    /// # Errors
    /// Returns the service's `TransportError` if the listing call fails.
    pub async fn snapshot(service: &dyn QueueService) -> Result<Self, TransportError> {
        let urls = service.list_queues().await?;
        let registry = Self::from_handles(urls.into_iter().map(QueueHandle::from_url));
        tracing::info!(
            queues = registry.len(),
            names = ?registry.names().collect::<Vec<_>>(),
            "Captured queue registry"
        );
        Ok(registry)
    }

    /// Build a registry from handles.
    ///
    /// When two handles share a name, the later one wins.
    pub fn from_handles(handles: impl IntoIterator<Item = QueueHandle>) -> Self {
        let queues = handles
            .into_iter()
            .map(|h| (h.name.clone(), h))
            .collect();
        Self { queues }
    }

    pub fn get(&self, name: &str) -> Option<&QueueHandle> {
        self.queues.get(name)
    }

    /// Iterate `(name, handle)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &QueueHandle)> {
        self.queues.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.queues.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.queues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }
}
