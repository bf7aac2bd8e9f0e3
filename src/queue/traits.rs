//! Core queue service trait.

use std::collections::BTreeMap;

use crate::TransportError;

/// The queue service operations the monitor relies on.
///
/// Implementations perform exactly one remote call per method and never
/// retry. Timeouts are the implementation's concern.
#[async_trait::async_trait]
pub trait QueueService: Send + Sync + 'static {
    /// List the URLs of every queue the service knows about.
    async fn list_queues(&self) -> Result<Vec<String>, TransportError>;

    /// Fetch the named attributes of one queue.
    ///
    /// The returned map may contain fewer entries than requested; the service
    /// decides what it reports.
    async fn get_attributes(
        &self,
        queue_url: &str,
        names: &[&str],
    ) -> Result<BTreeMap<String, String>, TransportError>;
}
