//! Packet builders.
//!
//! - [`DiscoveryReporter`]: low-level discovery registrations, sent once at startup
//! - [`MetricsReporter`]: current attribute values, sent every cycle
//!
//! Both walk the [`QueueRegistry`](crate::queue::QueueRegistry) in name order
//! and fetch fresh attributes for every queue. Neither keeps state between
//! builds.

mod discovery;
mod metrics;

use thiserror::Error;

use crate::TransportError;
use crate::zabbix::SendError;

pub use discovery::{DiscoveryItem, DiscoveryReporter};
pub use metrics::MetricsReporter;

/// Default low-level discovery key.
pub const DEFAULT_DISCOVERY_KEY: &str = "elasticmq.queue.discovery";

/// Default item key prefix.
pub const DEFAULT_ITEM_KEY: &str = "elasticmq.queue";

/// Where reported values go: the Zabbix host and the keys used for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportTarget {
    /// Host name the items belong to in Zabbix.
    pub host: String,
    /// Key of the discovery rule.
    pub discovery_key: String,
    /// Prefix of per-queue item keys.
    pub item_key: String,
}

impl ReportTarget {
    /// Target `host` with the default keys.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            discovery_key: DEFAULT_DISCOVERY_KEY.to_string(),
            item_key: DEFAULT_ITEM_KEY.to_string(),
        }
    }

    pub fn with_discovery_key(mut self, key: impl Into<String>) -> Self {
        self.discovery_key = key.into();
        self
    }

    pub fn with_item_key(mut self, key: impl Into<String>) -> Self {
        self.item_key = key.into();
        self
    }
}

/// Errors that can occur while building and delivering a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Attribute collection failed; nothing was sent.
    #[error("get attributes: {0}")]
    Collect(#[source] TransportError),

    /// The packet was built but delivery failed.
    #[error("send zabbix: {0}")]
    Send(#[source] SendError),
}
