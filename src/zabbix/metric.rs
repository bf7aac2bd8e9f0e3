//! Metric and packet types.

use serde::Serialize;

/// One trapper item value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metric {
    /// Host name as configured in Zabbix.
    pub host: String,
    /// Item key.
    pub key: String,
    /// Raw value; Zabbix converts it according to the item's type.
    pub value: String,
}

impl Metric {
    pub fn new(host: impl Into<String>, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            key: key.into(),
            value: value.into(),
        }
    }
}

/// An ordered batch of metrics delivered in a single request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Packet {
    metrics: Vec<Metric>,
}

impl Packet {
    pub fn new(metrics: Vec<Metric>) -> Self {
        Self { metrics }
    }

    pub fn push(&mut self, metric: Metric) {
        self.metrics.push(metric);
    }

    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

impl FromIterator<Metric> for Packet {
    fn from_iter<I: IntoIterator<Item = Metric>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
