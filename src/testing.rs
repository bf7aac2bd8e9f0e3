//! In-memory collaborators shared by unit tests.

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::TransportError;
use crate::queue::QueueService;
use crate::scheduler::Ticker;
use crate::zabbix::{MetricSender, Packet, ProtocolError, SendError, SenderResponse};

pub(crate) const BASE_URL: &str = "http://localhost:9324/000000000000";

pub(crate) fn queue_url(name: &str) -> String {
    format!("{BASE_URL}/{name}")
}

/// Queue service backed by a fixed table of queues and attributes.
#[derive(Default)]
pub(crate) struct FakeQueueService {
    queues: Vec<String>,
    attributes: BTreeMap<String, BTreeMap<String, String>>,
    failing: HashSet<String>,
    fail_listing: bool,
    fail_after: Option<usize>,
    attribute_calls: AtomicUsize,
}

impl FakeQueueService {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_queue(mut self, name: &str, attrs: &[(&str, &str)]) -> Self {
        let url = queue_url(name);
        self.queues.push(url.clone());
        self.attributes.insert(
            url,
            attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
        self
    }

    pub(crate) fn with_failing_queue(mut self, name: &str) -> Self {
        let url = queue_url(name);
        self.queues.push(url.clone());
        self.failing.insert(url);
        self
    }

    pub(crate) fn with_failing_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    /// Answer the first `calls` attribute requests, then time out on all of them.
    pub(crate) fn failing_after(mut self, calls: usize) -> Self {
        self.fail_after = Some(calls);
        self
    }

    pub(crate) fn attribute_calls(&self) -> usize {
        self.attribute_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl QueueService for FakeQueueService {
    async fn list_queues(&self) -> Result<Vec<String>, TransportError> {
        if self.fail_listing {
            return Err(TransportError::Status {
                status: 500,
                code: "InternalError".to_string(),
                message: "listing unavailable".to_string(),
            });
        }
        Ok(self.queues.clone())
    }

    async fn get_attributes(
        &self,
        queue_url: &str,
        _names: &[&str],
    ) -> Result<BTreeMap<String, String>, TransportError> {
        let call = self.attribute_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_after.is_some_and(|limit| call >= limit) {
            return Err(TransportError::Timeout(Duration::from_secs(1)));
        }
        if self.failing.contains(queue_url) {
            return Err(TransportError::Status {
                status: 400,
                code: "QueueDoesNotExist".to_string(),
                message: format!("queue {queue_url} does not exist"),
            });
        }
        Ok(self.attributes.get(queue_url).cloned().unwrap_or_default())
    }
}

/// Sender that records every packet it is asked to deliver.
#[derive(Default)]
pub(crate) struct RecordingSender {
    packets: Mutex<Vec<Packet>>,
    accept: Option<usize>,
}

impl RecordingSender {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn rejecting() -> Self {
        Self::rejecting_after(0)
    }

    /// Accept the first `accepted` packets, then reject every later one.
    pub(crate) fn rejecting_after(accepted: usize) -> Self {
        Self {
            accept: Some(accepted),
            ..Self::default()
        }
    }

    pub(crate) fn packets(&self) -> Vec<Packet> {
        self.packets.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl MetricSender for RecordingSender {
    async fn send(&self, packet: &Packet) -> Result<SenderResponse, SendError> {
        let sent = {
            let mut packets = self.packets.lock().unwrap();
            packets.push(packet.clone());
            packets.len()
        };
        let total = packet.len();
        if self.accept.is_some_and(|accepted| sent > accepted) {
            return Err(ProtocolError::Rejected {
                response: "failed".to_string(),
                info: None,
            }
            .into());
        }
        Ok(SenderResponse {
            response: "success".to_string(),
            info: Some(format!(
                "processed: {total}; failed: 0; total: {total}; seconds spent: 0.000042"
            )),
        })
    }
}

/// Ticker that fires a fixed number of times and then stops.
pub(crate) struct CountingTicker {
    remaining: usize,
}

impl CountingTicker {
    pub(crate) fn new(ticks: usize) -> Self {
        Self { remaining: ticks }
    }
}

#[async_trait::async_trait]
impl Ticker for CountingTicker {
    async fn tick(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }
}
