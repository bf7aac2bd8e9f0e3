//! Polling loop.
//!
//! The [`Scheduler`] moves through two states:
//!
//! - **Starting**: snapshot the queue registry, send discovery, send one
//!   round of metrics.
//! - **Running**: send one round of metrics per [`Ticker`] tick.
//!
//! Every failure is returned to the caller; nothing is retried or skipped.
//! Cycles never overlap: the ticker is only polled once the previous send
//! has completed.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::{Interval, MissedTickBehavior};

use crate::TransportError;
use crate::queue::{AttributeCollector, QueueRegistry, QueueService};
use crate::reporter::{DiscoveryReporter, MetricsReporter, ReportError, ReportTarget};
use crate::zabbix::{MetricSender, Packet, SenderResponse};

/// Default polling interval (300 seconds).
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(300);

/// Minimum allowed interval (1 second).
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Fatal scheduler errors, tagged with the stage that failed.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("failed to initialize monitor: {0}")]
    Registry(#[source] TransportError),

    #[error("failed to send auto discovery: {0}")]
    Discovery(#[source] ReportError),

    #[error("failed to send monitoring data: {0}")]
    Metrics(#[source] ReportError),
}

/// Lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Starting,
    Running,
}

/// Source of cycle ticks.
#[async_trait::async_trait]
pub trait Ticker: Send {
    /// Wait for the next tick.
    ///
    /// Returns `false` when no more ticks will come.
    async fn tick(&mut self) -> bool;
}

/// Wall-clock ticker over [`tokio::time::Interval`].
///
/// The interval is armed on the first call to [`tick`](Ticker::tick), so the
/// first tick fires one full period after the startup cycle has finished,
/// however long that took. Late ticks are delayed rather than bursted.
#[derive(Debug)]
pub struct IntervalTicker {
    period: Duration,
    interval: Option<Interval>,
}

impl IntervalTicker {
    /// Create a ticker with the given period.
    ///
    /// Period is clamped to a minimum of 1 second.
    pub fn new(period: Duration) -> Self {
        let period = if period < MIN_INTERVAL {
            tracing::warn!(min_interval = ?MIN_INTERVAL,
                "Interval is less than minimum allowed. Using minimum interval."
            );
            MIN_INTERVAL
        } else {
            period
        };

        Self {
            period,
            interval: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

#[async_trait::async_trait]
impl Ticker for IntervalTicker {
    async fn tick(&mut self) -> bool {
        let period = self.period;
        let interval = self.interval.get_or_insert_with(|| {
            let mut interval =
                tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });
        interval.tick().await;
        true
    }
}

/// Drives discovery and metric reporting.
pub struct Scheduler<T> {
    service: Arc<dyn QueueService>,
    sender: Arc<dyn MetricSender>,
    ticker: T,
    discovery: DiscoveryReporter,
    metrics: MetricsReporter,
    state: SchedulerState,
    cycles: u64,
}

impl<T: Ticker> Scheduler<T> {
    pub fn new(
        service: Arc<dyn QueueService>,
        sender: Arc<dyn MetricSender>,
        ticker: T,
        target: ReportTarget,
    ) -> Self {
        let collector = AttributeCollector::new(Arc::clone(&service));
        Self {
            service,
            sender,
            ticker,
            discovery: DiscoveryReporter::new(collector.clone(), target.clone()),
            metrics: MetricsReporter::new(collector, target),
            state: SchedulerState::Starting,
            cycles: 0,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Number of metric cycles sent so far, including the startup one.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Start, then run one cycle per tick until the ticker stops.
    ///
    /// With [`IntervalTicker`] this only returns on error.
    pub async fn run(&mut self) -> Result<(), SchedulerError> {
        let registry = self.start().await?;
        self.run_ticks(&registry).await
    }

    /// Perform the Starting phase and return the registry snapshot.
    ///
    /// On success the scheduler is in [`SchedulerState::Running`].
    pub async fn start(&mut self) -> Result<QueueRegistry, SchedulerError> {
        tracing::info!("Initializing monitor");
        let registry = QueueRegistry::snapshot(self.service.as_ref())
            .await
            .map_err(SchedulerError::Registry)?;

        let packet = self
            .discovery
            .build(&registry)
            .await
            .map_err(|e| SchedulerError::Discovery(ReportError::Collect(e)))?;
        let response = self
            .dispatch(&packet)
            .await
            .map_err(SchedulerError::Discovery)?;
        log_response("auto discovery", packet.len(), &response);

        self.cycle(&registry).await?;

        self.state = SchedulerState::Running;
        tracing::info!(queues = registry.len(), "Monitor running");
        Ok(registry)
    }

    /// Run one metrics cycle per tick.
    pub async fn run_ticks(&mut self, registry: &QueueRegistry) -> Result<(), SchedulerError> {
        while self.ticker.tick().await {
            self.cycle(registry).await?;
        }
        tracing::info!(cycles = self.cycles, "Ticker stopped");
        Ok(())
    }

    /// Build and send one metrics packet.
    async fn cycle(&mut self, registry: &QueueRegistry) -> Result<(), SchedulerError> {
        let packet = self
            .metrics
            .build(registry)
            .await
            .map_err(|e| SchedulerError::Metrics(ReportError::Collect(e)))?;
        let response = self
            .dispatch(&packet)
            .await
            .map_err(SchedulerError::Metrics)?;

        self.cycles += 1;
        log_response("monitoring data", packet.len(), &response);
        Ok(())
    }

    async fn dispatch(&self, packet: &Packet) -> Result<SenderResponse, ReportError> {
        self.sender.send(packet).await.map_err(ReportError::Send)
    }
}

impl<T> std::fmt::Debug for Scheduler<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("state", &self.state)
            .field("cycles", &self.cycles)
            .finish_non_exhaustive()
    }
}

fn log_response(what: &str, metrics: usize, response: &SenderResponse) {
    match response.summary() {
        Some(summary) => tracing::info!(
            metrics,
            processed = summary.processed,
            failed = summary.failed,
            total = summary.total,
            "Sent {}",
            what
        ),
        None => tracing::info!(metrics, response = %response, "Sent {}", what),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CountingTicker, FakeQueueService, RecordingSender};
    use crate::zabbix::{ProtocolError, SendError};

    fn scheduler(
        service: FakeQueueService,
        sender: Arc<RecordingSender>,
        ticks: usize,
    ) -> Scheduler<CountingTicker> {
        Scheduler::new(
            Arc::new(service),
            sender,
            CountingTicker::new(ticks),
            ReportTarget::new("mq-host"),
        )
    }

    fn two_queues() -> FakeQueueService {
        FakeQueueService::new()
            .with_queue(
                "orders",
                &[
                    ("ApproximateNumberOfMessages", "4"),
                    ("ApproximateNumberOfMessagesDelayed", "0"),
                ],
            )
            .with_queue("payments", &[("ApproximateNumberOfMessages", "1")])
    }

    #[tokio::test]
    async fn test_start_sends_discovery_then_metrics() {
        let sender = Arc::new(RecordingSender::new());
        let mut scheduler = scheduler(two_queues(), sender.clone(), 0);
        assert_eq!(scheduler.state(), SchedulerState::Starting);

        let registry = scheduler.start().await.unwrap();
        assert_eq!(scheduler.state(), SchedulerState::Running);
        assert_eq!(registry.len(), 2);

        let packets = sender.packets();
        assert_eq!(packets.len(), 2);
        assert!(packets[0]
            .metrics()
            .iter()
            .all(|m| m.key == "elasticmq.queue.discovery"));
        assert_eq!(packets[0].len(), 3);
        assert!(packets[1]
            .metrics()
            .iter()
            .all(|m| m.key.starts_with("elasticmq.queue[")));
        assert_eq!(packets[1].len(), 3);
    }

    #[tokio::test]
    async fn test_run_one_cycle_per_tick() {
        let sender = Arc::new(RecordingSender::new());
        let mut scheduler = scheduler(two_queues(), sender.clone(), 3);

        scheduler.run().await.unwrap();
        assert_eq!(scheduler.cycles(), 4);

        let packets = sender.packets();
        assert_eq!(packets.len(), 5);
        // Metric packets are rebuilt from scratch each cycle.
        assert!(packets[1..].windows(2).all(|w| w[0] == w[1]));
    }

    #[tokio::test]
    async fn test_empty_registry_still_sends() {
        let sender = Arc::new(RecordingSender::new());
        let mut scheduler = scheduler(FakeQueueService::new(), sender.clone(), 1);

        scheduler.run().await.unwrap();
        let packets = sender.packets();
        assert_eq!(packets.len(), 3);
        assert!(packets.iter().all(Packet::is_empty));
    }

    #[tokio::test]
    async fn test_registry_failure_is_fatal() {
        let sender = Arc::new(RecordingSender::new());
        let mut scheduler = scheduler(
            FakeQueueService::new().with_failing_listing(),
            sender.clone(),
            5,
        );

        let err = scheduler.run().await.unwrap_err();
        assert!(matches!(err, SchedulerError::Registry(_)));
        assert_eq!(scheduler.state(), SchedulerState::Starting);
        assert!(sender.packets().is_empty());
    }

    #[tokio::test]
    async fn test_collection_failure_sends_nothing() {
        let sender = Arc::new(RecordingSender::new());
        let service = two_queues().with_failing_queue("broken");
        let mut scheduler = scheduler(service, sender.clone(), 5);

        let err = scheduler.run().await.unwrap_err();
        assert!(matches!(
            err,
            SchedulerError::Discovery(ReportError::Collect(_))
        ));
        assert!(sender.packets().is_empty());
        assert_eq!(scheduler.cycles(), 0);
    }

    #[tokio::test]
    async fn test_send_failure_is_fatal() {
        let sender = Arc::new(RecordingSender::rejecting());
        let mut scheduler = scheduler(two_queues(), sender.clone(), 5);

        let err = scheduler.run().await.unwrap_err();
        assert!(matches!(
            err,
            SchedulerError::Discovery(ReportError::Send(SendError::Protocol(
                ProtocolError::Rejected { .. }
            )))
        ));
        assert_eq!(sender.packets().len(), 1);
        assert!(err.to_string().starts_with("failed to send auto discovery"));
    }

    #[tokio::test]
    async fn test_collection_failure_while_running() {
        let sender = Arc::new(RecordingSender::new());
        // Two queues: discovery and the startup cycle take four calls, each
        // tick two more. The second tick fails on its first call.
        let service = two_queues().failing_after(6);
        let mut scheduler = scheduler(service, sender.clone(), 5);

        let err = scheduler.run().await.unwrap_err();
        assert!(matches!(
            err,
            SchedulerError::Metrics(ReportError::Collect(TransportError::Timeout(_)))
        ));
        assert!(err.to_string().starts_with("failed to send monitoring data"));
        assert_eq!(scheduler.state(), SchedulerState::Running);
        assert_eq!(scheduler.cycles(), 2);
        // Nothing is sent for the failed cycle.
        assert_eq!(sender.packets().len(), 3);
    }

    #[tokio::test]
    async fn test_send_failure_while_running() {
        let sender = Arc::new(RecordingSender::rejecting_after(3));
        let mut scheduler = scheduler(two_queues(), sender.clone(), 5);

        let err = scheduler.run().await.unwrap_err();
        assert!(matches!(
            err,
            SchedulerError::Metrics(ReportError::Send(SendError::Protocol(
                ProtocolError::Rejected { .. }
            )))
        ));
        assert_eq!(scheduler.state(), SchedulerState::Running);
        assert_eq!(scheduler.cycles(), 2);
        assert_eq!(sender.packets().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_ticker_waits_one_period() {
        let mut ticker = IntervalTicker::new(Duration::from_secs(300));
        let start = tokio::time::Instant::now();

        assert!(ticker.tick().await);
        assert_eq!(start.elapsed(), Duration::from_secs(300));
        assert!(ticker.tick().await);
        assert_eq!(start.elapsed(), Duration::from_secs(600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_ticker_starts_after_slow_startup() {
        let mut ticker = IntervalTicker::new(Duration::from_secs(300));

        // Startup work that eats most of a period.
        tokio::time::sleep(Duration::from_secs(250)).await;
        let ready = tokio::time::Instant::now();

        assert!(ticker.tick().await);
        assert_eq!(ready.elapsed(), Duration::from_secs(300));
        assert!(ticker.tick().await);
        assert_eq!(ready.elapsed(), Duration::from_secs(600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_ticker_after_startup_longer_than_period() {
        let mut ticker = IntervalTicker::new(Duration::from_secs(60));

        tokio::time::sleep(Duration::from_secs(200)).await;
        let ready = tokio::time::Instant::now();

        assert!(ticker.tick().await);
        assert_eq!(ready.elapsed(), Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_ticker_minimum() {
        let ticker = IntervalTicker::new(Duration::from_millis(10));
        assert_eq!(ticker.period(), MIN_INTERVAL);
    }
}
