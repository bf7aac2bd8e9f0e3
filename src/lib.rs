//! queuewatch - queue depth monitoring for Zabbix
//!
//! This crate polls an SQS-compatible message queue service (ElasticMQ in
//! particular) for per-queue depth attributes and pushes them to Zabbix with
//! the sender protocol. At startup it also announces every
//! (queue, attribute) pair through low-level discovery so Zabbix can create
//! the matching items.
//!
//! # Architecture
//!
//! - **Queue**: service client, startup registry snapshot, attribute collector
//! - **Reporter**: discovery and metrics packet builders
//! - **Zabbix**: `ZBXD` framing and the TCP sender
//! - **Scheduler**: startup sequence and the fixed-interval loop
//! - **Config**: YAML file, environment and CLI settings
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use queuewatch::{IntervalTicker, ReportTarget, Scheduler, SqsClient, ZabbixSender};
//! use queuewatch::config::QueueConfig;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = Arc::new(SqsClient::new(&QueueConfig::new("http://localhost:9324"))?);
//!     let sender = Arc::new(ZabbixSender::new("zabbix.local", 10051));
//!     let ticker = IntervalTicker::new(Duration::from_secs(300));
//!
//!     let mut scheduler = Scheduler::new(service, sender, ticker, ReportTarget::new("mq-host"));
//!     scheduler.run().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
mod error;
pub mod queue;
pub mod reporter;
pub mod scheduler;
pub mod zabbix;

#[cfg(test)]
pub(crate) mod testing;

pub use error::TransportError;
pub use queue::{
    AttributeCollector, AttributeSet, QueueAttribute, QueueHandle, QueueRegistry, QueueService,
    SqsClient,
};
pub use reporter::{DiscoveryReporter, MetricsReporter, ReportError, ReportTarget};
pub use scheduler::{IntervalTicker, Scheduler, SchedulerError, SchedulerState, Ticker};
pub use zabbix::{Metric, MetricSender, Packet, ProtocolError, SendError, ZabbixSender};
