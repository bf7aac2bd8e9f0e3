//! Queue service layer.
//!
//! Everything the monitor needs from the message-queueing service:
//!
//! - [`QueueService`]: the two calls the core depends on (list, describe)
//! - [`SqsClient`]: SQS JSON protocol client (ElasticMQ, LocalStack, AWS-compatible)
//! - [`QueueRegistry`]: immutable name → handle snapshot taken at startup
//! - [`AttributeCollector`]: fetches the fixed depth attributes for one queue
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use queuewatch::config::QueueConfig;
//! use queuewatch::queue::{AttributeCollector, QueueRegistry, SqsClient};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = QueueConfig::new("http://localhost:9324");
//! let service = Arc::new(SqsClient::new(&config)?);
//! let registry = QueueRegistry::snapshot(service.as_ref()).await?;
//! let collector = AttributeCollector::new(service);
//! for (_, handle) in registry.iter() {
//!     let attrs = collector.fetch(handle).await?;
//!     println!("{}: {:?}", handle.name(), attrs);
//! }
//! # Ok(())
//! # }
//! ```

mod attributes;
mod registry;
mod sqs;
mod traits;

pub use attributes::{AttributeCollector, AttributeSet, QueueAttribute};
pub use registry::{QueueHandle, QueueRegistry};
pub use sqs::SqsClient;
pub use traits::QueueService;
