//! Zabbix sender protocol.
//!
//! - [`Metric`] / [`Packet`]: the data pushed to a Zabbix server or proxy
//! - [`protocol`]: `ZBXD` framing and the request/response bodies
//! - [`MetricSender`]: the delivery seam used by the scheduler
//! - [`ZabbixSender`]: one TCP connection per packet, like `zabbix_sender`

mod metric;
pub mod protocol;
mod sender;

pub use metric::{Metric, Packet};
pub use protocol::{ProtocolError, SenderResponse, SenderSummary};
pub use sender::{DEFAULT_PORT, DEFAULT_TIMEOUT, MetricSender, SendError, ZabbixSender};
