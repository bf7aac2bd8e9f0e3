//! Metric delivery.

use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::TransportError;
use crate::zabbix::protocol::{self, ProtocolError, SenderResponse};
use crate::zabbix::Packet;

/// Default connect + exchange timeout (10 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default Zabbix trapper port.
pub const DEFAULT_PORT: u16 = 10051;

/// Errors that can occur while delivering a packet.
#[derive(Debug, Error)]
pub enum SendError {
    /// Could not reach the backend or the exchange broke off.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Backend answered, but not with an acceptance.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Delivers packets to a monitoring backend.
///
/// One call is one atomic request. Implementations do not retry.
#[async_trait::async_trait]
pub trait MetricSender: Send + Sync + 'static {
    /// Deliver `packet` and return the backend's answer.
    ///
    /// Empty packets are delivered like any other.
    async fn send(&self, packet: &Packet) -> Result<SenderResponse, SendError>;
}

/// Zabbix trapper client.
///
/// Opens a fresh TCP connection for every packet, writes one `ZBXD` frame and
/// reads one back.
#[derive(Debug, Clone)]
pub struct ZabbixSender {
    address: String,
    timeout: Duration,
}

impl ZabbixSender {
    pub fn new(host: impl AsRef<str>, port: u16) -> Self {
        Self {
            address: format!("{}:{}", host.as_ref(), port),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the connect + exchange timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    async fn exchange(&self, frame: &[u8]) -> Result<Vec<u8>, SendError> {
        let mut stream = TcpStream::connect(&self.address)
            .await
            .map_err(TransportError::from)?;
        stream.write_all(frame).await.map_err(TransportError::from)?;
        stream.flush().await.map_err(TransportError::from)?;

        let body = protocol::read_frame(&mut stream)
            .await
            .map_err(TransportError::from)??;
        Ok(body)
    }
}

#[async_trait::async_trait]
impl MetricSender for ZabbixSender {
    async fn send(&self, packet: &Packet) -> Result<SenderResponse, SendError> {
        let body = protocol::encode_request(packet.metrics(), Utc::now().timestamp())?;
        let frame = protocol::encode_frame(&body)?;

        tracing::debug!(
            address = %self.address,
            metrics = packet.len(),
            bytes = frame.len(),
            "Sending packet"
        );

        let body = timeout(self.timeout, self.exchange(&frame))
            .await
            .map_err(|_| TransportError::Timeout(self.timeout))??;

        let response = SenderResponse::decode(&body)?;
        if !response.is_success() {
            return Err(ProtocolError::Rejected {
                response: response.response,
                info: response.info,
            }
            .into());
        }
        Ok(response)
    }
}
