//! `ZBXD` framing and sender request/response bodies.
//!
//! Every message on the wire is:
//!
//! ```text
//! +------+-------+-------------+-------------+------------+
//! | ZBXD | flags | data length | reserved    | JSON body  |
//! | 4 B  | 1 B   | u32 LE      | u32 LE (0)  | length B   |
//! +------+-------+-------------+-------------+------------+
//! ```
//!
//! Only the plain protocol flag (`0x01`) is supported; compressed and
//! large-packet frames are rejected.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::zabbix::Metric;

/// Frame magic.
pub const MAGIC: &[u8; 4] = b"ZBXD";

/// Plain Zabbix protocol flag.
pub const FLAG_PROTOCOL: u8 = 0x01;

const FLAG_COMPRESSED: u8 = 0x02;
const FLAG_LARGE: u8 = 0x04;

/// Header size: magic, flags, data length, reserved.
pub const HEADER_LEN: usize = 13;

/// Largest body accepted from a peer (128 MiB).
pub const MAX_BODY_LEN: u32 = 128 * 1024 * 1024;

/// Request type for trapper data.
pub const SENDER_REQUEST: &str = "sender data";

/// Response value for an accepted request.
pub const RESPONSE_SUCCESS: &str = "success";

/// Errors raised when the backend's answer is not an acceptance.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Frame did not start with `ZBXD`.
    #[error("invalid frame header")]
    InvalidHeader,

    /// Frame uses a protocol feature this sender does not implement.
    #[error("unsupported frame flags: {0:#04x}")]
    UnsupportedFlags(u8),

    /// Body is larger than [`MAX_BODY_LEN`], in either direction.
    #[error("frame body too large: {0} bytes")]
    PayloadTooLarge(usize),

    /// Body could not be encoded or decoded.
    #[error("malformed body: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Backend processed the request and refused it.
    #[error("backend rejected data: {response} ({})", .info.as_deref().unwrap_or("no info"))]
    Rejected {
        response: String,
        info: Option<String>,
    },
}

#[derive(Debug, Serialize)]
struct SenderRequest<'a> {
    request: &'static str,
    data: &'a [Metric],
    clock: i64,
}

/// Encode a sender request body for `metrics`, stamped with `clock`.
pub fn encode_request(metrics: &[Metric], clock: i64) -> Result<Vec<u8>, ProtocolError> {
    let request = SenderRequest {
        request: SENDER_REQUEST,
        data: metrics,
        clock,
    };
    let body = serde_json::to_vec(&request)?;
    body_len(body.len())?;
    Ok(body)
}

/// Wrap `body` in a `ZBXD` frame.
pub fn encode_frame(body: &[u8]) -> Result<Vec<u8>, ProtocolError> {
    let len = body_len(body.len())?;
    let mut frame = Vec::with_capacity(HEADER_LEN + body.len());
    frame.extend_from_slice(MAGIC);
    frame.push(FLAG_PROTOCOL);
    frame.extend_from_slice(&len.to_le_bytes());
    frame.extend_from_slice(&0u32.to_le_bytes());
    frame.extend_from_slice(body);
    Ok(frame)
}

/// Length field for a body of `len` bytes, bounded by [`MAX_BODY_LEN`].
fn body_len(len: usize) -> Result<u32, ProtocolError> {
    u32::try_from(len)
        .ok()
        .filter(|&n| n <= MAX_BODY_LEN)
        .ok_or(ProtocolError::PayloadTooLarge(len))
}

/// Validate a frame header and return the body length it announces.
pub fn decode_header(header: &[u8; HEADER_LEN]) -> Result<u32, ProtocolError> {
    if &header[..4] != MAGIC {
        return Err(ProtocolError::InvalidHeader);
    }

    let flags = header[4];
    if flags & FLAG_PROTOCOL == 0 || flags & (FLAG_COMPRESSED | FLAG_LARGE) != 0 {
        return Err(ProtocolError::UnsupportedFlags(flags));
    }

    let len = u32::from_le_bytes([header[5], header[6], header[7], header[8]]);
    if len > MAX_BODY_LEN {
        return Err(ProtocolError::PayloadTooLarge(len as usize));
    }
    Ok(len)
}

/// Read one frame from `reader` and return its body.
///
/// The outer `Result` carries I/O failures, the inner one protocol failures.
pub async fn read_frame<R>(reader: &mut R) -> std::io::Result<Result<Vec<u8>, ProtocolError>>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; HEADER_LEN];
    reader.read_exact(&mut header).await?;

    let len = match decode_header(&header) {
        Ok(len) => len,
        Err(e) => return Ok(Err(e)),
    };

    let mut body = vec![0u8; len as usize];
    reader.read_exact(&mut body).await?;
    Ok(Ok(body))
}

/// Backend answer to a sender request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderResponse {
    /// `"success"` or `"failed"`.
    pub response: String,
    /// Processing summary, e.g. `processed: 3; failed: 0; total: 3; seconds spent: 0.000055`.
    #[serde(default)]
    pub info: Option<String>,
}

impl SenderResponse {
    /// Decode a response body.
    pub fn decode(body: &[u8]) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_slice(body)?)
    }

    pub fn is_success(&self) -> bool {
        self.response == RESPONSE_SUCCESS
    }

    /// Parse the counters out of `info`, if present and well-formed.
    pub fn summary(&self) -> Option<SenderSummary> {
        self.info.as_deref().and_then(SenderSummary::parse)
    }
}

impl std::fmt::Display for SenderResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.info {
            Some(info) => write!(f, "{}: {}", self.response, info),
            None => write!(f, "{}", self.response),
        }
    }
}

/// Counters reported in a sender response's `info` field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SenderSummary {
    pub processed: u64,
    pub failed: u64,
    pub total: u64,
    pub seconds_spent: f64,
}

impl SenderSummary {
    /// Parse `processed: N; failed: N; total: N; seconds spent: F`.
    pub fn parse(info: &str) -> Option<Self> {
        let mut processed = None;
        let mut failed = None;
        let mut total = None;
        let mut seconds_spent = None;

        for part in info.split(';') {
            let (name, value) = part.split_once(':')?;
            let value = value.trim();
            match name.trim() {
                "processed" => processed = value.parse().ok(),
                "failed" => failed = value.parse().ok(),
                "total" => total = value.parse().ok(),
                "seconds spent" => seconds_spent = value.parse().ok(),
                _ => {}
            }
        }

        Some(Self {
            processed: processed?,
            failed: failed?,
            total: total?,
            seconds_spent: seconds_spent.unwrap_or_default(),
        })
    }
}
