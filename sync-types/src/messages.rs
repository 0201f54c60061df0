//! Sync paths and one-way messages.
//!
//! Paths are the fixed string keys that address a slot on the transport.
//! `/weather` holds the single snapshot record; `/weather-request` carries
//! wake-up messages from the companion.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{NodeId, RequestToken, SyncError};

/// Addressable slots used by the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyncPath {
    /// The shared snapshot record (overwrite-in-place).
    #[serde(rename = "/weather")]
    Weather,
    /// One-way request messages.
    #[serde(rename = "/weather-request")]
    WeatherRequest,
}

impl SyncPath {
    /// The wire string for this path.
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncPath::Weather => "/weather",
            SyncPath::WeatherRequest => "/weather-request",
        }
    }
}

impl fmt::Display for SyncPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncPath {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "/weather" => Ok(SyncPath::Weather),
            "/weather-request" => Ok(SyncPath::WeatherRequest),
            other => Err(SyncError::UnknownPath(other.to_string())),
        }
    }
}

/// A fire-and-forget notification between peers.
///
/// Unordered, with no reply address. The payload is opaque and is never
/// interpreted by the receiver.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncMessage {
    /// Slot the message was sent on.
    pub path: SyncPath,
    /// Opaque payload bytes.
    pub payload: Vec<u8>,
    /// Node that sent the message.
    pub source: NodeId,
}

impl SyncMessage {
    /// Build a weather request carrying a fresh random token.
    pub fn weather_request(source: NodeId) -> Self {
        Self {
            path: SyncPath::WeatherRequest,
            payload: RequestToken::random().as_bytes().to_vec(),
            source,
        }
    }
}

impl fmt::Debug for SyncMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncMessage")
            .field("path", &self.path)
            .field("payload", &format!("[{} bytes]", self.payload.len()))
            .field("source", &self.source)
            .finish()
    }
}
