//! Error types for sync-client.

use thiserror::Error;
use wearsync_types::SyncError;

use crate::scope::ConnectionError;
use crate::source::SourceError;
use crate::transport::TransportError;

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No session could be acquired.
    #[error("connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// Transport error inside a session.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Record encoding or decoding failed.
    #[error("wire error: {0}")]
    Wire(#[from] SyncError),

    /// The local weather source failed.
    #[error("weather source error: {0}")]
    Source(#[from] SourceError),
}
