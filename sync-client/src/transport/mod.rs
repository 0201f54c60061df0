//! Transport abstraction for wearsync.
//!
//! This module abstracts the third-party peer-messaging transport that links
//! the primary device and its companion (in-memory mesh for testing).
//!
//! # Design
//!
//! The transport is session-oriented:
//! - `connect()` acquires a [`Session`]; every operation acquires its own
//! - the session offers capability lookup, one-way messages, overwrite-in-place
//!   data items and attachment fetches
//! - `disconnect()` releases it
//! - `subscribe()` yields inbound [`TransportEvent`]s independently of any session
//!
//! # Example
//!
//! ```ignore
//! let network = MockNetwork::new();
//! let transport = network.add_node("watch", "Watch");
//! let session = transport.connect().await?;
//! let peers = session.reachable_nodes("sunshine_weather", true).await?;
//! session.disconnect().await?;
//! ```

mod mock;

pub use mock::{MockNetwork, MockSession, MockTransport, SentMessage};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::broadcast;
use wearsync_types::{
    AssetRef, DataEvent, DataItem, NodeId, PeerNode, PutDataRequest, SyncMessage, SyncPath,
};

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Session already released.
    #[error("not connected")]
    NotConnected,

    /// Message send failed.
    #[error("send failed: {0}")]
    SendFailed(String),
}

/// Inbound notifications delivered to a node.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// A data item was written or removed by another node.
    DataChanged(DataEvent),
    /// A one-way message arrived.
    MessageReceived(SyncMessage),
}

/// Transport trait for the peer-messaging layer.
///
/// Implementations handle the underlying link (vendor data layer, in-memory
/// mesh, etc).
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Session handle produced by [`Transport::connect`].
    type Session: Session;

    /// Identifier of the local node.
    fn local_node(&self) -> NodeId;

    /// Open a session. May never complete; callers bound it with a timeout.
    async fn connect(&self) -> Result<Self::Session, TransportError>;

    /// Declare that the local node serves the named capability.
    async fn advertise(&self, capability: &str) -> Result<(), TransportError>;

    /// Subscribe to inbound data changes and messages for the local node.
    fn subscribe(&self) -> broadcast::Receiver<TransportEvent>;
}

/// An acquired transport session.
///
/// Cheap to clone; clones share the same underlying session so concurrent
/// sends can each hold one.
#[async_trait]
pub trait Session: Clone + Send + Sync + 'static {
    /// Nodes advertising `capability`, optionally filtered to reachable ones.
    async fn reachable_nodes(
        &self,
        capability: &str,
        only_reachable: bool,
    ) -> Result<Vec<PeerNode>, TransportError>;

    /// Send a one-way message to a node.
    async fn send_message(&self, to: &NodeId, message: &SyncMessage)
        -> Result<(), TransportError>;

    /// Write a data item, replacing any prior value at the same path.
    async fn put_data_item(&self, request: PutDataRequest) -> Result<DataItem, TransportError>;

    /// Read the current data item at a path.
    async fn get_data_item(&self, path: SyncPath) -> Result<Option<DataItem>, TransportError>;

    /// Resolve an attachment reference. `Ok(None)` for unknown references.
    async fn fetch_asset(&self, asset: &AssetRef) -> Result<Option<Vec<u8>>, TransportError>;

    /// Release the session.
    async fn disconnect(&self) -> Result<(), TransportError>;
}
