//! # sync-client
//!
//! The wearsync protocol: keeps one weather summary mirrored between a
//! primary device and a companion device over a peer-messaging transport.
//!
//! ## Components
//!
//! - [`ConnectionScope`]: bounded-timeout session, always released
//! - [`CapabilityDiscovery`]: reachable peers serving a capability
//! - [`RequestDispatcher`]: fans a weather request out to every peer
//! - [`SnapshotPublisher`]: writes today's weather to the shared record
//! - [`SyncListener`] / [`RequestListener`]: inbound handlers
//! - [`ListenerService`]: routes the transport's event stream
//! - [`SyncNode`]: role-level wiring of all of the above
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use wearsync_client::{MemoryIcons, MemoryWeatherSource, MockNetwork, SyncConfig, SyncNode};
//!
//! let network = MockNetwork::new();
//! let source = Arc::new(MemoryWeatherSource::new("Mountain View"));
//! let _phone = SyncNode::start_primary(
//!     network.add_node("phone", "Phone"),
//!     SyncConfig::default(),
//!     source,
//!     Arc::new(MemoryIcons::placeholder()),
//! )
//! .await?;
//!
//! let watch =
//!     SyncNode::start_companion(network.add_node("watch", "Watch"), SyncConfig::default()).await?;
//! let mut updates = watch.subscribe_updates();
//! watch.request_weather();
//! let update = updates.recv().await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod discovery;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod listener;
pub mod node;
pub mod publisher;
pub mod scope;
pub mod service;
pub mod source;
pub mod transport;

pub use config::SyncConfig;
pub use discovery::CapabilityDiscovery;
pub use dispatcher::{DispatchReport, RequestDispatcher, SendOutcome};
pub use error::ClientError;
pub use events::{LocalUpdateEvent, LocalUpdates};
pub use listener::{RequestListener, SyncListener};
pub use node::{NodeRole, SyncNode};
pub use publisher::{PublishOutcome, SnapshotPublisher};
pub use scope::{ConnectionError, ConnectionScope};
pub use service::ListenerService;
pub use source::{
    IconResolver, MemoryIcons, MemoryWeatherSource, SourceError, WeatherRecord, WeatherSource,
};
pub use transport::{
    MockNetwork, MockSession, MockTransport, SentMessage, Session, Transport, TransportError,
    TransportEvent,
};
