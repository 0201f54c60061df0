//! Role-level wiring.
//!
//! A [`SyncNode`] bundles the components one device runs:
//!
//! - **primary**: owns the weather source, advertises the capability and
//!   answers requests by publishing
//! - **companion**: listens for snapshots and exposes local update events
//!
//! Both roles can publish or request on demand. A companion asks for fresh
//! weather with [`SyncNode::request_weather`] once its consumers have
//! subscribed, so the reply cannot outrun them.

use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::dispatcher::{DispatchReport, RequestDispatcher};
use crate::error::ClientError;
use crate::events::{LocalUpdateEvent, LocalUpdates};
use crate::listener::{RequestListener, SyncListener};
use crate::publisher::{PublishOutcome, SnapshotPublisher};
use crate::service::ListenerService;
use crate::source::{IconResolver, WeatherSource};
use crate::transport::Transport;
use crate::SyncConfig;

/// Which side of the mirror a node plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
    /// Owns the weather data and publishes it.
    Primary,
    /// Mirrors the weather data for display.
    Companion,
}

/// A running wearsync node.
pub struct SyncNode<T: Transport> {
    role: NodeRole,
    transport: Arc<T>,
    dispatcher: Arc<RequestDispatcher<T>>,
    publisher: Option<Arc<SnapshotPublisher<T>>>,
    updates: LocalUpdates,
    service: JoinHandle<()>,
}

impl<T: Transport> SyncNode<T> {
    /// Start a primary node.
    ///
    /// Advertises the configured capability and begins answering requests.
    pub async fn start_primary(
        transport: T,
        config: SyncConfig,
        source: Arc<dyn WeatherSource>,
        icons: Arc<dyn IconResolver>,
    ) -> Result<Self, ClientError> {
        let transport = Arc::new(transport);
        transport.advertise(&config.capability).await?;

        let publisher = Arc::new(SnapshotPublisher::new(
            Arc::clone(&transport),
            &config,
            source,
            icons,
        ));
        let service = ListenerService::new()
            .with_request_listener(Arc::new(RequestListener::new(Arc::clone(&publisher))))
            .spawn(transport.subscribe());

        tracing::info!(
            node = %transport.local_node(),
            capability = %config.capability,
            "primary node started"
        );
        Ok(Self {
            role: NodeRole::Primary,
            dispatcher: Arc::new(RequestDispatcher::new(Arc::clone(&transport), &config)),
            transport,
            publisher: Some(publisher),
            updates: LocalUpdates::new(config.update_capacity),
            service,
        })
    }

    /// Start a companion node.
    ///
    /// Begins listening for snapshots. Subscribe to updates, then call
    /// [`SyncNode::request_weather`] for the start-up request.
    pub async fn start_companion(transport: T, config: SyncConfig) -> Result<Self, ClientError> {
        let transport = Arc::new(transport);
        let updates = LocalUpdates::new(config.update_capacity);

        let listener = SyncListener::new(Arc::clone(&transport), &config, updates.clone());
        let service = ListenerService::new()
            .with_sync_listener(Arc::new(listener))
            .spawn(transport.subscribe());

        tracing::info!(node = %transport.local_node(), "companion node started");
        Ok(Self {
            role: NodeRole::Companion,
            dispatcher: Arc::new(RequestDispatcher::new(Arc::clone(&transport), &config)),
            transport,
            publisher: None,
            updates,
            service,
        })
    }

    /// This node's role.
    pub fn role(&self) -> NodeRole {
        self.role
    }

    /// The shared transport.
    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Subscribe to delivered weather updates.
    pub fn subscribe_updates(&self) -> broadcast::Receiver<LocalUpdateEvent> {
        self.updates.subscribe()
    }

    /// Ask every reachable weather-serving peer for a snapshot.
    ///
    /// Runs in the background; failures are logged. The handle resolves once
    /// the sends are issued; settle the report to learn how they went.
    pub fn request_weather(&self) -> JoinHandle<Option<DispatchReport>> {
        let dispatcher = Arc::clone(&self.dispatcher);
        tokio::spawn(async move {
            match dispatcher.dispatch().await {
                Ok(report) => {
                    tracing::debug!(issued = report.issued(), "weather request dispatched");
                    Some(report)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to request weather");
                    None
                }
            }
        })
    }

    /// Publish the current weather now. Primary nodes only.
    pub async fn publish_now(&self) -> Result<Option<PublishOutcome>, ClientError> {
        match &self.publisher {
            Some(publisher) => publisher.publish().await.map(Some),
            None => Ok(None),
        }
    }

    /// Stop routing inbound events.
    pub fn shutdown(self) {
        self.service.abort();
        tracing::info!(node = %self.transport.local_node(), "node stopped");
    }
}
