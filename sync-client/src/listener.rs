//! Inbound handlers.
//!
//! [`SyncListener`] runs on the companion: it unpacks a changed snapshot
//! record, resolves the icon attachment, normalizes units and hands the result
//! to presentation as a [`LocalUpdateEvent`].
//!
//! [`RequestListener`] runs on the primary: any message on `/weather-request`
//! triggers one publish. The message payload is never read and nothing is
//! sent back.

use std::sync::Arc;
use tokio::task::JoinHandle;
use wearsync_core::DisplayTemperatures;
use wearsync_types::{AssetRef, DataEvent, DataEventKind, SnapshotRecord, SyncMessage, SyncPath};

use crate::error::ClientError;
use crate::events::{LocalUpdateEvent, LocalUpdates};
use crate::publisher::{PublishOutcome, SnapshotPublisher};
use crate::scope::ConnectionScope;
use crate::transport::{Session, Transport};
use crate::SyncConfig;

/// Turns snapshot changes into local update events.
pub struct SyncListener<T: Transport> {
    scope: ConnectionScope<T>,
    updates: LocalUpdates,
}

impl<T: Transport> SyncListener<T> {
    /// Create a listener publishing to `updates`.
    pub fn new(transport: Arc<T>, config: &SyncConfig, updates: LocalUpdates) -> Self {
        Self {
            scope: ConnectionScope::new(transport, config.connect_timeout),
            updates,
        }
    }

    /// The channel this listener publishes to.
    pub fn updates(&self) -> &LocalUpdates {
        &self.updates
    }

    /// Handle one data change.
    ///
    /// Returns `Ok(None)` for events this listener ignores (deletions, other
    /// paths). Otherwise returns the event that was published.
    pub async fn on_data_changed(
        &self,
        event: &DataEvent,
    ) -> Result<Option<LocalUpdateEvent>, ClientError> {
        if event.kind != DataEventKind::Changed || event.item.path != SyncPath::Weather {
            tracing::trace!(kind = ?event.kind, path = %event.item.path, "ignoring data event");
            return Ok(None);
        }

        let record = SnapshotRecord::from_bytes(&event.item.payload)?;
        let icon_bytes = match record.icon_asset {
            Some(reference) => {
                self.scope
                    .with_connection(|session| async move {
                        Ok::<_, ClientError>(fetch_icon(&session, &reference).await)
                    })
                    .await?
            }
            None => Vec::new(),
        };

        let temps = DisplayTemperatures::from_record(&record);
        let update = LocalUpdateEvent {
            high_temp: temps.high,
            low_temp: temps.low,
            icon_bytes,
        };

        let receivers = self.updates.publish(update.clone());
        tracing::info!(
            source = %event.item.source,
            high = update.high_temp,
            low = update.low_temp,
            receivers,
            "weather update delivered"
        );
        Ok(Some(update))
    }
}

async fn fetch_icon<S: Session>(session: &S, reference: &AssetRef) -> Vec<u8> {
    match session.fetch_asset(reference).await {
        Ok(Some(bytes)) => bytes,
        Ok(None) => {
            tracing::warn!(asset = %reference, "unknown icon asset");
            Vec::new()
        }
        Err(e) => {
            tracing::warn!(asset = %reference, error = %e, "failed to fetch icon asset");
            Vec::new()
        }
    }
}

/// Publishes a snapshot whenever a weather request arrives.
pub struct RequestListener<T: Transport> {
    publisher: Arc<SnapshotPublisher<T>>,
}

impl<T: Transport> RequestListener<T> {
    /// Create a listener driving `publisher`.
    pub fn new(publisher: Arc<SnapshotPublisher<T>>) -> Self {
        Self { publisher }
    }

    /// Handle one message.
    ///
    /// For a weather request, spawns a publish and returns its handle. The
    /// spawned task only logs failures. Other paths are ignored.
    pub fn on_message(&self, message: &SyncMessage) -> Option<JoinHandle<()>> {
        if message.path != SyncPath::WeatherRequest {
            tracing::debug!(path = %message.path, source = %message.source, "unrecognized message");
            return None;
        }

        tracing::debug!(source = %message.source, "weather requested");
        let publisher = Arc::clone(&self.publisher);
        Some(tokio::spawn(async move {
            match publisher.publish().await {
                Ok(PublishOutcome::Published(_)) => {}
                Ok(PublishOutcome::NoSourceData) => {
                    tracing::debug!("weather request answered with nothing")
                }
                Err(e) => tracing::warn!(error = %e, "failed to publish requested weather"),
            }
        }))
    }
}
