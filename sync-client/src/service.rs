//! Inbound event loop.
//!
//! Drains a node's transport event stream and routes each event to the
//! handler for its kind. Data changes are handled inline, one at a time, so
//! update events reach presentation in arrival order.

use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

use crate::listener::{RequestListener, SyncListener};
use crate::transport::{Transport, TransportEvent};

/// Routes transport events to the listeners a node runs.
pub struct ListenerService<T: Transport> {
    sync: Option<Arc<SyncListener<T>>>,
    requests: Option<Arc<RequestListener<T>>>,
}

impl<T: Transport> Default for ListenerService<T> {
    fn default() -> Self {
        Self {
            sync: None,
            requests: None,
        }
    }
}

impl<T: Transport> ListenerService<T> {
    /// A service with no handlers; every event is dropped.
    pub fn new() -> Self {
        Self::default()
    }

    /// Route data changes to `listener`.
    pub fn with_sync_listener(mut self, listener: Arc<SyncListener<T>>) -> Self {
        self.sync = Some(listener);
        self
    }

    /// Route messages to `listener`.
    pub fn with_request_listener(mut self, listener: Arc<RequestListener<T>>) -> Self {
        self.requests = Some(listener);
        self
    }

    /// Handle one event.
    pub async fn route(&self, event: TransportEvent) {
        match event {
            TransportEvent::DataChanged(change) => {
                let Some(listener) = &self.sync else {
                    tracing::trace!(path = %change.item.path, "no sync listener, dropping change");
                    return;
                };
                if let Err(e) = listener.on_data_changed(&change).await {
                    tracing::warn!(
                        uri = %change.item.uri(),
                        error = %e,
                        "failed to handle data change"
                    );
                }
            }
            TransportEvent::MessageReceived(message) => match &self.requests {
                Some(listener) => {
                    listener.on_message(&message);
                }
                None => tracing::debug!(
                    path = %message.path,
                    source = %message.source,
                    "unhandled message"
                ),
            },
        }
    }

    /// Run the loop on a background task until the stream closes.
    pub fn spawn(self, mut events: broadcast::Receiver<TransportEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => self.route(event).await,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "listener service lagged, events dropped");
                    }
                    Err(RecvError::Closed) => {
                        tracing::debug!("transport event stream closed");
                        break;
                    }
                }
            }
        })
    }
}
