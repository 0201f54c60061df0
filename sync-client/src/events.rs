//! In-process delivery of unpacked snapshots.
//!
//! Presentation never sees the wire record. It subscribes to [`LocalUpdates`]
//! and receives one [`LocalUpdateEvent`] per snapshot arrival.

use serde::Serialize;
use std::fmt;
use tokio::sync::broadcast;

/// A snapshot ready for display.
#[derive(Clone, PartialEq, Serialize)]
pub struct LocalUpdateEvent {
    /// High in display units.
    pub high_temp: f64,
    /// Low in display units.
    pub low_temp: f64,
    /// Icon image bytes; empty when none was delivered.
    pub icon_bytes: Vec<u8>,
}

impl fmt::Debug for LocalUpdateEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalUpdateEvent")
            .field("high_temp", &self.high_temp)
            .field("low_temp", &self.low_temp)
            .field("icon_bytes", &format!("[{} bytes]", self.icon_bytes.len()))
            .finish()
    }
}

/// Broadcast channel carrying [`LocalUpdateEvent`]s to every subscriber.
#[derive(Debug, Clone)]
pub struct LocalUpdates {
    sender: broadcast::Sender<LocalUpdateEvent>,
}

impl LocalUpdates {
    /// Create a channel buffering `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribe to future events.
    pub fn subscribe(&self) -> broadcast::Receiver<LocalUpdateEvent> {
        self.sender.subscribe()
    }

    /// Publish an event. Returns the number of subscribers reached.
    pub fn publish(&self, event: LocalUpdateEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }
}
