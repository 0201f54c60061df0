//! Configuration for wearsync nodes.

use std::time::Duration;

/// Capability advertised by nodes that can serve weather data.
pub const DEFAULT_CAPABILITY: &str = "sunshine_weather";

/// Bound on acquiring a transport session.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Bound on a capability lookup.
pub const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Buffered local update events per subscriber.
pub const DEFAULT_UPDATE_CAPACITY: usize = 16;

/// Configuration shared by every component of a node.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Capability name used to find weather-serving peers.
    pub capability: String,
    /// How long a scoped operation waits for a session.
    pub connect_timeout: Duration,
    /// How long discovery waits for the capability lookup.
    pub discovery_timeout: Duration,
    /// Mark snapshot writes urgent.
    pub urgent: bool,
    /// Stamp snapshots with their capture time (diagnostic).
    pub include_capture_time: bool,
    /// Capacity of the local update channel.
    pub update_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            capability: DEFAULT_CAPABILITY.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            discovery_timeout: DEFAULT_DISCOVERY_TIMEOUT,
            urgent: true,
            include_capture_time: cfg!(debug_assertions),
            update_capacity: DEFAULT_UPDATE_CAPACITY,
        }
    }
}

impl SyncConfig {
    /// Set the capability name.
    pub fn with_capability(mut self, capability: &str) -> Self {
        self.capability = capability.to_string();
        self
    }

    /// Set the session timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the capability lookup timeout.
    pub fn with_discovery_timeout(mut self, timeout: Duration) -> Self {
        self.discovery_timeout = timeout;
        self
    }

    /// Enable or disable urgent writes.
    pub fn with_urgent(mut self, urgent: bool) -> Self {
        self.urgent = urgent;
        self
    }

    /// Enable or disable capture timestamps.
    pub fn with_capture_time(mut self, include: bool) -> Self {
        self.include_capture_time = include;
        self
    }

    /// Set the local update channel capacity (minimum 1).
    pub fn with_update_capacity(mut self, capacity: usize) -> Self {
        self.update_capacity = capacity.max(1);
        self
    }
}
