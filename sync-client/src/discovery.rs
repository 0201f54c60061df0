//! Capability-based peer discovery.
//!
//! Resolves the peers currently advertising a named capability. There is no
//! ranking or nearest-node selection: every peer returned is a target.

use std::collections::HashSet;
use std::time::Duration;
use wearsync_types::PeerNode;

use crate::transport::Session;

/// Looks up peers serving a capability.
#[derive(Debug, Clone)]
pub struct CapabilityDiscovery {
    capability: String,
    only_reachable: bool,
    timeout: Duration,
}

impl CapabilityDiscovery {
    /// Discover reachable holders of `capability`, waiting at most `timeout`.
    pub fn new(capability: &str, timeout: Duration) -> Self {
        Self {
            capability: capability.to_string(),
            only_reachable: true,
            timeout,
        }
    }

    /// Also return holders the transport reports as unreachable.
    pub fn include_unreachable(mut self) -> Self {
        self.only_reachable = false;
        self
    }

    /// The capability this discovery looks for.
    pub fn capability(&self) -> &str {
        &self.capability
    }

    /// Resolve the current peer set.
    ///
    /// A timed-out or failed lookup yields the empty set, the same as a
    /// capability nobody holds.
    pub async fn discover<S: Session>(&self, session: &S) -> HashSet<PeerNode> {
        let lookup = session.reachable_nodes(&self.capability, self.only_reachable);

        match tokio::time::timeout(self.timeout, lookup).await {
            Ok(Ok(peers)) => {
                let peers: HashSet<PeerNode> = peers.into_iter().collect();
                tracing::debug!(
                    capability = %self.capability,
                    count = peers.len(),
                    "capability lookup complete"
                );
                peers
            }
            Ok(Err(e)) => {
                tracing::debug!(
                    capability = %self.capability,
                    error = %e,
                    "failed to get capabilities"
                );
                HashSet::new()
            }
            Err(_) => {
                tracing::debug!(
                    capability = %self.capability,
                    timeout = ?self.timeout,
                    "capability lookup timed out"
                );
                HashSet::new()
            }
        }
    }
}
