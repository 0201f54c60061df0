//! Request fan-out.
//!
//! [`RequestDispatcher::dispatch`] discovers every reachable weather-serving
//! peer and sends each one a request on `/weather-request`. Sends run as
//! independent tasks; each logs its own outcome and none can cancel another.
//! There is no retry and no wait for a reply.
//!
//! `dispatch` returns as soon as the sends are issued. The session stays open
//! on a background task until every send settles, each bounded by the session
//! timeout, and is then released.

use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use wearsync_types::{NodeId, PeerNode, SyncMessage};

use crate::discovery::CapabilityDiscovery;
use crate::scope::{ConnectionError, ConnectionScope};
use crate::transport::{Session, Transport, TransportError};
use crate::SyncConfig;

/// Result of sending a request to one peer.
#[derive(Debug)]
pub struct SendOutcome {
    /// The target peer.
    pub peer: PeerNode,
    /// Transport verdict for this send.
    pub result: Result<(), TransportError>,
}

/// The sends issued by one dispatch.
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// Peers a request was issued to.
    pub peers: Vec<PeerNode>,
    settled: Option<JoinHandle<Vec<SendOutcome>>>,
}

impl DispatchReport {
    /// Number of sends issued.
    pub fn issued(&self) -> usize {
        self.peers.len()
    }

    /// Wait until every send has settled and the session is released.
    ///
    /// Dropping the report instead leaves the sends running.
    pub async fn settle(self) -> Vec<SendOutcome> {
        let Some(settled) = self.settled else {
            return Vec::new();
        };
        match settled.await {
            Ok(outcomes) => outcomes,
            Err(e) => {
                tracing::warn!(error = %e, "request settle task aborted");
                Vec::new()
            }
        }
    }
}

/// Sends weather requests to every discovered peer.
pub struct RequestDispatcher<T: Transport> {
    scope: ConnectionScope<T>,
    discovery: CapabilityDiscovery,
}

impl<T: Transport> RequestDispatcher<T> {
    /// Create a dispatcher over a shared transport.
    pub fn new(transport: Arc<T>, config: &SyncConfig) -> Self {
        Self {
            scope: ConnectionScope::new(transport, config.connect_timeout),
            discovery: CapabilityDiscovery::new(&config.capability, config.discovery_timeout),
        }
    }

    /// Discover peers and send each one a request.
    ///
    /// Returns once every send is issued, not once they complete. An empty
    /// peer set is not an error; it yields an empty report.
    pub async fn dispatch(&self) -> Result<DispatchReport, ConnectionError> {
        let scope = self.scope.clone();
        let discovery = self.discovery.clone();
        let local = scope.transport().local_node();
        let send_timeout = scope.timeout();
        let (issued_tx, issued_rx) = oneshot::channel();

        let settled = tokio::spawn(async move {
            let mut issued_tx = Some(issued_tx);
            let result = scope
                .with_connection(|session| {
                    let issued_tx = &mut issued_tx;
                    async move {
                        let peers: Vec<PeerNode> =
                            discovery.discover(&session).await.into_iter().collect();
                        if peers.is_empty() {
                            tracing::debug!(
                                capability = %discovery.capability(),
                                "no reachable peers to request weather from"
                            );
                        } else {
                            tracing::info!(peers = peers.len(), "requesting weather info");
                        }

                        let sends: Vec<_> = peers
                            .iter()
                            .cloned()
                            .map(|peer| {
                                let send = send_request(
                                    session.clone(),
                                    local.clone(),
                                    peer,
                                    send_timeout,
                                );
                                tokio::spawn(send)
                            })
                            .collect();
                        if let Some(tx) = issued_tx.take() {
                            let _ = tx.send(Ok(peers));
                        }

                        let mut outcomes = Vec::with_capacity(sends.len());
                        for joined in join_all(sends).await {
                            match joined {
                                Ok(outcome) => outcomes.push(outcome),
                                Err(e) => tracing::warn!(error = %e, "request send task aborted"),
                            }
                        }
                        Ok::<_, ConnectionError>(outcomes)
                    }
                })
                .await;

            match result {
                Ok(outcomes) => outcomes,
                Err(e) => {
                    if let Some(tx) = issued_tx.take() {
                        let _ = tx.send(Err(e));
                    }
                    Vec::new()
                }
            }
        });

        match issued_rx.await {
            Ok(Ok(peers)) => Ok(DispatchReport {
                peers,
                settled: Some(settled),
            }),
            Ok(Err(e)) => Err(e),
            // The task ended without issuing anything
            Err(_) => match settled.await {
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                _ => Ok(DispatchReport::default()),
            },
        }
    }
}

async fn send_request<S: Session>(
    session: S,
    local: NodeId,
    peer: PeerNode,
    bound: Duration,
) -> SendOutcome {
    // Fresh opaque token per send
    let message = SyncMessage::weather_request(local);
    tracing::debug!(peer = %peer.id, "sending message");

    let result = match tokio::time::timeout(bound, session.send_message(&peer.id, &message)).await
    {
        Ok(result) => result,
        Err(_) => Err(TransportError::SendFailed(format!(
            "no completion within {:?}",
            bound
        ))),
    };
    match &result {
        Ok(()) => tracing::debug!(peer = %peer.id, "message is delivered"),
        Err(e) => tracing::debug!(peer = %peer.id, error = %e, "failed to deliver a message"),
    }
    SendOutcome { peer, result }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{MockNetwork, MockTransport};
    use std::collections::HashSet;
    use std::time::Duration;
    use wearsync_types::{SyncPath, REQUEST_TOKEN_LEN};

    fn companion_with_peers(peers: &[&str]) -> (MockNetwork, RequestDispatcher<MockTransport>) {
        let network = MockNetwork::new();
        let watch = network.add_node("watch", "Watch");
        for id in peers {
            network.add_node(id, id);
            network.advertise(id, "sunshine_weather");
        }
        let dispatcher = RequestDispatcher::new(Arc::new(watch), &SyncConfig::default());
        (network, dispatcher)
    }

    // ===========================================
    // Fan-out Tests
    // ===========================================

    #[tokio::test]
    async fn sends_one_request_per_peer() {
        let (network, dispatcher) = companion_with_peers(&["phone", "tablet", "laptop"]);

        let report = dispatcher.dispatch().await.unwrap();
        assert_eq!(report.issued(), 3);
        let outcomes = report.settle().await;

        assert!(outcomes.iter().all(|o| o.result.is_ok()));
        let sent = network.sent_messages();
        assert_eq!(sent.len(), 3);
        let targets: HashSet<&str> = sent.iter().map(|s| s.to.as_str()).collect();
        assert_eq!(targets, HashSet::from(["phone", "tablet", "laptop"]));
        for s in &sent {
            assert_eq!(s.message.path, SyncPath::WeatherRequest);
            assert_eq!(s.message.payload.len(), REQUEST_TOKEN_LEN);
            assert_eq!(s.from.as_str(), "watch");
        }
    }

    #[tokio::test]
    async fn failed_sends_do_not_block_others() {
        let (network, dispatcher) = companion_with_peers(&["phone", "tablet", "laptop", "tv"]);
        network.reject_messages_to("tablet");
        network.reject_messages_to("tv");

        let report = dispatcher.dispatch().await.unwrap();
        assert_eq!(report.issued(), 4);
        let outcomes = report.settle().await;

        let failed: HashSet<&str> = outcomes
            .iter()
            .filter(|o| o.result.is_err())
            .map(|o| o.peer.id.as_str())
            .collect();
        assert_eq!(failed, HashSet::from(["tablet", "tv"]));
        let sent = network.sent_messages();
        let delivered: HashSet<&str> = sent.iter().map(|s| s.to.as_str()).collect();
        assert_eq!(delivered, HashSet::from(["phone", "laptop"]));
    }

    #[tokio::test]
    async fn each_send_carries_its_own_token() {
        let (network, dispatcher) = companion_with_peers(&["phone", "tablet"]);
        dispatcher.dispatch().await.unwrap().settle().await;

        let sent = network.sent_messages();
        assert_ne!(sent[0].message.payload, sent[1].message.payload);
    }

    #[tokio::test]
    async fn no_peers_is_an_empty_report() {
        let (network, dispatcher) = companion_with_peers(&[]);

        let report = dispatcher.dispatch().await.unwrap();
        assert_eq!(report.issued(), 0);
        assert!(report.settle().await.is_empty());

        assert!(network.sent_messages().is_empty());
        assert_eq!(network.sessions_released("watch"), 1);
    }

    #[tokio::test]
    async fn session_released_after_sends_settle() {
        let (network, dispatcher) = companion_with_peers(&["phone", "tablet"]);
        dispatcher.dispatch().await.unwrap().settle().await;

        assert_eq!(network.sessions_opened("watch"), 1);
        assert_eq!(network.sessions_released("watch"), 1);
    }

    // ===========================================
    // Completion Tests
    // ===========================================

    #[tokio::test(start_paused = true)]
    async fn returns_once_sends_are_issued() {
        let (network, dispatcher) = companion_with_peers(&["phone", "tablet"]);
        network.stall_messages_to("tablet");

        let report = tokio::time::timeout(Duration::from_secs(1), dispatcher.dispatch())
            .await
            .expect("dispatch waited on a send")
            .unwrap();
        assert_eq!(report.issued(), 2);
        assert_eq!(network.sessions_released("watch"), 0);

        // The stalled send gives up after the session timeout
        let outcomes = report.settle().await;
        for outcome in &outcomes {
            match outcome.peer.id.as_str() {
                "tablet" => assert!(matches!(outcome.result, Err(TransportError::SendFailed(_)))),
                _ => assert!(outcome.result.is_ok()),
            }
        }
        assert_eq!(outcomes.len(), 2);
        assert_eq!(network.sessions_released("watch"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn connect_timeout_sends_nothing() {
        let (network, dispatcher) = companion_with_peers(&["phone"]);
        network.stall_connect("watch");

        let result = dispatcher.dispatch().await;

        assert!(matches!(result, Err(ConnectionError::Timeout { .. })));
        assert!(network.sent_messages().is_empty());
    }

    #[tokio::test]
    async fn refused_session_is_an_error() {
        let (network, dispatcher) = companion_with_peers(&["phone"]);
        network.fail_next_connect("watch", "radio off");

        let result = dispatcher.dispatch().await;

        assert!(matches!(result, Err(ConnectionError::Failed(_))));
        assert!(network.sent_messages().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn discovery_timeout_sends_nothing() {
        let config = SyncConfig::default().with_discovery_timeout(Duration::from_secs(5));
        let network = MockNetwork::new();
        let watch = network.add_node("watch", "Watch");
        network.add_node("phone", "Phone");
        network.advertise("phone", "sunshine_weather");
        network.stall_lookup("watch");
        let dispatcher = RequestDispatcher::new(Arc::new(watch), &config);

        let report = dispatcher.dispatch().await.unwrap();
        assert_eq!(report.issued(), 0);
    }
}
