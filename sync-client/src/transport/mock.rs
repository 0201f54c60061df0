//! In-memory transport mesh for testing.
//!
//! A [`MockNetwork`] holds every node, the shared data layer (one record per
//! path) and the attachment store. Each node gets a [`MockTransport`] bound to
//! its id. Writes and messages are delivered to the other nodes' event
//! streams, and every send and write is captured for verification.

use super::{Session, Transport, TransportError, TransportEvent};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use wearsync_types::{
    AssetRef, DataEvent, DataItem, NodeId, PeerNode, PutDataRequest, SyncMessage, SyncPath,
};

/// Per-node event buffer.
const EVENT_CAPACITY: usize = 64;

/// Shared in-memory mesh.
///
/// Clones share state, so a test can keep a handle to inspect and steer the
/// network while nodes use their transports.
#[derive(Debug, Clone, Default)]
pub struct MockNetwork {
    inner: Arc<Mutex<NetworkInner>>,
}

#[derive(Debug, Default)]
struct NetworkInner {
    nodes: HashMap<NodeId, MockNode>,
    data_items: HashMap<SyncPath, DataItem>,
    assets: HashMap<AssetRef, Vec<u8>>,
    item_assets: HashMap<SyncPath, Vec<AssetRef>>,
    sent_messages: Vec<SentMessage>,
    put_requests: Vec<PutDataRequest>,
}

#[derive(Debug)]
struct MockNode {
    display_name: String,
    capabilities: HashSet<String>,
    reachable: bool,
    events: broadcast::Sender<TransportEvent>,
    reject_messages: bool,
    stall_messages: bool,
    stall_connect: bool,
    stall_lookup: bool,
    fail_next_connect: Option<String>,
    sessions_opened: usize,
    sessions_released: usize,
}

impl MockNode {
    fn new(display_name: &str) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            display_name: display_name.to_string(),
            capabilities: HashSet::new(),
            reachable: true,
            events,
            reject_messages: false,
            stall_messages: false,
            stall_connect: false,
            stall_lookup: false,
            fail_next_connect: None,
            sessions_opened: 0,
            sessions_released: 0,
        }
    }
}

/// A message captured by the mesh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    /// Sending node.
    pub from: NodeId,
    /// Target node.
    pub to: NodeId,
    /// The message as sent.
    pub message: SyncMessage,
}

impl MockNetwork {
    /// Create an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node (or reuse an existing one) and return a transport bound to it.
    pub fn add_node(&self, id: &str, display_name: &str) -> MockTransport {
        let node_id = NodeId::new(id);
        let mut inner = self.inner.lock().unwrap();
        let node = inner
            .nodes
            .entry(node_id.clone())
            .or_insert_with(|| MockNode::new(display_name));
        MockTransport {
            network: self.clone(),
            node: node_id,
            events: node.events.clone(),
        }
    }

    /// Declare that a node serves a capability.
    pub fn advertise(&self, id: &str, capability: &str) {
        self.with_node(id, |node| {
            node.capabilities.insert(capability.to_string());
        });
    }

    /// Mark a node reachable or unreachable.
    pub fn set_reachable(&self, id: &str, reachable: bool) {
        self.with_node(id, |node| node.reachable = reachable);
    }

    /// Cause every message sent to this node to fail.
    pub fn reject_messages_to(&self, id: &str) {
        self.with_node(id, |node| node.reject_messages = true);
    }

    /// Cause every message sent to this node to never complete.
    pub fn stall_messages_to(&self, id: &str) {
        self.with_node(id, |node| node.stall_messages = true);
    }

    /// Cause this node's connect() to never complete.
    pub fn stall_connect(&self, id: &str) {
        self.with_node(id, |node| node.stall_connect = true);
    }

    /// Cause capability lookups made by this node to never complete.
    pub fn stall_lookup(&self, id: &str) {
        self.with_node(id, |node| node.stall_lookup = true);
    }

    /// Cause this node's next connect() to fail with the given error.
    pub fn fail_next_connect(&self, id: &str, error: &str) {
        self.with_node(id, |node| node.fail_next_connect = Some(error.to_string()));
    }

    /// Drop every stored attachment, so existing references become unknown.
    pub fn forget_assets(&self) {
        self.inner.lock().unwrap().assets.clear();
    }

    /// Number of stored attachments.
    pub fn asset_count(&self) -> usize {
        self.inner.lock().unwrap().assets.len()
    }

    /// Deliver an event directly to a node's event stream.
    pub fn deliver(&self, id: &str, event: TransportEvent) {
        let inner = self.inner.lock().unwrap();
        if let Some(node) = inner.nodes.get(&NodeId::new(id)) {
            let _ = node.events.send(event);
        }
    }

    /// All messages sent through the mesh, in send order.
    pub fn sent_messages(&self) -> Vec<SentMessage> {
        self.inner.lock().unwrap().sent_messages.clone()
    }

    /// All accepted data item writes, in write order.
    pub fn put_requests(&self) -> Vec<PutDataRequest> {
        self.inner.lock().unwrap().put_requests.clone()
    }

    /// The record currently stored at a path.
    pub fn data_item(&self, path: SyncPath) -> Option<DataItem> {
        self.inner.lock().unwrap().data_items.get(&path).cloned()
    }

    /// Number of sessions a node has opened.
    pub fn sessions_opened(&self, id: &str) -> usize {
        let inner = self.inner.lock().unwrap();
        inner
            .nodes
            .get(&NodeId::new(id))
            .map_or(0, |n| n.sessions_opened)
    }

    /// Number of sessions a node has released.
    pub fn sessions_released(&self, id: &str) -> usize {
        let inner = self.inner.lock().unwrap();
        inner
            .nodes
            .get(&NodeId::new(id))
            .map_or(0, |n| n.sessions_released)
    }

    fn with_node(&self, id: &str, f: impl FnOnce(&mut MockNode)) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(node) = inner.nodes.get_mut(&NodeId::new(id)) {
            f(node);
        }
    }
}

/// Transport bound to one node of a [`MockNetwork`].
#[derive(Debug, Clone)]
pub struct MockTransport {
    network: MockNetwork,
    node: NodeId,
    events: broadcast::Sender<TransportEvent>,
}

impl MockTransport {
    /// The mesh this transport belongs to.
    pub fn network(&self) -> &MockNetwork {
        &self.network
    }
}

enum ConnectDecision {
    Open,
    Fail(String),
    Stall,
}

#[async_trait]
impl Transport for MockTransport {
    type Session = MockSession;

    fn local_node(&self) -> NodeId {
        self.node.clone()
    }

    async fn connect(&self) -> Result<MockSession, TransportError> {
        let decision = {
            let mut inner = self.network.inner.lock().unwrap();
            match inner.nodes.get_mut(&self.node) {
                None => ConnectDecision::Fail("unknown node".to_string()),
                Some(node) => {
                    // Check for forced failure
                    if let Some(error) = node.fail_next_connect.take() {
                        ConnectDecision::Fail(error)
                    } else if node.stall_connect {
                        ConnectDecision::Stall
                    } else {
                        node.sessions_opened += 1;
                        ConnectDecision::Open
                    }
                }
            }
        };

        match decision {
            ConnectDecision::Open => Ok(MockSession {
                network: self.network.clone(),
                node: self.node.clone(),
                open: Arc::new(AtomicBool::new(true)),
            }),
            ConnectDecision::Fail(error) => Err(TransportError::ConnectionFailed(error)),
            ConnectDecision::Stall => std::future::pending().await,
        }
    }

    async fn advertise(&self, capability: &str) -> Result<(), TransportError> {
        self.network.advertise(self.node.as_str(), capability);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<TransportEvent> {
        self.events.subscribe()
    }
}

/// Session on a [`MockTransport`]. Clones share the open/closed flag.
#[derive(Debug, Clone)]
pub struct MockSession {
    network: MockNetwork,
    node: NodeId,
    open: Arc<AtomicBool>,
}

impl MockSession {
    fn ensure_open(&self) -> Result<(), TransportError> {
        if self.open.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(TransportError::NotConnected)
        }
    }

    /// Whether this session is still held.
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Session for MockSession {
    async fn reachable_nodes(
        &self,
        capability: &str,
        only_reachable: bool,
    ) -> Result<Vec<PeerNode>, TransportError> {
        self.ensure_open()?;

        let lookup = {
            let inner = self.network.inner.lock().unwrap();
            let stalled = inner.nodes.get(&self.node).is_some_and(|n| n.stall_lookup);
            if stalled {
                None
            } else {
                let mut peers: Vec<PeerNode> = inner
                    .nodes
                    .iter()
                    .filter(|(id, _)| **id != self.node)
                    .filter(|(_, node)| node.capabilities.contains(capability))
                    .filter(|(_, node)| node.reachable || !only_reachable)
                    .map(|(id, node)| PeerNode::new(id.clone(), &node.display_name, node.reachable))
                    .collect();
                peers.sort_by(|a, b| a.id.cmp(&b.id));
                Some(peers)
            }
        };

        match lookup {
            Some(peers) => Ok(peers),
            None => std::future::pending().await,
        }
    }

    async fn send_message(
        &self,
        to: &NodeId,
        message: &SyncMessage,
    ) -> Result<(), TransportError> {
        self.ensure_open()?;

        let stalled = {
            let mut inner = self.network.inner.lock().unwrap();
            let target = inner
                .nodes
                .get(to)
                .ok_or_else(|| TransportError::SendFailed(format!("unknown node {}", to)))?;

            if !target.reachable {
                return Err(TransportError::SendFailed(format!("node {} unreachable", to)));
            }
            // Check for forced failure
            if target.reject_messages {
                return Err(TransportError::SendFailed(format!("rejected by {}", to)));
            }

            if target.stall_messages {
                true
            } else {
                let _ = target
                    .events
                    .send(TransportEvent::MessageReceived(message.clone()));
                inner.sent_messages.push(SentMessage {
                    from: self.node.clone(),
                    to: to.clone(),
                    message: message.clone(),
                });
                false
            }
        };

        if stalled {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    async fn put_data_item(&self, request: PutDataRequest) -> Result<DataItem, TransportError> {
        self.ensure_open()?;

        let mut inner = self.network.inner.lock().unwrap();
        let item = DataItem {
            path: request.path,
            source: self.node.clone(),
            payload: request.payload.clone(),
        };

        for asset in &request.assets {
            inner
                .assets
                .insert(asset.reference, asset.data.clone());
        }
        let references = request.assets.iter().map(|a| a.reference).collect();
        if let Some(replaced) = inner.item_assets.insert(request.path, references) {
            // Evict attachments no stored item references any more
            for reference in replaced {
                let in_use = inner.item_assets.values().any(|refs| refs.contains(&reference));
                if !in_use {
                    inner.assets.remove(&reference);
                }
            }
        }
        // Fixed key: replaces whatever was stored at this path
        inner.data_items.insert(request.path, item.clone());
        inner.put_requests.push(request);

        for (id, node) in &inner.nodes {
            if *id != self.node && node.reachable {
                let _ = node
                    .events
                    .send(TransportEvent::DataChanged(DataEvent::changed(item.clone())));
            }
        }
        Ok(item)
    }

    async fn get_data_item(&self, path: SyncPath) -> Result<Option<DataItem>, TransportError> {
        self.ensure_open()?;
        Ok(self.network.data_item(path))
    }

    async fn fetch_asset(&self, asset: &AssetRef) -> Result<Option<Vec<u8>>, TransportError> {
        self.ensure_open()?;
        let inner = self.network.inner.lock().unwrap();
        Ok(inner.assets.get(asset).cloned())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        if self.open.swap(false, Ordering::SeqCst) {
            let mut inner = self.network.inner.lock().unwrap();
            if let Some(node) = inner.nodes.get_mut(&self.node) {
                node.sessions_released += 1;
            }
        }
        Ok(())
    }
}
