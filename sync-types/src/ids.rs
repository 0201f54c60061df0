//! Identity and reference types for wearsync.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Opaque identifier of a node on the peer-messaging transport.
///
/// The transport assigns these; wearsync never parses them.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(String);

impl NodeId {
    /// Wrap a transport-assigned node identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A peer returned by a capability lookup.
///
/// Ephemeral: produced fresh by every discovery call and never persisted.
/// Reachability is implied by its presence in a lookup result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerNode {
    /// Transport node identifier.
    pub id: NodeId,
    /// Human-readable name reported by the transport.
    pub display_name: String,
    /// Transport hint that the node is directly connected.
    pub nearby: bool,
}

impl PeerNode {
    /// Create a peer entry.
    pub fn new(id: NodeId, display_name: impl Into<String>, nearby: bool) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            nearby,
        }
    }
}

/// Content reference for a binary attachment carried beside a record.
///
/// SHA-256 of the attachment bytes, displayed as URL-safe base64.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetRef([u8; 32]);

impl AssetRef {
    /// Compute the reference for the given attachment bytes.
    pub fn for_bytes(data: &[u8]) -> Self {
        let digest = Sha256::digest(data);
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    /// Create an AssetRef from raw digest bytes.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() == 32 {
            let mut arr = [0u8; 32];
            arr.copy_from_slice(bytes);
            Some(Self(arr))
        } else {
            None
        }
    }

    /// Get the raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", URL_SAFE_NO_PAD.encode(self.0))
    }
}

impl fmt::Debug for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetRef({})", &self.to_string()[..8])
    }
}

/// Length of the opaque request payload.
pub const REQUEST_TOKEN_LEN: usize = 10;

/// Opaque payload carried by a weather request.
///
/// Generated fresh for every send. Receivers never inspect it.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestToken([u8; REQUEST_TOKEN_LEN]);

impl RequestToken {
    /// Create a new random token.
    pub fn random() -> Self {
        Self(rand::random())
    }

    /// Get the raw token bytes.
    pub fn as_bytes(&self) -> &[u8; REQUEST_TOKEN_LEN] {
        &self.0
    }
}

impl fmt::Debug for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RequestToken({})", hex::encode(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_display_is_raw() {
        let id = NodeId::new("a1b2c3");
        assert_eq!(id.to_string(), "a1b2c3");
        assert_eq!(format!("{:?}", id), "NodeId(a1b2c3)");
    }

    #[test]
    fn asset_ref_is_content_addressed() {
        let a = AssetRef::for_bytes(b"PNGDATA");
        let b = AssetRef::for_bytes(b"PNGDATA");
        let c = AssetRef::for_bytes(b"OTHER");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn asset_ref_from_bytes_checks_length() {
        let r = AssetRef::for_bytes(b"x");
        assert_eq!(AssetRef::from_bytes(r.as_bytes()), Some(r));
        assert!(AssetRef::from_bytes(&[0u8; 31]).is_none());
    }

    #[test]
    fn asset_ref_debug_is_truncated() {
        let r = AssetRef::for_bytes(b"x");
        let debug = format!("{:?}", r);
        assert!(debug.starts_with("AssetRef("));
        assert_eq!(debug.len(), "AssetRef()".len() + 8);
    }

    #[test]
    fn request_tokens_are_random() {
        let a = RequestToken::random();
        let b = RequestToken::random();
        assert_eq!(a.as_bytes().len(), REQUEST_TOKEN_LEN);
        // 80 bits of randomness; a collision here means the generator is broken
        assert_ne!(a, b);
    }

    #[test]
    fn peer_nodes_dedupe_in_sets() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(PeerNode::new("n1".into(), "Phone", true));
        set.insert(PeerNode::new("n1".into(), "Phone", true));
        set.insert(PeerNode::new("n2".into(), "Tablet", false));
        assert_eq!(set.len(), 2);
    }
}
