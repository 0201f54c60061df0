//! Data items - the transport's addressable, overwrite-in-place records.
//!
//! A writer submits a [`PutDataRequest`]; the transport stores it under its
//! path, replacing whatever was there, and notifies other nodes with a
//! [`DataEvent`]. Binary attachments travel as [`Asset`]s and are referenced
//! from the record payload by [`AssetRef`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{AssetRef, NodeId, SyncPath};

/// A binary attachment uploaded alongside a record.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// Content reference the record uses to point at this attachment.
    pub reference: AssetRef,
    /// Attachment bytes.
    pub data: Vec<u8>,
}

impl Asset {
    /// Wrap bytes as an asset, computing its reference.
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self {
            reference: AssetRef::for_bytes(&data),
            data,
        }
    }
}

impl fmt::Debug for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Asset")
            .field("reference", &self.reference)
            .field("data", &format!("[{} bytes]", self.data.len()))
            .finish()
    }
}

/// A write to a fixed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutDataRequest {
    /// Slot to write.
    pub path: SyncPath,
    /// Encoded record (MessagePack map).
    pub payload: Vec<u8>,
    /// Attachments referenced by the payload.
    pub assets: Vec<Asset>,
    /// Ask the transport to propagate faster than default.
    pub urgent: bool,
}

impl PutDataRequest {
    /// Create a non-urgent request with no attachments.
    pub fn new(path: SyncPath, payload: Vec<u8>) -> Self {
        Self {
            path,
            payload,
            assets: Vec::new(),
            urgent: false,
        }
    }

    /// Attach an asset.
    pub fn with_asset(mut self, asset: Asset) -> Self {
        self.assets.push(asset);
        self
    }

    /// Mark the write as urgent.
    pub fn set_urgent(mut self) -> Self {
        self.urgent = true;
        self
    }
}

/// A stored record as observed by readers.
#[derive(Clone, PartialEq, Eq)]
pub struct DataItem {
    /// Slot the record lives at.
    pub path: SyncPath,
    /// Node that wrote the record.
    pub source: NodeId,
    /// Encoded record (MessagePack map).
    pub payload: Vec<u8>,
}

impl DataItem {
    /// Transport URI of this record, `wear://<node><path>`.
    pub fn uri(&self) -> String {
        format!("wear://{}{}", self.source, self.path)
    }
}

impl fmt::Debug for DataItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataItem")
            .field("path", &self.path)
            .field("source", &self.source)
            .field("payload", &format!("[{} bytes]", self.payload.len()))
            .finish()
    }
}

/// Kind of change reported for a data item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataEventKind {
    /// The record was written.
    Changed,
    /// The record was removed.
    Deleted,
}

/// Change notification for a data item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataEvent {
    /// What happened.
    pub kind: DataEventKind,
    /// The affected record.
    pub item: DataItem,
}

impl DataEvent {
    /// A `Changed` event for the given item.
    pub fn changed(item: DataItem) -> Self {
        Self {
            kind: DataEventKind::Changed,
            item,
        }
    }

    /// A `Deleted` event for the given item.
    pub fn deleted(item: DataItem) -> Self {
        Self {
            kind: DataEventKind::Deleted,
            item,
        }
    }
}
