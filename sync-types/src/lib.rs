//! # sync-types
//!
//! Wire format types for the wearsync weather mirroring protocol.
//!
//! This crate provides the foundational types shared by every wearsync crate:
//! - [`NodeId`], [`PeerNode`], [`AssetRef`], [`RequestToken`] - identity and references
//! - [`SyncPath`], [`SyncMessage`] - addressable slots and one-way messages
//! - [`DataItem`], [`PutDataRequest`], [`DataEvent`], [`Asset`] - overwrite-in-place records
//! - [`WeatherSnapshot`], [`SnapshotRecord`] - the mirrored weather summary
//! - [`SyncError`] - wire error type

#![warn(missing_docs)]
#![warn(clippy::all)]

mod data;
mod error;
mod ids;
mod messages;
mod snapshot;

pub use data::{Asset, DataEvent, DataEventKind, DataItem, PutDataRequest};
pub use error::SyncError;
pub use ids::{AssetRef, NodeId, PeerNode, RequestToken, REQUEST_TOKEN_LEN};
pub use messages::{SyncMessage, SyncPath};
pub use snapshot::{SnapshotRecord, WeatherSnapshot};
