//! The weather snapshot and its wire record.
//!
//! Temperatures are always transmitted in Celsius. `units_are_metric` records
//! the display preference of the publishing side, not the encoding.

use serde::{Deserialize, Serialize};

use crate::{Asset, AssetRef, PutDataRequest, SyncError, SyncPath};

/// The single authoritative weather record mirrored between peers.
#[derive(Clone, PartialEq)]
pub struct WeatherSnapshot {
    /// Weather condition code from the forecast provider.
    pub weather_condition_id: i32,
    /// Today's high, Celsius.
    pub high_temp: f64,
    /// Today's low, Celsius.
    pub low_temp: f64,
    /// Display preference of the publishing side.
    pub units_are_metric: bool,
    /// Icon image bytes; empty when no icon was resolved.
    pub icon_bytes: Vec<u8>,
    /// Capture time in unix milliseconds (diagnostic only).
    pub captured_at: Option<i64>,
}

impl WeatherSnapshot {
    /// Package the snapshot as a write to the snapshot path.
    ///
    /// The icon travels as an attachment referenced from the record. An empty
    /// icon produces no attachment and a `nil` reference.
    pub fn to_put_request(&self) -> Result<PutDataRequest, SyncError> {
        let asset = (!self.icon_bytes.is_empty())
            .then(|| Asset::from_bytes(self.icon_bytes.clone()));

        let record = SnapshotRecord {
            high_temp: self.high_temp,
            low_temp: self.low_temp,
            units_are_metric: self.units_are_metric,
            icon_asset: asset.as_ref().map(|a| a.reference),
            captured_at: self.captured_at,
            weather_id: Some(self.weather_condition_id),
        };

        let mut request = PutDataRequest::new(SyncPath::Weather, record.to_bytes()?);
        if let Some(asset) = asset {
            request = request.with_asset(asset);
        }
        Ok(request)
    }
}

impl std::fmt::Debug for WeatherSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherSnapshot")
            .field("weather_condition_id", &self.weather_condition_id)
            .field("high_temp", &self.high_temp)
            .field("low_temp", &self.low_temp)
            .field("units_are_metric", &self.units_are_metric)
            .field("icon_bytes", &format!("[{} bytes]", self.icon_bytes.len()))
            .field("captured_at", &self.captured_at)
            .finish()
    }
}

/// Wire form of a snapshot: a key-value map, order-independent.
///
/// Encoded as a MessagePack map with named keys so either side can add
/// fields without breaking the other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    /// Today's high, Celsius.
    #[serde(rename = "highTemp")]
    pub high_temp: f64,
    /// Today's low, Celsius.
    #[serde(rename = "lowTemp")]
    pub low_temp: f64,
    /// Display preference of the publishing side.
    #[serde(rename = "unitsAreMetric")]
    pub units_are_metric: bool,
    /// Reference to the icon attachment.
    #[serde(rename = "iconAsset", default)]
    pub icon_asset: Option<AssetRef>,
    /// Capture time in unix milliseconds.
    #[serde(
        rename = "capturedAt",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub captured_at: Option<i64>,
    /// Weather condition code.
    #[serde(rename = "weatherId", default, skip_serializing_if = "Option::is_none")]
    pub weather_id: Option<i32>,
}

impl SnapshotRecord {
    /// Serialize to a MessagePack map.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SyncError> {
        rmp_serde::to_vec_named(self).map_err(SyncError::Serialization)
    }

    /// Deserialize from MessagePack bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SyncError> {
        rmp_serde::from_slice(bytes).map_err(SyncError::Deserialization)
    }
}
