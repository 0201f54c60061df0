//! Temperature normalization for delivered snapshots.
//!
//! Snapshots always carry Celsius. When the publishing side prefers imperial
//! display (`units_are_metric == false`), both values are converted to
//! Fahrenheit before they reach presentation.

use wearsync_types::SnapshotRecord;

/// Convert Celsius to Fahrenheit: `F = C * 9/5 + 32`.
pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

/// High/low pair ready for display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayTemperatures {
    /// Today's high in display units.
    pub high: f64,
    /// Today's low in display units.
    pub low: f64,
}

impl DisplayTemperatures {
    /// Normalize a Celsius pair according to the publisher's unit preference.
    pub fn from_celsius(high: f64, low: f64, units_are_metric: bool) -> Self {
        if units_are_metric {
            Self { high, low }
        } else {
            Self {
                high: celsius_to_fahrenheit(high),
                low: celsius_to_fahrenheit(low),
            }
        }
    }

    /// Normalize the temperatures carried by a snapshot record.
    pub fn from_record(record: &SnapshotRecord) -> Self {
        Self::from_celsius(record.high_temp, record.low_temp, record.units_are_metric)
    }
}
