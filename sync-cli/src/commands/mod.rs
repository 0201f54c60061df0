//! CLI command implementations.
//!
//! Both commands run a primary ("phone") and a companion ("watch") on one
//! in-memory mesh and print what the companion's presentation layer would
//! receive.

pub mod push;
pub mod request;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use wearsync_client::{
    LocalUpdateEvent, MemoryIcons, MemoryWeatherSource, MockNetwork, MockTransport, SyncNode,
    WeatherRecord,
};
use wearsync_core::WeatherIcon;

use crate::config::FileConfig;

/// Today's weather on the primary device.
#[derive(Args, Debug, Clone)]
pub struct WeatherArgs {
    /// Today's high, Celsius
    #[arg(long, default_value_t = 21.0, allow_negative_numbers = true)]
    pub high: f64,

    /// Today's low, Celsius
    #[arg(long, default_value_t = 9.0, allow_negative_numbers = true)]
    pub low: f64,

    /// Forecast condition code (e.g. 800 clear, 500 rain)
    #[arg(long, default_value_t = 800)]
    pub weather_id: i32,

    /// The primary prefers imperial display
    #[arg(long)]
    pub imperial: bool,

    /// Leave the primary's weather store empty
    #[arg(long)]
    pub no_data: bool,
}

/// A delivered update as printed on stdout.
#[derive(Debug, Serialize)]
pub struct DeliveredUpdate {
    /// High in display units.
    pub high_temp: f64,
    /// Low in display units.
    pub low_temp: f64,
    /// Icon the primary resolved, if any.
    pub icon: Option<String>,
    /// Size of the delivered icon bytes.
    pub icon_bytes: usize,
}

impl From<LocalUpdateEvent> for DeliveredUpdate {
    fn from(event: LocalUpdateEvent) -> Self {
        let icon = (!event.icon_bytes.is_empty())
            .then(|| String::from_utf8_lossy(&event.icon_bytes).into_owned());
        Self {
            high_temp: event.high_temp,
            low_temp: event.low_temp,
            icon,
            icon_bytes: event.icon_bytes.len(),
        }
    }
}

/// Start the primary node with a store seeded from `weather`.
pub(crate) async fn start_primary(
    network: &MockNetwork,
    config: &FileConfig,
    weather: &WeatherArgs,
) -> Result<SyncNode<MockTransport>> {
    let source = MemoryWeatherSource::new(&config.source.location).with_metric(!weather.imperial);
    if !weather.no_data {
        source.insert_today(WeatherRecord::new(weather.weather_id, weather.high, weather.low));
    }
    if let Some(icon) = WeatherIcon::from_condition_id(weather.weather_id) {
        tracing::debug!(%icon, weather_id = weather.weather_id, "primary icon");
    }

    SyncNode::start_primary(
        network.add_node("phone", "Phone"),
        config.sync_config(),
        Arc::new(source),
        Arc::new(MemoryIcons::placeholder()),
    )
    .await
    .context("Failed to start primary node")
}

/// Wait for one update and print it as JSON, or `null` if none arrives.
pub(crate) async fn print_next_update(
    updates: &mut broadcast::Receiver<LocalUpdateEvent>,
    timeout: Duration,
) -> Result<bool> {
    match tokio::time::timeout(timeout, updates.recv()).await {
        Ok(Ok(event)) => {
            let delivered = DeliveredUpdate::from(event);
            println!("{}", serde_json::to_string_pretty(&delivered)?);
            Ok(true)
        }
        Ok(Err(e)) => Err(e).context("Update channel failed"),
        Err(_) => {
            tracing::info!(?timeout, "no weather update delivered");
            println!("null");
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivered_update_decodes_placeholder_icon() {
        let delivered = DeliveredUpdate::from(LocalUpdateEvent {
            high_temp: 23.0,
            low_temp: 14.0,
            icon_bytes: b"ic_clear".to_vec(),
        });
        assert_eq!(delivered.icon.as_deref(), Some("ic_clear"));
        assert_eq!(delivered.icon_bytes, 8);
    }

    #[test]
    fn delivered_update_without_icon() {
        let delivered = DeliveredUpdate::from(LocalUpdateEvent {
            high_temp: 1.0,
            low_temp: 0.0,
            icon_bytes: Vec::new(),
        });
        assert!(delivered.icon.is_none());
    }
}
