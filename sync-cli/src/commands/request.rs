//! Companion asks for weather; the primary answers by publishing.

use anyhow::{Context, Result};
use std::time::Duration;
use wearsync_client::{MockNetwork, SyncNode};

use super::{print_next_update, start_primary, WeatherArgs};
use crate::config::FileConfig;

/// Run the request command.
pub async fn run(config: &FileConfig, weather: &WeatherArgs, wait: Duration) -> Result<()> {
    let network = MockNetwork::new();
    let phone = start_primary(&network, config, weather).await?;

    let watch = SyncNode::start_companion(network.add_node("watch", "Watch"), config.sync_config())
        .await
        .context("Failed to start companion node")?;
    // Subscribe before requesting so the reply has a receiver
    let mut updates = watch.subscribe_updates();
    watch.request_weather();

    print_next_update(&mut updates, wait).await?;

    tracing::info!(
        requests = network.sent_messages().len(),
        writes = network.put_requests().len(),
        "request finished"
    );
    watch.shutdown();
    phone.shutdown();
    Ok(())
}
