//! Primary publishes unsolicited; the companion only listens.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use wearsync_client::{
    ListenerService, LocalUpdates, MockNetwork, PublishOutcome, SyncListener, Transport,
};

use super::{print_next_update, start_primary, WeatherArgs};
use crate::config::FileConfig;

/// Run the push command.
pub async fn run(config: &FileConfig, weather: &WeatherArgs, wait: Duration) -> Result<()> {
    let network = MockNetwork::new();
    let sync_config = config.sync_config();

    // A listen-only companion: no start-up request
    let watch = Arc::new(network.add_node("watch", "Watch"));
    let updates = LocalUpdates::new(sync_config.update_capacity);
    let mut received = updates.subscribe();
    let listener = SyncListener::new(Arc::clone(&watch), &sync_config, updates);
    let service = ListenerService::new()
        .with_sync_listener(Arc::new(listener))
        .spawn(watch.subscribe());

    let phone = start_primary(&network, config, weather).await?;
    let outcome = phone
        .publish_now()
        .await
        .context("Failed to publish weather")?;

    match outcome {
        Some(PublishOutcome::Published(item)) => {
            tracing::info!(uri = %item.uri(), "pushed");
            print_next_update(&mut received, wait).await?;
        }
        Some(PublishOutcome::NoSourceData) | None => {
            tracing::info!("nothing to push");
            println!("null");
        }
    }

    service.abort();
    phone.shutdown();
    Ok(())
}
