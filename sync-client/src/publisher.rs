//! Snapshot publishing.
//!
//! [`SnapshotPublisher::publish`] reads today's weather from the local source,
//! packages it with its icon and writes it to `/weather`, replacing whatever
//! was there. It never compares against the previous value.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use wearsync_core::WeatherIcon;
use wearsync_types::{DataItem, WeatherSnapshot};

use crate::error::ClientError;
use crate::scope::ConnectionScope;
use crate::source::{IconResolver, WeatherSource};
use crate::transport::{Session, Transport};
use crate::SyncConfig;

/// What a publish call did.
#[derive(Debug, Clone, PartialEq)]
pub enum PublishOutcome {
    /// The snapshot was written.
    Published(DataItem),
    /// The source had nothing for today; nothing was written.
    NoSourceData,
}

impl PublishOutcome {
    /// Whether a write happened.
    pub fn is_published(&self) -> bool {
        matches!(self, PublishOutcome::Published(_))
    }
}

/// Pushes the current weather to the shared snapshot record.
pub struct SnapshotPublisher<T: Transport> {
    scope: ConnectionScope<T>,
    source: Arc<dyn WeatherSource>,
    icons: Arc<dyn IconResolver>,
    urgent: bool,
    include_capture_time: bool,
}

impl<T: Transport> SnapshotPublisher<T> {
    /// Create a publisher.
    pub fn new(
        transport: Arc<T>,
        config: &SyncConfig,
        source: Arc<dyn WeatherSource>,
        icons: Arc<dyn IconResolver>,
    ) -> Self {
        Self {
            scope: ConnectionScope::new(transport, config.connect_timeout),
            source,
            icons,
            urgent: config.urgent,
            include_capture_time: config.include_capture_time,
        }
    }

    /// Publish today's snapshot.
    ///
    /// Returns [`PublishOutcome::NoSourceData`] without writing when the
    /// source has no record for the preferred location today.
    pub async fn publish(&self) -> Result<PublishOutcome, ClientError> {
        self.scope
            .with_connection(|session| self.publish_with(session))
            .await
    }

    async fn publish_with(&self, session: T::Session) -> Result<PublishOutcome, ClientError> {
        let Some(record) = self.source.current().await? else {
            tracing::debug!("no weather data for today, nothing to publish");
            return Ok(PublishOutcome::NoSourceData);
        };

        let snapshot = WeatherSnapshot {
            weather_condition_id: record.weather_id,
            high_temp: record.high,
            low_temp: record.low,
            units_are_metric: self.source.units_are_metric(),
            icon_bytes: self.icon_for(record.weather_id),
            captured_at: self.include_capture_time.then(now_millis),
        };

        let mut request = snapshot.to_put_request()?;
        if self.urgent {
            request = request.set_urgent();
        }

        let item = session.put_data_item(request).await?;
        tracing::info!(
            uri = %item.uri(),
            weather_id = snapshot.weather_condition_id,
            "weather snapshot published"
        );
        Ok(PublishOutcome::Published(item))
    }

    fn icon_for(&self, weather_id: i32) -> Vec<u8> {
        let bytes = WeatherIcon::from_condition_id(weather_id)
            .and_then(|icon| self.icons.icon_bytes(icon));
        if bytes.is_none() {
            tracing::debug!(weather_id, "no icon for condition, publishing without one");
        }
        bytes.unwrap_or_default()
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
