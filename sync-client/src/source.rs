//! Local weather data and icon lookup.
//!
//! The primary device owns the authoritative weather store. The publisher only
//! needs two questions answered: "what is today's weather at the preferred
//! location?" and "what bytes draw this icon?". Both are traits so a real
//! store or asset bundle can slot in; the in-memory versions back the tests
//! and the CLI.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use wearsync_core::WeatherIcon;

const SECONDS_PER_DAY: u64 = 86_400;

/// One day of forecast for one location. Temperatures are Celsius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherRecord {
    /// Condition code from the forecast provider.
    pub weather_id: i32,
    /// High, Celsius.
    pub high: f64,
    /// Low, Celsius.
    pub low: f64,
}

impl WeatherRecord {
    /// Create a record.
    pub fn new(weather_id: i32, high: f64, low: f64) -> Self {
        Self {
            weather_id,
            high,
            low,
        }
    }
}

/// Weather source errors.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The backing store could not be queried.
    #[error("weather source unavailable: {0}")]
    Unavailable(String),
}

/// Authoritative local weather data.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Today's record for the preferred location, or `None` if there is none.
    async fn current(&self) -> Result<Option<WeatherRecord>, SourceError>;

    /// Whether the user prefers metric display.
    fn units_are_metric(&self) -> bool;
}

/// Resolves icon image bytes.
pub trait IconResolver: Send + Sync {
    /// Bytes for `icon`, or `None` when no image is available.
    fn icon_bytes(&self, icon: WeatherIcon) -> Option<Vec<u8>>;
}

/// In-memory weather store keyed by location and day.
#[derive(Debug)]
pub struct MemoryWeatherSource {
    location: String,
    units_are_metric: bool,
    state: RwLock<SourceState>,
}

#[derive(Debug, Default)]
struct SourceState {
    records: HashMap<(String, u64), WeatherRecord>,
    today: Option<u64>,
    unavailable: Option<String>,
}

impl MemoryWeatherSource {
    /// Create an empty store for a preferred location.
    pub fn new(location: &str) -> Self {
        Self {
            location: location.to_string(),
            units_are_metric: true,
            state: RwLock::new(SourceState::default()),
        }
    }

    /// Set the display unit preference.
    pub fn with_metric(mut self, units_are_metric: bool) -> Self {
        self.units_are_metric = units_are_metric;
        self
    }

    /// Pin "today" to a fixed day number instead of the wall clock.
    pub fn with_today(self, day: u64) -> Self {
        self.write().today = Some(day);
        self
    }

    /// The preferred location.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Store a record for a location and day (days since the unix epoch).
    pub fn insert(&self, location: &str, day: u64, record: WeatherRecord) {
        self.write()
            .records
            .insert((location.to_string(), day), record);
    }

    /// Store today's record for the preferred location.
    pub fn insert_today(&self, record: WeatherRecord) {
        let day = self.today();
        let location = self.location.clone();
        self.write().records.insert((location, day), record);
    }

    /// Make every query fail with `reason`, or recover with `None`.
    pub fn set_unavailable(&self, reason: Option<&str>) {
        self.write().unavailable = reason.map(str::to_string);
    }

    /// Day number used as "today".
    pub fn today(&self) -> u64 {
        let pinned = self
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .today;
        pinned.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs() / SECONDS_PER_DAY)
                .unwrap_or(0)
        })
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, SourceState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl WeatherSource for MemoryWeatherSource {
    async fn current(&self) -> Result<Option<WeatherRecord>, SourceError> {
        let day = self.today();
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(reason) = &state.unavailable {
            return Err(SourceError::Unavailable(reason.clone()));
        }
        Ok(state.records.get(&(self.location.clone(), day)).copied())
    }

    fn units_are_metric(&self) -> bool {
        self.units_are_metric
    }
}

/// In-memory icon table.
#[derive(Debug, Clone, Default)]
pub struct MemoryIcons {
    icons: HashMap<WeatherIcon, Vec<u8>>,
}

impl MemoryIcons {
    /// An empty table; every lookup misses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register bytes for one icon.
    pub fn with_icon(mut self, icon: WeatherIcon, bytes: impl Into<Vec<u8>>) -> Self {
        self.icons.insert(icon, bytes.into());
        self
    }

    /// A table where every icon resolves to its resource name as bytes.
    pub fn placeholder() -> Self {
        WeatherIcon::ALL
            .iter()
            .fold(Self::new(), |icons, icon| {
                icons.with_icon(*icon, icon.resource_name().as_bytes())
            })
    }
}

impl IconResolver for MemoryIcons {
    fn icon_bytes(&self, icon: WeatherIcon) -> Option<Vec<u8>> {
        self.icons.get(&icon).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ===========================================
    // Weather Source Tests
    // ===========================================

    #[tokio::test]
    async fn current_reads_preferred_location_today() {
        let source = MemoryWeatherSource::new("Mountain View").with_today(19_000);
        source.insert("Mountain View", 19_000, WeatherRecord::new(800, 21.0, 9.0));
        source.insert("Mountain View", 19_001, WeatherRecord::new(500, 15.0, 7.0));
        source.insert("London", 19_000, WeatherRecord::new(300, 12.0, 6.0));

        let record = source.current().await.unwrap();
        assert_eq!(record, Some(WeatherRecord::new(800, 21.0, 9.0)));
    }

    #[tokio::test]
    async fn no_record_for_today_is_none() {
        let source = MemoryWeatherSource::new("Mountain View").with_today(19_000);
        source.insert("Mountain View", 18_999, WeatherRecord::new(800, 21.0, 9.0));

        assert_eq!(source.current().await.unwrap(), None);
    }

    #[tokio::test]
    async fn insert_today_uses_wall_clock_day() {
        let source = MemoryWeatherSource::new("Oslo");
        source.insert_today(WeatherRecord::new(600, -2.0, -8.0));

        assert!(source.current().await.unwrap().is_some());
        assert!(source.today() > 19_000);
    }

    #[tokio::test]
    async fn unavailable_source_errors() {
        let source = MemoryWeatherSource::new("Oslo");
        source.set_unavailable(Some("database locked"));
        assert!(matches!(
            source.current().await,
            Err(SourceError::Unavailable(_))
        ));

        source.set_unavailable(None);
        assert!(source.current().await.is_ok());
    }

    #[test]
    fn metric_preference() {
        assert!(MemoryWeatherSource::new("Oslo").units_are_metric());
        assert!(!MemoryWeatherSource::new("Oslo")
            .with_metric(false)
            .units_are_metric());
    }

    // ===========================================
    // Icon Tests
    // ===========================================

    #[test]
    fn icons_resolve_registered_bytes() {
        let icons = MemoryIcons::new().with_icon(WeatherIcon::Clear, b"PNGDATA".to_vec());
        assert_eq!(icons.icon_bytes(WeatherIcon::Clear), Some(b"PNGDATA".to_vec()));
        assert_eq!(icons.icon_bytes(WeatherIcon::Rain), None);
    }

    #[test]
    fn placeholder_covers_every_icon() {
        let icons = MemoryIcons::placeholder();
        for icon in WeatherIcon::ALL {
            assert_eq!(
                icons.icon_bytes(icon),
                Some(icon.resource_name().as_bytes().to_vec())
            );
        }
    }
}
