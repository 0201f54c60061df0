//! Weather condition code → icon mapping.
//!
//! Condition codes follow the OpenWeatherMap grouping
//! (2xx thunderstorm, 3xx drizzle, 5xx rain, 6xx snow, 7xx atmosphere,
//! 800 clear, 80x clouds). The byte content of each icon is supplied by an
//! icon resolver in sync-client; this module only picks which one.

use std::fmt;

/// Icon art for a weather condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeatherIcon {
    /// Thunderstorms, squalls and tornadoes.
    Storm,
    /// Drizzle.
    LightRain,
    /// Rain and showers.
    Rain,
    /// Snow and freezing rain.
    Snow,
    /// Mist, smoke, haze, dust and fog.
    Fog,
    /// Clear sky.
    Clear,
    /// Few clouds.
    LightClouds,
    /// Scattered to overcast clouds.
    Cloudy,
}

impl WeatherIcon {
    /// Every icon, in declaration order.
    pub const ALL: [WeatherIcon; 8] = [
        WeatherIcon::Storm,
        WeatherIcon::LightRain,
        WeatherIcon::Rain,
        WeatherIcon::Snow,
        WeatherIcon::Fog,
        WeatherIcon::Clear,
        WeatherIcon::LightClouds,
        WeatherIcon::Cloudy,
    ];

    /// Pick the icon for a condition code, or `None` for unknown codes.
    ///
    /// Ranges are checked in order, so 761 (dust) lands on fog even though
    /// 761 also appears in the storm list.
    pub fn from_condition_id(weather_id: i32) -> Option<Self> {
        match weather_id {
            200..=232 => Some(Self::Storm),
            300..=321 => Some(Self::LightRain),
            500..=504 => Some(Self::Rain),
            511 => Some(Self::Snow),
            520..=531 => Some(Self::Rain),
            600..=622 => Some(Self::Snow),
            701..=761 => Some(Self::Fog),
            781 => Some(Self::Storm),
            800 => Some(Self::Clear),
            801 => Some(Self::LightClouds),
            802..=804 => Some(Self::Cloudy),
            _ => None,
        }
    }

    /// Resource name of the icon art.
    pub fn resource_name(&self) -> &'static str {
        match self {
            Self::Storm => "ic_storm",
            Self::LightRain => "ic_light_rain",
            Self::Rain => "ic_rain",
            Self::Snow => "ic_snow",
            Self::Fog => "ic_fog",
            Self::Clear => "ic_clear",
            Self::LightClouds => "ic_light_clouds",
            Self::Cloudy => "ic_cloudy",
        }
    }
}

impl fmt::Display for WeatherIcon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.resource_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_boundaries() {
        assert_eq!(WeatherIcon::from_condition_id(200), Some(WeatherIcon::Storm));
        assert_eq!(WeatherIcon::from_condition_id(232), Some(WeatherIcon::Storm));
        assert_eq!(WeatherIcon::from_condition_id(300), Some(WeatherIcon::LightRain));
        assert_eq!(WeatherIcon::from_condition_id(504), Some(WeatherIcon::Rain));
        assert_eq!(WeatherIcon::from_condition_id(511), Some(WeatherIcon::Snow));
        assert_eq!(WeatherIcon::from_condition_id(520), Some(WeatherIcon::Rain));
        assert_eq!(WeatherIcon::from_condition_id(622), Some(WeatherIcon::Snow));
        assert_eq!(WeatherIcon::from_condition_id(701), Some(WeatherIcon::Fog));
        assert_eq!(WeatherIcon::from_condition_id(800), Some(WeatherIcon::Clear));
        assert_eq!(WeatherIcon::from_condition_id(801), Some(WeatherIcon::LightClouds));
        assert_eq!(WeatherIcon::from_condition_id(804), Some(WeatherIcon::Cloudy));
    }

    #[test]
    fn dust_is_fog_and_tornado_is_storm() {
        assert_eq!(WeatherIcon::from_condition_id(761), Some(WeatherIcon::Fog));
        assert_eq!(WeatherIcon::from_condition_id(781), Some(WeatherIcon::Storm));
    }

    #[test]
    fn gaps_and_unknown_codes_have_no_icon() {
        for id in [-1, 0, 199, 233, 322, 505, 510, 532, 623, 771, 805, 900] {
            assert_eq!(WeatherIcon::from_condition_id(id), None, "id {id}");
        }
    }

    #[test]
    fn resource_names_are_distinct() {
        use std::collections::HashSet;
        let names: HashSet<_> = WeatherIcon::ALL.iter().map(|i| i.resource_name()).collect();
        assert_eq!(names.len(), WeatherIcon::ALL.len());
    }
}
