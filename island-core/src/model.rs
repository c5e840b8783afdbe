use serde::{Deserialize, Serialize};

/// Placeholder for any display field without data.
pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Outcome of one location lookup. `name` is empty when nothing resolved.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResolvedLocation {
    pub name: String,
    pub coordinates: Option<Coordinates>,
}

impl ResolvedLocation {
    pub fn unresolved() -> Self {
        Self::default()
    }

    pub fn is_resolved(&self) -> bool {
        !self.name.is_empty() && self.coordinates.is_some()
    }
}

/// Normalized record pushed to every view surface.
///
/// Display fields are always populated; missing data is rendered as
/// [`NOT_AVAILABLE`] so surfaces never deal with absent values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherRecord {
    pub location: String,
    pub condition: String,
    pub temperature: String,
    pub temp_range: String,
    pub humidity: String,
    pub wind_speed: String,
    pub air_quality: String,
    pub icon: String,
    /// Epoch milliseconds of the fetch that produced this record.
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

impl WeatherRecord {
    /// AQI level word without the numeric value, e.g. `"good"` for `"good (35)"`.
    pub fn air_quality_level(&self) -> &str {
        self.air_quality.split(' ').next().unwrap_or_default()
    }
}

/// The single persisted cache record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub data: WeatherRecord,
    pub last_updated: i64,
}

/// `current` block of the merged forecast + air-quality payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    #[serde(default)]
    pub temperature_2m: Option<f64>,
    #[serde(default)]
    pub weather_code: Option<i64>,
    #[serde(default)]
    pub relative_humidity_2m: Option<f64>,
    #[serde(default)]
    pub wind_speed_10m: Option<f64>,
    #[serde(default)]
    pub european_aqi: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    #[serde(default)]
    pub temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    pub temperature_2m_min: Vec<Option<f64>>,
}

impl DailyForecast {
    /// Today's `(min, max)`, only when both are known.
    pub fn today_range(&self) -> Option<(f64, f64)> {
        let min = self.temperature_2m_min.first().copied().flatten()?;
        let max = self.temperature_2m_max.first().copied().flatten()?;
        Some((min, max))
    }
}

/// Raw weather payload with the air-quality value merged into `current`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherPayload {
    #[serde(default)]
    pub current: CurrentConditions,
    #[serde(default)]
    pub daily: Option<DailyForecast>,
}

/// Parser input: either a fetched payload or an error marker.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Weather(WeatherPayload),
    Error { reason: Option<String> },
}

impl Payload {
    pub fn error(reason: impl Into<String>) -> Self {
        Payload::Error { reason: Some(reason.into()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> WeatherRecord {
        WeatherRecord {
            location: "北京市".into(),
            condition: "多云".into(),
            temperature: "24°C".into(),
            temp_range: "20～28°C".into(),
            humidity: "65%".into(),
            wind_speed: "12 km/h".into(),
            air_quality: "良 (35)".into(),
            icon: "⛅".into(),
            timestamp: 1_700_000_000_000,
            coordinates: None,
        }
    }

    #[test]
    fn record_serializes_with_widget_field_names() {
        let record = record();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["tempRange"], "20～28°C");
        assert_eq!(json["windSpeed"], "12 km/h");
        assert_eq!(json["airQuality"], "良 (35)");
        assert!(json.get("coordinates").is_none());
    }

    #[test]
    fn air_quality_level_strips_value() {
        let mut record = record();
        record.air_quality = "good (35)".into();
        assert_eq!(record.air_quality_level(), "good");

        record.air_quality = NOT_AVAILABLE.into();
        assert_eq!(record.air_quality_level(), NOT_AVAILABLE);
    }

    #[test]
    fn payload_tolerates_missing_and_null_fields() {
        let payload: WeatherPayload = serde_json::from_str(
            r#"{"current":{"temperature_2m":1.5,"european_aqi":null},"daily":{"temperature_2m_max":[null]}}"#,
        )
        .unwrap();

        assert_eq!(payload.current.temperature_2m, Some(1.5));
        assert_eq!(payload.current.european_aqi, None);
        assert_eq!(payload.daily.unwrap().today_range(), None);
    }

    #[test]
    fn resolved_needs_name_and_coordinates() {
        let coordinates = Some(Coordinates { latitude: 39.9, longitude: 116.4 });

        assert!(!ResolvedLocation::unresolved().is_resolved());
        assert!(!ResolvedLocation { name: String::new(), coordinates }.is_resolved());
        assert!(!ResolvedLocation { name: "北京市".into(), coordinates: None }.is_resolved());
        assert!(ResolvedLocation { name: "北京市".into(), coordinates }.is_resolved());
    }
}
