//! Open-Meteo forecast and air-quality calls, merged into one payload.

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::{
    config::Endpoints,
    http::{FetchError, get_json},
    model::{Coordinates, WeatherPayload},
};

const WEATHER_DEADLINE: Duration = Duration::from_secs(4);
const AIR_QUALITY_DEADLINE: Duration = Duration::from_secs(5);

const CURRENT_FIELDS: &str = "temperature_2m,weather_code,relative_humidity_2m,wind_speed_10m";
const DAILY_FIELDS: &str = "temperature_2m_max,temperature_2m_min";

#[derive(Debug, Default, Deserialize)]
struct AirQualityResponse {
    #[serde(default)]
    current: AirQualityCurrent,
}

#[derive(Debug, Default, Deserialize)]
struct AirQualityCurrent {
    #[serde(default)]
    european_aqi: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct WeatherFetcher {
    http: Client,
    forecast_url: String,
    air_quality_url: String,
    weather_deadline: Duration,
    air_quality_deadline: Duration,
}

impl WeatherFetcher {
    pub fn new(http: Client, endpoints: &Endpoints) -> Self {
        Self {
            http,
            forecast_url: endpoints.forecast.clone(),
            air_quality_url: endpoints.air_quality.clone(),
            weather_deadline: WEATHER_DEADLINE,
            air_quality_deadline: AIR_QUALITY_DEADLINE,
        }
    }

    /// Overrides both request deadlines.
    pub fn with_deadlines(mut self, weather: Duration, air_quality: Duration) -> Self {
        self.weather_deadline = weather;
        self.air_quality_deadline = air_quality;
        self
    }

    /// Current conditions plus today's range, with the European AQI merged
    /// into `current`. Only the weather call can fail the fetch.
    pub async fn fetch(&self, coordinates: Coordinates) -> Result<WeatherPayload, FetchError> {
        let mut payload = self.fetch_weather(coordinates).await?;

        payload.current.european_aqi = match self.fetch_air_quality(coordinates).await {
            Ok(aqi) => aqi,
            Err(e) => {
                tracing::warn!("Air quality unavailable: {e}");
                None
            }
        };

        Ok(payload)
    }

    async fn fetch_weather(&self, coordinates: Coordinates) -> Result<WeatherPayload, FetchError> {
        tracing::debug!(
            latitude = coordinates.latitude,
            longitude = coordinates.longitude,
            "Requesting forecast"
        );

        let request = self.http.get(&self.forecast_url).query(&[
            ("latitude", coordinates.latitude.to_string()),
            ("longitude", coordinates.longitude.to_string()),
            ("current", CURRENT_FIELDS.to_string()),
            ("daily", DAILY_FIELDS.to_string()),
            ("timezone", "auto".to_string()),
            ("forecast_days", "1".to_string()),
        ]);

        get_json("weather", request, Some(self.weather_deadline)).await
    }

    async fn fetch_air_quality(&self, coordinates: Coordinates) -> Result<Option<f64>, FetchError> {
        let request = self.http.get(&self.air_quality_url).query(&[
            ("latitude", coordinates.latitude.to_string()),
            ("longitude", coordinates.longitude.to_string()),
            ("current", "european_aqi".to_string()),
            ("timezone", "auto".to_string()),
        ]);

        let response: AirQualityResponse =
            get_json("air quality", request, Some(self.air_quality_deadline)).await?;
        Ok(response.current.european_aqi)
    }
}
