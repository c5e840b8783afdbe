//! Normalizes raw Open-Meteo payloads into [`WeatherRecord`]s.

use crate::{
    icon::{AqiLevel, Condition, IconMap, Locale},
    model::{Coordinates, NOT_AVAILABLE, Payload, WeatherPayload, WeatherRecord},
};

/// Condition shown when an error payload carries no reason.
pub fn unsupported_location(locale: Locale) -> &'static str {
    match locale {
        Locale::Zh => "该位置暂不支持",
        Locale::En => "this location is not yet supported",
    }
}

/// Condition shown when neither location provider produced a usable result.
pub fn location_unresolved(locale: Locale) -> &'static str {
    match locale {
        Locale::Zh => "无法获取位置信息",
        Locale::En => "unable to determine location",
    }
}

/// Location shown when the name is empty.
pub fn unknown_location(locale: Locale) -> &'static str {
    match locale {
        Locale::Zh => "未知位置",
        Locale::En => "unknown location",
    }
}

/// Builds the display record for `payload`. Never fails: missing values
/// become [`NOT_AVAILABLE`] and error payloads become an error record.
pub fn parse(
    payload: &Payload,
    timestamp: i64,
    location_name: &str,
    coordinates: Option<Coordinates>,
    locale: Locale,
) -> WeatherRecord {
    let location = if location_name.is_empty() {
        unknown_location(locale).to_string()
    } else {
        location_name.to_string()
    };

    match payload {
        Payload::Error { reason } => WeatherRecord {
            location,
            condition: reason
                .clone()
                .filter(|r| !r.is_empty())
                .unwrap_or_else(|| unsupported_location(locale).to_string()),
            temperature: NOT_AVAILABLE.to_string(),
            temp_range: NOT_AVAILABLE.to_string(),
            humidity: NOT_AVAILABLE.to_string(),
            wind_speed: NOT_AVAILABLE.to_string(),
            air_quality: NOT_AVAILABLE.to_string(),
            icon: IconMap::UNKNOWN.to_string(),
            timestamp,
            coordinates,
        },
        Payload::Weather(weather) => parse_weather(weather, timestamp, location, coordinates, locale),
    }
}

fn parse_weather(
    payload: &WeatherPayload,
    timestamp: i64,
    location: String,
    coordinates: Option<Coordinates>,
    locale: Locale,
) -> WeatherRecord {
    let current = &payload.current;
    let condition = Condition::from_wmo_code(current.weather_code.unwrap_or(0));

    let temperature = current
        .temperature_2m
        .map(|t| format!("{}°C", round_half_up(t)))
        .unwrap_or_else(not_available);

    let temp_range = payload
        .daily
        .as_ref()
        .and_then(|daily| daily.today_range())
        .map(|(min, max)| format!("{}～{}°C", round_half_up(min), round_half_up(max)))
        .unwrap_or_else(not_available);

    let humidity = current
        .relative_humidity_2m
        .map(|h| format!("{}%", round_half_up(h)))
        .unwrap_or_else(not_available);

    let air_quality = current
        .european_aqi
        .map(|aqi| format!("{} ({aqi})", AqiLevel::from_index(aqi).label(locale)))
        .unwrap_or_else(not_available);

    let wind_speed = current
        .wind_speed_10m
        .map(|w| format!("{} km/h", round_half_up(w)))
        .unwrap_or_else(not_available);

    WeatherRecord {
        location,
        condition: condition.label(locale).to_string(),
        temperature,
        temp_range,
        humidity,
        wind_speed,
        air_quality,
        icon: condition.glyph().to_string(),
        timestamp,
        coordinates,
    }
}

fn not_available() -> String {
    NOT_AVAILABLE.to_string()
}

/// Rounds halves toward positive infinity (`-0.5` becomes `0`, `2.5` becomes `3`).
fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}
