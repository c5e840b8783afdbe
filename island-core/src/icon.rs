//! Condition labels, AQI levels and their display glyphs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Language of every user-facing string the widget produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Zh,
    En,
}

impl Locale {
    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::Zh => "zh",
            Locale::En => "en",
        }
    }

    pub const fn all() -> &'static [Locale] {
        &[Locale::Zh, Locale::En]
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Locale {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "zh" | "zh-cn" => Ok(Locale::Zh),
            "en" => Ok(Locale::En),
            _ => Err(anyhow::anyhow!("Unknown locale '{value}'. Supported locales: zh, en.")),
        }
    }
}

/// Glyph lookup keyed by condition label, in either locale.
pub struct IconMap;

impl IconMap {
    pub const UNKNOWN: &'static str = "🌤️";

    const TABLE: &'static [(&'static str, &'static str)] = &[
        ("晴", "☀️"),
        ("clear", "☀️"),
        ("多云", "⛅"),
        ("cloudy", "⛅"),
        ("阴", "☁️"),
        ("overcast", "☁️"),
        ("小雨", "🌧️"),
        ("light rain", "🌧️"),
        ("中雨", "🌧️"),
        ("moderate rain", "🌧️"),
        ("大雨", "🌧️"),
        ("heavy rain", "🌧️"),
        ("暴雨", "🌧️"),
        ("downpour", "🌧️"),
        ("雷", "⚡"),
        ("thunderstorm", "⚡"),
        ("雪", "❄️"),
        ("snow", "❄️"),
        ("雾", "🌫️"),
        ("fog", "🌫️"),
        ("霾", "🌫️"),
        ("haze", "🌫️"),
        ("未知", "🌤️"),
        ("unknown", "🌤️"),
    ];

    pub fn glyph(label: &str) -> &'static str {
        Self::TABLE
            .iter()
            .find(|(key, _)| *key == label)
            .map(|(_, glyph)| *glyph)
            .unwrap_or(Self::UNKNOWN)
    }
}

/// Display condition derived from an Open-Meteo WMO weather code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Clear,
    MostlyClear,
    PartlyCloudy,
    Cloudy,
    Fog,
    LightRain,
    ModerateRain,
    HeavyRain,
    Thunderstorm,
    Snow,
    Overcast,
}

impl Condition {
    pub fn from_wmo_code(code: i64) -> Self {
        match code {
            0 => Self::Clear,
            1 => Self::MostlyClear,
            2 => Self::PartlyCloudy,
            3 => Self::Cloudy,
            45 | 48 => Self::Fog,
            51 | 53 | 55 | 56 | 57 => Self::LightRain,
            61 | 63 | 66 | 80 | 81 => Self::ModerateRain,
            65 | 67 | 82 => Self::HeavyRain,
            95 | 96 | 99 => Self::Thunderstorm,
            71 | 73 | 75 | 77 | 85 | 86 => Self::Snow,
            _ => Self::Overcast,
        }
    }

    pub fn label(&self, locale: Locale) -> &'static str {
        match (self, locale) {
            (Self::Clear, Locale::Zh) => "晴",
            (Self::Clear, Locale::En) => "clear",
            (Self::MostlyClear, Locale::Zh) => "大部晴朗",
            (Self::MostlyClear, Locale::En) => "mostly clear",
            (Self::PartlyCloudy, Locale::Zh) => "局部多云",
            (Self::PartlyCloudy, Locale::En) => "partly cloudy",
            (Self::Cloudy, Locale::Zh) => "多云",
            (Self::Cloudy, Locale::En) => "cloudy",
            (Self::Fog, Locale::Zh) => "雾",
            (Self::Fog, Locale::En) => "fog",
            (Self::LightRain, Locale::Zh) => "小雨",
            (Self::LightRain, Locale::En) => "light rain",
            (Self::ModerateRain, Locale::Zh) => "中雨",
            (Self::ModerateRain, Locale::En) => "moderate rain",
            (Self::HeavyRain, Locale::Zh) => "大雨",
            (Self::HeavyRain, Locale::En) => "heavy rain",
            (Self::Thunderstorm, Locale::Zh) => "雷雨",
            (Self::Thunderstorm, Locale::En) => "thunderstorm",
            (Self::Snow, Locale::Zh) => "雪",
            (Self::Snow, Locale::En) => "snow",
            (Self::Overcast, Locale::Zh) => "阴",
            (Self::Overcast, Locale::En) => "overcast",
        }
    }

    pub fn glyph(&self) -> &'static str {
        // Several conditions borrow the icon of a broader label.
        let key = match self {
            Self::Clear | Self::MostlyClear => "晴",
            Self::PartlyCloudy | Self::Cloudy => "多云",
            Self::Fog => "雾",
            Self::LightRain => "小雨",
            Self::ModerateRain => "中雨",
            Self::HeavyRain => "大雨",
            Self::Thunderstorm => "雷",
            Self::Snow => "雪",
            Self::Overcast => "阴",
        };
        IconMap::glyph(key)
    }
}

/// European AQI bucket. Upper bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AqiLevel {
    Excellent,
    Good,
    Moderate,
    Fair,
    Poor,
    Severe,
}

impl AqiLevel {
    pub fn from_index(aqi: f64) -> Self {
        if aqi <= 20.0 {
            Self::Excellent
        } else if aqi <= 40.0 {
            Self::Good
        } else if aqi <= 60.0 {
            Self::Moderate
        } else if aqi <= 80.0 {
            Self::Fair
        } else if aqi <= 100.0 {
            Self::Poor
        } else {
            Self::Severe
        }
    }

    pub fn label(&self, locale: Locale) -> &'static str {
        match (self, locale) {
            (Self::Excellent, Locale::Zh) => "优",
            (Self::Excellent, Locale::En) => "excellent",
            (Self::Good, Locale::Zh) => "良",
            (Self::Good, Locale::En) => "good",
            (Self::Moderate, Locale::Zh) => "中等",
            (Self::Moderate, Locale::En) => "moderate",
            (Self::Fair, Locale::Zh) => "一般",
            (Self::Fair, Locale::En) => "fair",
            (Self::Poor, Locale::Zh) => "差",
            (Self::Poor, Locale::En) => "poor",
            (Self::Severe, Locale::Zh) => "严重",
            (Self::Severe, Locale::En) => "severe",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_codes_map_individually() {
        assert_eq!(Condition::from_wmo_code(0), Condition::Clear);
        assert_eq!(Condition::from_wmo_code(1), Condition::MostlyClear);
        assert_eq!(Condition::from_wmo_code(2), Condition::PartlyCloudy);
        assert_eq!(Condition::from_wmo_code(3), Condition::Cloudy);
    }

    #[test]
    fn grouped_codes_map_to_their_group() {
        let groups: &[(&[i64], Condition)] = &[
            (&[45, 48], Condition::Fog),
            (&[51, 53, 55, 56, 57], Condition::LightRain),
            (&[61, 63, 66, 80, 81], Condition::ModerateRain),
            (&[65, 67, 82], Condition::HeavyRain),
            (&[95, 96, 99], Condition::Thunderstorm),
            (&[71, 73, 75, 77, 85, 86], Condition::Snow),
        ];

        for (codes, expected) in groups {
            for code in *codes {
                assert_eq!(Condition::from_wmo_code(*code), *expected, "code {code}");
            }
        }
    }

    #[test]
    fn unlisted_codes_are_overcast() {
        for code in [4, 44, 50, 60, 70, 100, -1] {
            assert_eq!(Condition::from_wmo_code(code), Condition::Overcast);
        }
        assert_eq!(Condition::Overcast.glyph(), "☁️");
    }

    #[test]
    fn rain_severities_share_a_glyph() {
        assert_eq!(Condition::LightRain.glyph(), Condition::HeavyRain.glyph());
        assert_eq!(Condition::ModerateRain.glyph(), Condition::HeavyRain.glyph());
        assert_eq!(IconMap::glyph("雾"), IconMap::glyph("霾"));
    }

    #[test]
    fn unknown_label_uses_unknown_glyph() {
        assert_eq!(IconMap::glyph("sandstorm"), IconMap::UNKNOWN);
        assert_eq!(IconMap::glyph("未知"), IconMap::UNKNOWN);
    }

    #[test]
    fn aqi_bounds_are_inclusive() {
        assert_eq!(AqiLevel::from_index(0.0), AqiLevel::Excellent);
        assert_eq!(AqiLevel::from_index(20.0), AqiLevel::Excellent);
        assert_eq!(AqiLevel::from_index(21.0), AqiLevel::Good);
        assert_eq!(AqiLevel::from_index(40.0), AqiLevel::Good);
        assert_eq!(AqiLevel::from_index(41.0), AqiLevel::Moderate);
        assert_eq!(AqiLevel::from_index(60.0), AqiLevel::Moderate);
        assert_eq!(AqiLevel::from_index(80.0), AqiLevel::Fair);
        assert_eq!(AqiLevel::from_index(100.0), AqiLevel::Poor);
        assert_eq!(AqiLevel::from_index(100.5), AqiLevel::Severe);
        assert_eq!(AqiLevel::from_index(350.0), AqiLevel::Severe);
    }

    #[test]
    fn locale_parses_case_insensitively() {
        assert_eq!(Locale::try_from("EN").unwrap(), Locale::En);
        assert_eq!(Locale::try_from("zh-CN").unwrap(), Locale::Zh);
        let err = Locale::try_from("fr").unwrap_err();
        assert!(err.to_string().contains("Unknown locale"));
    }
}
