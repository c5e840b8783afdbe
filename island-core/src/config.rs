use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::icon::Locale;

pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 3_600_000;

/// Screen corner of the circular desktop surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Position {
    #[default]
    TopRight,
    TopLeft,
    BottomRight,
    BottomLeft,
}

impl Position {
    pub fn as_str(&self) -> &'static str {
        match self {
            Position::TopRight => "top-right",
            Position::TopLeft => "top-left",
            Position::BottomRight => "bottom-right",
            Position::BottomLeft => "bottom-left",
        }
    }

    pub const fn all() -> &'static [Position] {
        &[Position::TopRight, Position::TopLeft, Position::BottomRight, Position::BottomLeft]
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Default,
    Dark,
    Light,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Default => "default",
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    pub const fn all() -> &'static [Theme] {
        &[Theme::Default, Theme::Dark, Theme::Light]
    }

    /// Panel background for this theme.
    pub fn background(&self) -> &'static str {
        match self {
            Theme::Dark => "rgba(30, 30, 30, 0.95)",
            Theme::Light | Theme::Default => "rgba(255, 255, 255, 0.95)",
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Base URLs of every outbound service. Overridable for mirrors and tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub primary_geoip: String,
    pub secondary_geoip: String,
    pub geocoding: String,
    pub forecast: String,
    pub air_quality: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            primary_geoip: "https://api.myip.la/cn?json".to_string(),
            secondary_geoip: "https://myip.ipip.net".to_string(),
            geocoding: "https://nominatim.openstreetmap.org/search".to_string(),
            forecast: "https://api.open-meteo.com/v1/forecast".to_string(),
            air_quality: "https://air-quality-api.open-meteo.com/v1/air-quality".to_string(),
        }
    }
}

impl Endpoints {
    /// Every service rooted at `base`, using the default paths.
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            primary_geoip: format!("{base}/cn?json"),
            secondary_geoip: format!("{base}/ipip"),
            geocoding: format!("{base}/search"),
            forecast: format!("{base}/v1/forecast"),
            air_quality: format!("{base}/v1/air-quality"),
        }
    }
}

/// Widget options, stored on disk as TOML.
///
/// Example:
/// ```toml
/// position = "bottom-left"
/// theme = "dark"
/// refresh_interval = 600000
/// locale = "en"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub position: Position,
    pub theme: Theme,
    /// Milliseconds between refresh cycles; also the cache lifetime.
    pub refresh_interval: u64,
    /// Carried for compatibility; rendering always fills the detail panel.
    pub show_details: bool,
    pub enable_mobile: bool,
    pub locale: Locale,
    /// Directory of the persisted cache; platform cache dir when absent.
    pub cache_dir: Option<PathBuf>,
    pub endpoints: Endpoints,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            position: Position::default(),
            theme: Theme::default(),
            refresh_interval: DEFAULT_REFRESH_INTERVAL_MS,
            show_details: true,
            enable_mobile: true,
            locale: Locale::default(),
            cache_dir: None,
            endpoints: Endpoints::default(),
        }
    }
}

impl Config {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval)
    }

    /// Load config from disk, or return the defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        cfg.validate()?;
        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.refresh_interval == 0 {
            return Err(anyhow!("refresh_interval must be greater than zero"));
        }
        Ok(())
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "weather-island", "weather-island")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Directory holding the persisted cache entry.
    pub fn resolved_cache_dir(&self) -> Result<PathBuf> {
        match &self.cache_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(Self::project_dirs()?.cache_dir().to_path_buf()),
        }
    }
}
