//! The three view surfaces and how a [`WeatherRecord`] fills them.

use chrono::{Local, TimeZone};
use std::fmt::Display;

use crate::{
    config::{Config, Position, Theme},
    icon::Locale,
    model::WeatherRecord,
    view::Element,
};

pub const STYLE_ID: &str = "weather-island-styles";

const EDGE_OFFSET: &str = "20px";

/// Captions used by the surfaces.
struct Captions {
    humidity: &'static str,
    wind: &'static str,
    temperature: &'static str,
    air: &'static str,
    air_quality: &'static str,
    updated: &'static str,
}

impl Captions {
    fn for_locale(locale: Locale) -> Self {
        match locale {
            Locale::Zh => Self {
                humidity: "湿度",
                wind: "风速",
                temperature: "温度",
                air: "空气",
                air_quality: "空气质量",
                updated: "更新",
            },
            Locale::En => Self {
                humidity: "Humidity",
                wind: "Wind",
                temperature: "Temp",
                air: "Air",
                air_quality: "Air quality",
                updated: "Updated",
            },
        }
    }
}

/// `HH:MM` of `timestamp` (epoch millis) in the local time zone.
pub fn format_clock(timestamp: i64) -> String {
    format_clock_in(timestamp, &Local)
}

pub fn format_clock_in<Tz: TimeZone>(timestamp: i64, tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    tz.timestamp_millis_opt(timestamp)
        .single()
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_else(|| "--:--".to_string())
}

/// Owns the surfaces mounted into one container.
#[derive(Debug)]
pub struct DisplayController {
    locale: Locale,
    style: Element,
    circular: Element,
    bar: Option<Element>,
    panel: Option<Element>,
}

impl DisplayController {
    /// Builds every surface under `container`. The mobile bar and panel are
    /// skipped when `enable_mobile` is off.
    pub fn mount(container: &Element, config: &Config) -> Self {
        let style = Element::new("style")
            .with_id(STYLE_ID)
            .with_text(format!("/* theme: {} */", config.theme));
        container.append(&style);

        let captions = Captions::for_locale(config.locale);
        let circular = build_circular(config.theme, config.position, &captions);
        container.append(&circular);

        let (bar, panel) = if config.enable_mobile {
            let bar = build_bar();
            let panel = build_panel(config.theme, &captions);
            container.append(&bar);
            container.append(&panel);
            (Some(bar), Some(panel))
        } else {
            (None, None)
        };

        Self { locale: config.locale, style, circular, bar, panel }
    }

    pub fn circular(&self) -> &Element {
        &self.circular
    }

    pub fn bar(&self) -> Option<&Element> {
        self.bar.as_ref()
    }

    pub fn panel(&self) -> Option<&Element> {
        self.panel.as_ref()
    }

    /// Pushes `record` into every mounted surface. Missing elements are skipped.
    pub fn render(&self, record: &WeatherRecord) {
        let captions = Captions::for_locale(self.locale);
        let clock = format_clock(record.timestamp);

        render_circular(&self.circular, record, &captions, &clock);
        if let Some(bar) = &self.bar {
            render_bar(bar, record, &captions);
        }
        if let Some(panel) = &self.panel {
            render_panel(panel, record, &captions, &clock);
        }
    }

    /// Detaches every surface and the style element from the container.
    pub fn unmount(&self) {
        self.circular.remove();
        if let Some(bar) = &self.bar {
            bar.remove();
        }
        if let Some(panel) = &self.panel {
            panel.remove();
        }
        self.style.remove();
    }
}

fn set(root: &Element, name: &str, text: impl Into<String>) {
    if let Some(el) = root.find(name) {
        el.set_text(text);
    }
}

fn build_circular(theme: Theme, position: Position, captions: &Captions) -> Element {
    let root = Element::new("circular-weather-widget");
    match position {
        Position::TopRight => {
            root.set_style("right", EDGE_OFFSET);
            root.set_style("top", EDGE_OFFSET);
        }
        Position::TopLeft => {
            root.set_style("left", EDGE_OFFSET);
            root.set_style("top", EDGE_OFFSET);
        }
        Position::BottomRight => {
            root.set_style("right", EDGE_OFFSET);
            root.set_style("bottom", EDGE_OFFSET);
        }
        Position::BottomLeft => {
            root.set_style("left", EDGE_OFFSET);
            root.set_style("bottom", EDGE_OFFSET);
        }
    }

    let circle = root.append_new("weather-circle");
    circle.set_style("background", theme.background());
    let content = circle.append_new("weather-content");
    for name in ["weather-icon", "weather-temp", "weather-location"] {
        content.append_new(name);
    }

    let details = root.append_new("weather-details");
    details.set_style("background", theme.background());
    details.append_new("details-condition");
    let grid = details.append_new("details-grid");
    for name in ["details-humidity", "details-wind", "details-range", "details-air"] {
        grid.append_new(name);
    }
    details
        .append_new("details-update")
        .set_text(format!("{}: --:--", captions.updated));

    root
}

fn render_circular(root: &Element, record: &WeatherRecord, captions: &Captions, clock: &str) {
    set(root, "weather-icon", &record.icon);
    set(root, "weather-temp", &record.temperature);
    set(root, "weather-location", &record.location);
    set(root, "details-condition", &record.condition);
    set(root, "details-humidity", format!("{}: {}", captions.humidity, record.humidity));
    set(root, "details-wind", format!("{}: {}", captions.wind, record.wind_speed));
    set(root, "details-range", format!("{}: {}", captions.temperature, record.temp_range));
    set(root, "details-air", format!("{}: {}", captions.air, record.air_quality_level()));
    set(root, "details-update", format!("{}: {clock}", captions.updated));
}

fn build_bar() -> Element {
    let root = Element::new("weather-bar");
    root.set_style("top", "0");
    root.set_style("left", "0");

    let left = root.append_new("bar-left");
    left.append_new("bar-icon");
    let info = left.append_new("bar-info");
    info.append_new("bar-temp");
    info.append_new("bar-location");
    root.append_new("bar-details");

    root
}

fn render_bar(root: &Element, record: &WeatherRecord, captions: &Captions) {
    set(root, "bar-icon", &record.icon);
    set(root, "bar-temp", &record.temperature);
    set(root, "bar-location", &record.location);
    set(
        root,
        "bar-details",
        format!("{} | {}: {}", record.condition, captions.humidity, record.humidity),
    );
}

fn build_panel(theme: Theme, captions: &Captions) -> Element {
    let root = Element::new("mobile-details");
    let content = root.append_new("mobile-details-content");
    content.set_style("background", theme.background());
    content.append_new("mobile-icon");
    content.append_new("mobile-condition");

    let info = content.append_new("mobile-info");
    for (label, value) in [
        (captions.temperature, "mobile-temp"),
        (captions.humidity, "mobile-humidity"),
        (captions.wind, "mobile-wind"),
        (captions.air_quality, "mobile-air"),
    ] {
        let item = info.append_new("mobile-info-item");
        item.append_new("mobile-info-label").set_text(label);
        item.append_new(value);
    }
    content.append_new("mobile-update-time");

    root
}

fn render_panel(root: &Element, record: &WeatherRecord, captions: &Captions, clock: &str) {
    set(root, "mobile-icon", &record.icon);
    set(root, "mobile-condition", &record.condition);
    set(root, "mobile-temp", &record.temperature);
    set(root, "mobile-humidity", &record.humidity);
    set(root, "mobile-wind", &record.wind_speed);
    set(root, "mobile-air", record.air_quality_level());
    set(root, "mobile-update-time", format!("{}: {clock}", captions.updated));
}
