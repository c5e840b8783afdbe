//! Core library for the weather island widget.
//!
//! This crate defines:
//! - Widget configuration
//! - Location resolution and Open-Meteo fetching
//! - Normalization of raw payloads into display records, and their cache
//! - The view surfaces, their interactions and the refresh scheduler
//!
//! It is used by `island-cli`, but any front end that can draw an
//! [`view::Element`] tree can mount a [`WeatherIsland`].

pub mod cache;
pub mod config;
pub mod display;
pub mod fetch;
pub mod http;
pub mod icon;
pub mod location;
pub mod model;
pub mod parser;
pub mod scheduler;
pub mod view;
pub mod widget;

pub use cache::{FileStore, KeyValueStore, MemoryStore, WeatherCache};
pub use config::{Config, Endpoints, Position, Theme};
pub use http::FetchError;
pub use icon::{IconMap, Locale};
pub use location::{LocationProvider, LocationResolver};
pub use model::{CacheEntry, Coordinates, ResolvedLocation, WeatherRecord};
pub use widget::WeatherIsland;
