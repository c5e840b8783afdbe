//! Approximate user location from IP geolocation, with a geocoding fallback
//! for providers that only return a place name.

use async_trait::async_trait;
use reqwest::{
    Client,
    header::{CACHE_CONTROL, REFERER},
};
use serde::Deserialize;
use std::{fmt::Debug, time::Duration};

use crate::{
    config::Endpoints,
    http::{FetchError, get_json, send_with_deadline},
    model::{Coordinates, ResolvedLocation},
};

const PRIMARY_DEADLINE: Duration = Duration::from_secs(4);
/// Marker preceding the location phrase in the secondary provider's text.
const IPIP_MARKER: &str = "来自于：";
/// Administrative suffixes stripped from a province before comparing it with the city.
const PROVINCE_SUFFIXES: [&str; 3] = ["省", "市", "都"];

/// One IP-geolocation source. `Ok(None)` means the provider answered but
/// had no usable name.
#[async_trait]
pub trait LocationProvider: Send + Sync + Debug {
    fn name(&self) -> &'static str;

    async fn locate(&self) -> Result<Option<ResolvedLocation>, FetchError>;
}

/// Place name to coordinates.
#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    async fn geocode(&self, place: &str) -> Result<Option<Coordinates>, FetchError>;
}

/// JSON provider (`api.myip.la`) returning province, city and coordinates.
#[derive(Debug, Clone)]
pub struct MyIpLaProvider {
    http: Client,
    url: String,
}

impl MyIpLaProvider {
    pub fn new(http: Client, url: impl Into<String>) -> Self {
        Self { http, url: url.into() }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Number {
    Float(f64),
    Text(String),
}

impl Number {
    fn value(&self) -> Option<f64> {
        match self {
            Number::Float(v) => Some(*v),
            Number::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MyIpLaResponse {
    location: Option<MyIpLaLocation>,
}

#[derive(Debug, Deserialize)]
struct MyIpLaLocation {
    #[serde(default)]
    province: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    country_name: Option<String>,
    #[serde(default)]
    latitude: Option<Number>,
    #[serde(default)]
    longitude: Option<Number>,
}

impl MyIpLaLocation {
    fn coordinates(&self) -> Option<Coordinates> {
        let latitude = self.latitude.as_ref()?.value()?;
        let longitude = self.longitude.as_ref()?.value()?;
        Some(Coordinates { latitude, longitude })
    }
}

/// Display name from province and city: the city alone when it already
/// names the province, otherwise both joined, else the country.
pub fn province_city_name(province: &str, city: &str, country: &str) -> String {
    match (province.is_empty(), city.is_empty()) {
        (false, false) => {
            let bare = PROVINCE_SUFFIXES
                .iter()
                .fold(province.to_string(), |acc, suffix| acc.replacen(*suffix, "", 1));
            if city.contains(&bare) {
                city.to_string()
            } else {
                format!("{province}{city}")
            }
        }
        (false, true) => province.to_string(),
        (true, false) => city.to_string(),
        (true, true) => country.to_string(),
    }
}

#[async_trait]
impl LocationProvider for MyIpLaProvider {
    fn name(&self) -> &'static str {
        "myip.la"
    }

    async fn locate(&self) -> Result<Option<ResolvedLocation>, FetchError> {
        let response: MyIpLaResponse =
            get_json(self.name(), self.http.get(&self.url), Some(PRIMARY_DEADLINE)).await?;

        let Some(location) = response.location else {
            return Ok(None);
        };

        let name = province_city_name(
            location.province.as_deref().unwrap_or_default(),
            location.city.as_deref().unwrap_or_default(),
            location.country_name.as_deref().unwrap_or_default(),
        );

        Ok(Some(ResolvedLocation { name, coordinates: location.coordinates() }))
    }
}

/// Plain-text provider (`myip.ipip.net`). The response is scraped for the
/// phrase after [`IPIP_MARKER`], so it never yields coordinates.
#[derive(Debug, Clone)]
pub struct IpipProvider {
    http: Client,
    url: String,
}

impl IpipProvider {
    pub fn new(http: Client, url: impl Into<String>) -> Self {
        Self { http, url: url.into() }
    }
}

/// Extracts the place name from an ipip.net line such as
/// `当前 IP：1.2.3.4  来自于：中国 浙江 杭州  电信`.
pub fn parse_ipip_text(text: &str) -> Option<String> {
    let (_, rest) = text.split_once(IPIP_MARKER)?;
    let phrase = rest.lines().next().unwrap_or_default();
    let tokens: Vec<&str> = phrase.split_whitespace().collect();

    match tokens.as_slice() {
        [] => None,
        [only] => Some((*only).to_string()),
        [_, second] => Some((*second).to_string()),
        [_, second, third, ..] => Some(format!("{second}{third}")),
    }
}

#[async_trait]
impl LocationProvider for IpipProvider {
    fn name(&self) -> &'static str {
        "ipip.net"
    }

    async fn locate(&self) -> Result<Option<ResolvedLocation>, FetchError> {
        let request = self
            .http
            .get(&self.url)
            .header(REFERER, "https://www.baidu.com/")
            .header(CACHE_CONTROL, "no-cache");
        let text = send_with_deadline(self.name(), request, None).await?;

        Ok(parse_ipip_text(&text).map(|name| ResolvedLocation { name, coordinates: None }))
    }
}

/// OpenStreetMap Nominatim search, restricted to China.
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    http: Client,
    url: String,
}

impl NominatimGeocoder {
    pub fn new(http: Client, url: impl Into<String>) -> Self {
        Self { http, url: url.into() }
    }
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: Number,
    lon: Number,
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, place: &str) -> Result<Option<Coordinates>, FetchError> {
        let request = self.http.get(&self.url).query(&[
            ("q", place),
            ("format", "json"),
            ("limit", "1"),
            ("accept-language", "zh-Hans"),
            ("countrycodes", "CN"),
        ]);
        let places: Vec<NominatimPlace> = get_json("nominatim", request, None).await?;

        Ok(places.first().and_then(|p| {
            Some(Coordinates { latitude: p.lat.value()?, longitude: p.lon.value()? })
        }))
    }
}

/// Provider chain plus geocoder. Never fails: every error is logged and the
/// next fallback is tried.
#[derive(Debug)]
pub struct LocationResolver {
    providers: Vec<Box<dyn LocationProvider>>,
    geocoder: Box<dyn Geocoder>,
}

impl LocationResolver {
    pub fn new(providers: Vec<Box<dyn LocationProvider>>, geocoder: Box<dyn Geocoder>) -> Self {
        Self { providers, geocoder }
    }

    /// Primary JSON provider, then the text provider, geocoding via Nominatim.
    pub fn from_endpoints(http: &Client, endpoints: &Endpoints) -> Self {
        Self::new(
            vec![
                Box::new(MyIpLaProvider::new(http.clone(), &endpoints.primary_geoip)),
                Box::new(IpipProvider::new(http.clone(), &endpoints.secondary_geoip)),
            ],
            Box::new(NominatimGeocoder::new(http.clone(), &endpoints.geocoding)),
        )
    }

    pub async fn resolve(&self) -> ResolvedLocation {
        for provider in &self.providers {
            match provider.locate().await {
                Ok(Some(found)) if !found.name.is_empty() => {
                    tracing::info!(provider = provider.name(), "Resolved location: {}", found.name);
                    return self.with_coordinates(found).await;
                }
                Ok(_) => tracing::debug!(provider = provider.name(), "Provider returned no location"),
                Err(e) => tracing::warn!(provider = provider.name(), "Location lookup failed: {e}"),
            }
        }

        tracing::warn!("Unable to resolve location from any provider");
        ResolvedLocation::unresolved()
    }

    async fn with_coordinates(&self, found: ResolvedLocation) -> ResolvedLocation {
        if found.coordinates.is_some() {
            return found;
        }
        let coordinates = self.geocode_with_fallback(&found.name).await;
        ResolvedLocation { coordinates, ..found }
    }

    /// Geocodes `name`; on no match retries with its first two characters,
    /// which for Chinese place names is the province.
    async fn geocode_with_fallback(&self, name: &str) -> Option<Coordinates> {
        match self.geocoder.geocode(name).await {
            Ok(Some(coordinates)) => return Some(coordinates),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!("Geocoding {name} failed: {e}");
                return None;
            }
        }

        if name.chars().count() > 2 {
            let province: String = name.chars().take(2).collect();
            match self.geocoder.geocode(&province).await {
                Ok(Some(coordinates)) => return Some(coordinates),
                Ok(None) => {}
                Err(e) => tracing::warn!("Geocoding {province} failed: {e}"),
            }
        }

        tracing::warn!("No coordinates for {name}; weather is unavailable for this area");
        None
    }
}
