//! End-to-end refresh cycles against a mock server standing in for every
//! outbound service.

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use island_core::{
    Config, Endpoints, Locale, MemoryStore, WeatherIsland, WeatherRecord,
    model::NOT_AVAILABLE,
    view::{Element, EventKind},
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn beijing_geoip() -> serde_json::Value {
    serde_json::json!({
        "ip": "1.2.3.4",
        "location": {
            "city": "北京市",
            "country_name": "中国",
            "latitude": "39.9",
            "longitude": "116.4",
            "province": "北京市"
        }
    })
}

fn forecast() -> serde_json::Value {
    serde_json::json!({
        "current": {
            "temperature_2m": 23.6,
            "weather_code": 3,
            "relative_humidity_2m": 65,
            "wind_speed_10m": 11.6
        },
        "daily": {
            "temperature_2m_max": [28],
            "temperature_2m_min": [20]
        }
    })
}

async fn mount_geoip(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/cn"))
        .respond_with(ResponseTemplate::new(200).set_body_json(beijing_geoip()))
        .mount(server)
        .await;
}

async fn mount_air_quality(server: &MockServer, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path("/v1/air-quality"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "current": { "european_aqi": 35 } })),
        )
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn island(server: &MockServer, locale: Locale) -> (Element, WeatherIsland, Arc<MemoryStore>) {
    let body = Element::new("body");
    let store = Arc::new(MemoryStore::new());
    let config = Config { locale, endpoints: Endpoints::with_base(&server.uri()), ..Config::default() };
    let island = WeatherIsland::mount_with_store(&body, config, store.clone()).unwrap();
    (body, island, store)
}

fn text(body: &Element, name: &str) -> String {
    body.find(name).map(|e| e.text()).unwrap_or_default()
}

fn assert_all_metrics_missing(record: &WeatherRecord) {
    assert_eq!(record.temperature, NOT_AVAILABLE);
    assert_eq!(record.temp_range, NOT_AVAILABLE);
    assert_eq!(record.humidity, NOT_AVAILABLE);
    assert_eq!(record.wind_speed, NOT_AVAILABLE);
    assert_eq!(record.air_quality, NOT_AVAILABLE);
}

#[tokio::test]
async fn full_cycle_renders_and_caches() {
    let server = MockServer::start().await;
    mount_geoip(&server).await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast()))
        .expect(1)
        .mount(&server)
        .await;
    mount_air_quality(&server, 1).await;

    let (body, island, _) = island(&server, Locale::Zh);
    let record = island.refresh().await;

    assert_eq!(record.location, "北京市");
    assert_eq!(record.temperature, "24°C");
    assert_eq!(record.condition, "多云");
    assert_eq!(record.humidity, "65%");
    assert_eq!(record.wind_speed, "12 km/h");
    assert_eq!(record.temp_range, "20～28°C");
    assert_eq!(record.air_quality, "良 (35)");

    assert_eq!(text(&body, "weather-temp"), "24°C");
    assert_eq!(text(&body, "details-air"), "空气: 良");
    assert_eq!(text(&body, "bar-details"), "多云 | 湿度: 65%");

    let cached = island.cache().read().expect("successful fetch is cached");
    assert_eq!(cached.data, record);
    assert_eq!(cached.last_updated, record.timestamp);

    // Second refresh inside the interval is served from the cache; the
    // forecast mock's `expect(1)` verifies no second call on drop.
    let again = island.refresh().await;
    assert_eq!(again, record);
}

#[tokio::test]
async fn english_locale_labels() {
    let server = MockServer::start().await;
    mount_geoip(&server).await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast()))
        .mount(&server)
        .await;
    mount_air_quality(&server, 1).await;

    let (_, island, _) = island(&server, Locale::En);
    let record = island.refresh().await;

    assert_eq!(record.condition, "cloudy");
    assert_eq!(record.air_quality, "good (35)");
}

#[tokio::test]
async fn unresolved_location_skips_weather_provider() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cn"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ipip"))
        .respond_with(ResponseTemplate::new(200).set_body_string("unexpected page"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast()))
        .expect(0)
        .mount(&server)
        .await;

    let (body, island, _) = island(&server, Locale::En);
    let record = island.refresh().await;

    assert_eq!(record.condition, "unable to determine location");
    assert_all_metrics_missing(&record);
    assert_eq!(text(&body, "details-condition"), "unable to determine location");
    assert!(island.cache().read().is_none());
}

#[tokio::test]
async fn weather_timeout_becomes_the_condition() {
    let server = MockServer::start().await;
    mount_geoip(&server).await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(forecast())
                .set_delay(Duration::from_secs(6)),
        )
        .mount(&server)
        .await;
    mount_air_quality(&server, 0).await;

    let (_, island, _) = island(&server, Locale::Zh);
    let record = island.refresh().await;

    assert_eq!(record.condition, "weather request timed out after 4s");
    assert_eq!(record.location, "北京市");
    assert_all_metrics_missing(&record);
}

#[tokio::test]
async fn weather_status_error_becomes_the_condition() {
    let server = MockServer::start().await;
    mount_geoip(&server).await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (_, island, _) = island(&server, Locale::Zh);
    let record = island.refresh().await;

    assert_eq!(record.condition, "weather request failed with status 500 Internal Server Error");
    assert_eq!(record.icon, island_core::IconMap::UNKNOWN);
}

#[tokio::test]
async fn stale_cache_triggers_new_network_calls() {
    let server = MockServer::start().await;
    mount_geoip(&server).await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast()))
        .expect(1)
        .mount(&server)
        .await;
    mount_air_quality(&server, 1).await;

    let (_, island, _) = island(&server, Locale::Zh);
    let old = island_core::parser::parse(
        &island_core::model::Payload::error("old"),
        0,
        "旧",
        None,
        Locale::Zh,
    );
    let interval = i64::try_from(island.config().refresh_interval).unwrap();
    island
        .cache()
        .write(&old, Utc::now().timestamp_millis() - interval - 1)
        .unwrap();

    let record = island.refresh().await;

    assert_eq!(record.location, "北京市");
    assert_eq!(island.cache().read().unwrap().data, record);
}

#[tokio::test]
async fn missing_air_quality_degrades_one_field() {
    let server = MockServer::start().await;
    mount_geoip(&server).await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/air-quality"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(7)))
        .mount(&server)
        .await;

    let (body, island, _) = island(&server, Locale::Zh);
    let record = island.refresh().await;

    assert_eq!(record.air_quality, NOT_AVAILABLE);
    assert_eq!(record.temperature, "24°C");
    assert_eq!(text(&body, "mobile-air"), NOT_AVAILABLE);
}

#[tokio::test]
async fn scheduler_renders_on_start() {
    let server = MockServer::start().await;
    mount_geoip(&server).await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast()))
        .mount(&server)
        .await;
    mount_air_quality(&server, 1).await;

    let (body, island, _) = island(&server, Locale::Zh);
    let mut updates = island.subscribe();

    island.start();
    tokio::time::timeout(Duration::from_secs(10), updates.changed())
        .await
        .expect("first cycle renders")
        .unwrap();

    assert_eq!(text(&body, "weather-location"), "北京市");
    island.destroy();
    assert!(body.children().is_empty());
}

#[tokio::test]
async fn circle_click_refreshes_with_loading_indicator() {
    let server = MockServer::start().await;
    mount_geoip(&server).await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(forecast())
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_air_quality(&server, 1).await;

    let (body, island, _) = island(&server, Locale::Zh);
    let circle = body.find("weather-circle").unwrap();
    let mut updates = island.subscribe();

    // Clicks on inner content bubble up to the circle.
    body.find("weather-icon").unwrap().dispatch(EventKind::Click);
    assert!(circle.has_class("loading"));

    tokio::time::timeout(Duration::from_secs(10), updates.changed())
        .await
        .expect("click refresh renders")
        .unwrap();
    tokio::task::yield_now().await;

    assert!(!circle.has_class("loading"));
    assert_eq!(text(&body, "weather-temp"), "24°C");
    island.destroy();
}
