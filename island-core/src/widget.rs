//! The widget instance: one refresh pipeline wired to its own surfaces.

use chrono::Utc;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;

use crate::{
    cache::{FileStore, KeyValueStore, WeatherCache},
    config::Config,
    display::DisplayController,
    fetch::WeatherFetcher,
    http::{FetchError, build_client},
    location::LocationResolver,
    model::{Payload, WeatherRecord},
    parser::{location_unresolved, parse, unknown_location},
    scheduler::{RefreshScheduler, SchedulerHandle},
    view::{Element, EventKind, Listener},
};

/// Everything a refresh cycle needs, shared with listeners and the scheduler.
struct Pipeline {
    config: Config,
    cache: WeatherCache,
    resolver: LocationResolver,
    fetcher: WeatherFetcher,
    display: DisplayController,
    latest: watch::Sender<Option<WeatherRecord>>,
}

impl Pipeline {
    async fn run(&self) -> WeatherRecord {
        let now = Utc::now().timestamp_millis();

        if let Some(entry) = self.cache.fresh(now) {
            tracing::info!("Using cached weather from {}", entry.last_updated);
            self.show(&entry.data);
            return entry.data;
        }

        let record = self.fetch_record(now).await;
        self.show(&record);
        record
    }

    async fn fetch_record(&self, now: i64) -> WeatherRecord {
        let locale = self.config.locale;
        let location = self.resolver.resolve().await;

        let Some(coordinates) = location.coordinates.filter(|_| location.is_resolved()) else {
            return parse(
                &Payload::error(location_unresolved(locale)),
                now,
                unknown_location(locale),
                None,
                locale,
            );
        };

        match self.fetcher.fetch(coordinates).await {
            Ok(payload) => {
                let record =
                    parse(&Payload::Weather(payload), now, &location.name, Some(coordinates), locale);
                if let Err(e) = self.cache.write(&record, now) {
                    tracing::warn!("Failed to cache weather: {e}");
                }
                record
            }
            Err(e) => {
                tracing::error!("Weather fetch failed: {e}");
                let failed_at = Utc::now().timestamp_millis();
                parse(&Payload::error(e.to_string()), failed_at, &location.name, None, locale)
            }
        }
    }

    fn show(&self, record: &WeatherRecord) {
        self.display.render(record);
        self.latest.send_replace(Some(record.clone()));
    }
}

/// An owned weather widget mounted into one container.
///
/// Instances share nothing, so several can live side by side.
pub struct WeatherIsland {
    pipeline: Arc<Pipeline>,
    listeners: Mutex<Vec<Listener>>,
    scheduler: Mutex<Option<SchedulerHandle>>,
}

impl std::fmt::Debug for WeatherIsland {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherIsland")
            .field("config", &self.pipeline.config)
            .field("listeners", &self.listeners.lock().len())
            .finish()
    }
}

impl WeatherIsland {
    /// Mounts into `container` with a file-backed cache in the configured
    /// cache directory.
    pub fn mount(container: &Element, config: Config) -> anyhow::Result<Self> {
        let store = Arc::new(FileStore::new(config.resolved_cache_dir()?));
        Ok(Self::mount_with_store(container, config, store)?)
    }

    /// Mounts into a fresh `body` element.
    pub fn mount_detached(config: Config) -> anyhow::Result<(Element, Self)> {
        let body = Element::new("body");
        let island = Self::mount(&body, config)?;
        Ok((body, island))
    }

    pub fn mount_with_store(
        container: &Element,
        config: Config,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self, FetchError> {
        let http = build_client()?;
        let cache = WeatherCache::new(store, config.refresh_interval());
        let resolver = LocationResolver::from_endpoints(&http, &config.endpoints);
        let fetcher = WeatherFetcher::new(http, &config.endpoints);
        let display = DisplayController::mount(container, &config);
        let (latest, _) = watch::channel(None);

        let pipeline = Arc::new(Pipeline { config, cache, resolver, fetcher, display, latest });
        let listeners = wire_interactions(&pipeline);

        Ok(Self {
            pipeline,
            listeners: Mutex::new(listeners),
            scheduler: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &Config {
        &self.pipeline.config
    }

    pub fn display(&self) -> &DisplayController {
        &self.pipeline.display
    }

    pub fn cache(&self) -> &WeatherCache {
        &self.pipeline.cache
    }

    /// Runs one refresh cycle and returns the rendered record. Never fails;
    /// problems surface as an error record.
    pub async fn refresh(&self) -> WeatherRecord {
        self.pipeline.run().await
    }

    /// Receiver of the most recently rendered record.
    pub fn subscribe(&self) -> watch::Receiver<Option<WeatherRecord>> {
        self.pipeline.latest.subscribe()
    }

    /// Refreshes now and then every `refresh_interval`. Restarting replaces
    /// the previous schedule.
    ///
    /// Outside a Tokio runtime nothing is scheduled and a warning is logged.
    pub fn start(&self) {
        if tokio::runtime::Handle::try_current().is_err() {
            tracing::warn!("Not starting the refresh scheduler outside a Tokio runtime");
            return;
        }

        let pipeline = self.pipeline.clone();
        let handle = RefreshScheduler::start(self.pipeline.config.refresh_interval(), move || {
            let pipeline = pipeline.clone();
            async move {
                pipeline.run().await;
            }
        });

        if let Some(previous) = self.scheduler.lock().replace(handle) {
            previous.cancel();
        }
    }

    /// Removes the surfaces and style element, detaches listeners and stops
    /// the scheduler. Cycles already in flight still finish.
    pub fn destroy(&self) {
        if let Some(handle) = self.scheduler.lock().take() {
            handle.cancel();
        }
        for listener in self.listeners.lock().drain(..) {
            listener.dispose();
        }
        self.pipeline.display.unmount();
    }
}

fn wire_interactions(pipeline: &Arc<Pipeline>) -> Vec<Listener> {
    let mut listeners = Vec::new();
    let display = &pipeline.display;

    let circle = display.circular().find("weather-circle");
    let details = display.circular().find("weather-details");
    if let (Some(circle), Some(details)) = (circle, details) {
        let (d, c) = (details.clone(), circle.clone());
        listeners.push(circle.on(EventKind::PointerEnter, move |_| {
            d.add_class("active");
            c.set_style("transform", "scale(1.05)");
        }));

        let (d, c) = (details, circle.clone());
        listeners.push(circle.on(EventKind::PointerLeave, move |_| {
            d.remove_class("active");
            c.set_style("transform", "scale(1)");
        }));

        // A weak handle keeps the circle's own listener from owning the pipeline.
        let weak = Arc::downgrade(pipeline);
        let c = circle.clone();
        listeners.push(circle.on(EventKind::Click, move |_| {
            let Some(pipeline) = weak.upgrade() else {
                return;
            };
            let Ok(runtime) = tokio::runtime::Handle::try_current() else {
                tracing::warn!("Ignoring refresh click outside a Tokio runtime");
                return;
            };
            let circle = c.clone();
            circle.add_class("loading");
            runtime.spawn(async move {
                pipeline.run().await;
                circle.remove_class("loading");
            });
        }));
    }

    if let (Some(bar), Some(panel)) = (display.bar(), display.panel()) {
        let p = panel.clone();
        listeners.push(bar.on(EventKind::Click, move |_| p.add_class("active")));

        let p = panel.clone();
        listeners.push(panel.on(EventKind::Click, move |event| {
            if event.target().ptr_eq(&p) {
                p.remove_class("active");
            }
        }));

        if let Some(content) = panel.find("mobile-details-content") {
            listeners.push(content.on(EventKind::Click, |event| event.stop_propagation()));
        }
    }

    listeners
}
