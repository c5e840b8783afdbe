use std::sync::Arc;

use anyhow::Context;
use chrono::{Local, TimeZone};
use clap::{Parser, Subcommand};
use inquire::{CustomType, Select};
use island_core::{
    Config, FileStore, Locale, MemoryStore, Position, Theme, WeatherCache, WeatherIsland,
    view::Element,
};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-island", version, about = "Weather island widget in the terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Refresh once and print every surface.
    Show {
        /// Override the configured locale ("zh" or "en").
        #[arg(long)]
        locale: Option<String>,

        /// Keep the cache in memory instead of the cache directory.
        #[arg(long)]
        no_persist: bool,
    },

    /// Keep refreshing on the configured interval until Ctrl-C.
    Watch {
        #[arg(long)]
        locale: Option<String>,
    },

    /// Interactively edit theme, position, refresh interval and locale.
    Configure,

    /// Delete the cached weather record.
    ClearCache,

    /// Print the config file location.
    ConfigPath,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Show { locale, no_persist } => {
                let config = load_config(locale.as_deref())?;
                let body = Element::new("body");
                let island = if no_persist {
                    WeatherIsland::mount_with_store(&body, config, Arc::new(MemoryStore::new()))?
                } else {
                    WeatherIsland::mount(&body, config)?
                };

                let record = island.refresh().await;
                print!("{}", render::draw(&body));
                println!("{}", updated_line(record.timestamp));
                island.destroy();
            }
            Command::Watch { locale } => {
                let config = load_config(locale.as_deref())?;
                watch(config).await?;
            }
            Command::Configure => configure()?,
            Command::ClearCache => {
                let config = Config::load()?;
                let dir = config.resolved_cache_dir()?;
                WeatherCache::new(Arc::new(FileStore::new(&dir)), config.refresh_interval())
                    .clear()
                    .with_context(|| format!("Failed to clear cache in {}", dir.display()))?;
                println!("Cache cleared.");
            }
            Command::ConfigPath => {
                println!("{}", Config::config_file_path()?.display());
            }
        }

        Ok(())
    }
}

fn load_config(locale: Option<&str>) -> anyhow::Result<Config> {
    let mut config = Config::load()?;
    if let Some(locale) = locale {
        config.locale = Locale::try_from(locale)?;
    }
    Ok(config)
}

fn updated_line(timestamp: i64) -> String {
    match Local.timestamp_millis_opt(timestamp).single() {
        Some(t) => format!("(fetched {})", t.format("%Y-%m-%d %H:%M:%S")),
        None => String::new(),
    }
}

async fn watch(config: Config) -> anyhow::Result<()> {
    let (body, island) = WeatherIsland::mount_detached(config)?;
    let mut updates = island.subscribe();
    island.start();

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                tracing::debug!("Redrawing surfaces");
                // Clear screen, cursor home.
                print!("\x1b[2J\x1b[H{}", render::draw(&body));
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    island.destroy();
    Ok(())
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    config.theme = Select::new("Theme:", Theme::all().to_vec())
        .with_starting_cursor(index_of(Theme::all(), &config.theme))
        .prompt()?;
    config.position = Select::new("Position:", Position::all().to_vec())
        .with_starting_cursor(index_of(Position::all(), &config.position))
        .prompt()?;
    config.locale = Select::new("Locale:", Locale::all().to_vec())
        .with_starting_cursor(index_of(Locale::all(), &config.locale))
        .prompt()?;

    let minutes: u64 = CustomType::new("Refresh interval (minutes):")
        .with_default(config.refresh_interval / 60_000)
        .with_error_message("Please enter a whole number of minutes")
        .prompt()?;
    config.refresh_interval = minutes.max(1) * 60_000;

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

fn index_of<T: PartialEq>(all: &[T], current: &T) -> usize {
    all.iter().position(|v| v == current).unwrap_or(0)
}
