use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::{Parser, Subcommand};
use clima_core::{
    CityIdentity, Config, Coordinates, Dashboard, FileStore, FixedLocator, Geolocation,
    MemoryStore, RecentCities, Resolver, UnsupportedLocator,
    debounce::{SEARCH_DEBOUNCE, debounced},
    geolocation::DeviceLocator,
    provider_from_config,
    recent::KeyValueStore,
};
use inquire::{Confirm, CustomType, Password, PasswordDisplayMode, Select};
use std::fmt;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use tracing::{debug, warn};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "clima", version, about = "Weather dashboard for the terminal")]
pub struct Cli {
    /// Without a subcommand, the dashboard opens on the device location.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show weather for the best match of a city search.
    Show {
        /// City name, e.g. "Buenos Aires".
        #[arg(required = true)]
        query: Vec<String>,
    },

    /// List city suggestions for a search.
    Search {
        /// Search text; fewer than two characters lists popular cities.
        query: Vec<String>,

        /// Choose one suggestion interactively and show its weather.
        #[arg(long)]
        pick: bool,
    },

    /// Show weather for the device location or explicit coordinates.
    Locate {
        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,

        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,
    },

    /// Suggest cities for search text read line by line from stdin.
    Suggest {
        /// Keep reading and print suggestions once typing settles.
        /// Without it, only the last line is looked up.
        #[arg(long)]
        follow: bool,
    },

    /// List recently viewed cities.
    Recent {
        /// Forget all recent cities.
        #[arg(long)]
        clear: bool,
    },

    /// Configure the API key and device location.
    Configure,
}

/// Select-list row for a city suggestion.
struct Choice(CityIdentity);

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render::suggestion_line(&self.0))
    }
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let config = Config::load()?;
        let mut dashboard = build_dashboard(&config);

        match self.command {
            None => {
                dashboard.use_device_location().await;
                print_dashboard(&dashboard);
            }
            Some(Command::Show { query }) => {
                let query = query.join(" ");
                if dashboard.submit_query(&query).await.is_some() {
                    print_dashboard(&dashboard);
                } else {
                    print!("{}", render::suggestions(&query, &[]));
                }
            }
            Some(Command::Search { query, pick }) => {
                let query = query.join(" ");
                let candidates = dashboard.suggestions(&query).await;

                if pick && !candidates.is_empty() {
                    let options = candidates.into_iter().map(Choice).collect();
                    let Choice(city) = Select::new("Ciudad:", options).prompt()?;
                    dashboard.select_city(city).await;
                    print_dashboard(&dashboard);
                } else {
                    print!("{}", render::suggestions(&query, &candidates));
                }
            }
            Some(Command::Locate { lat, lon }) => {
                match lat.zip(lon) {
                    Some((lat, lon)) => {
                        dashboard.use_coordinates(Coordinates::new(lat, lon)).await;
                    }
                    None => {
                        dashboard.use_device_location().await;
                    }
                }
                print_dashboard(&dashboard);
            }
            Some(Command::Suggest { follow }) => {
                if follow {
                    follow_stdin(&dashboard).await?;
                } else {
                    last_line_suggestions(&dashboard).await?;
                }
            }
            Some(Command::Recent { clear }) => {
                if clear {
                    dashboard.clear_recent();
                }
                print!("{}", render::recent(dashboard.recent().cities()));
            }
            Some(Command::Configure) => configure(config)?,
        }

        Ok(())
    }
}

fn build_dashboard(config: &Config) -> Dashboard {
    let locator: Box<dyn DeviceLocator> = match config.device_location {
        Some(coords) => Box::new(FixedLocator::new(coords)),
        None => Box::new(UnsupportedLocator),
    };

    let store: Box<dyn KeyValueStore> = match Config::data_dir() {
        Ok(dir) => Box::new(FileStore::new(dir)),
        Err(err) => {
            warn!(error = %err, "no data directory, recent cities will not be kept");
            Box::new(MemoryStore::default())
        }
    };

    Dashboard::new(
        Resolver::new(provider_from_config(config)),
        Geolocation::new(locator),
        RecentCities::load(store),
    )
}

fn print_dashboard(dashboard: &Dashboard) {
    print!("{}", render::dashboard(dashboard.state(), &Local::now()));
}

async fn last_line_suggestions(dashboard: &Dashboard) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last = String::new();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        last = line;
    }

    let candidates = dashboard.suggestions(&last).await;
    print!("{}", render::suggestions(&last, &candidates));
    Ok(())
}

async fn follow_stdin(dashboard: &Dashboard) -> Result<()> {
    let (tx, keystrokes) = mpsc::channel(16);

    let reader = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx.send(line).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    warn!(error = %err, "stopped reading stdin");
                    break;
                }
            }
        }
    });

    let mut settled = debounced(keystrokes, SEARCH_DEBOUNCE);
    while let Some(text) = settled.recv().await {
        debug!(query = %text, "search settled");
        let candidates = dashboard.suggestions(&text).await;
        print!("{}", render::suggestions(&text, &candidates));
    }

    reader.await.context("stdin reader task failed")?;
    Ok(())
}

fn configure(mut config: Config) -> Result<()> {
    let key = Password::new("OpenWeather API key (vacío para conservar la actual):")
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked)
        .prompt()?;
    if !key.trim().is_empty() {
        config.api_key = Some(key.trim().to_string());
    }

    let has_location = Confirm::new("¿Configurar la ubicación del dispositivo?")
        .with_default(config.device_location.is_some())
        .prompt()?;

    config.device_location = if has_location {
        let lat = CustomType::<f64>::new("Latitud:").prompt()?;
        let lon = CustomType::<f64>::new("Longitud:").prompt()?;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            bail!("Coordinates out of range: {lat}, {lon}");
        }
        Some(Coordinates::new(lat, lon))
    } else {
        None
    };

    config.save()?;
    println!(
        "Configuración guardada en {}",
        Config::config_file_path()?.display()
    );
    Ok(())
}
