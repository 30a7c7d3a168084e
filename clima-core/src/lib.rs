//! Core library for the `clima` weather dashboard.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - City resolution from free text, device position or coordinates
//! - Weather and forecast retrieval behind a provider abstraction
//! - Recent cities, search debouncing and the dashboard state
//!
//! It is used by `clima-cli`, but can also be reused by other front ends.

pub mod config;
pub mod dashboard;
pub mod debounce;
pub mod derived;
pub mod error;
pub mod fallback;
pub mod geolocation;
pub mod model;
pub mod popular;
pub mod provider;
pub mod recent;
pub mod resolver;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use dashboard::{AppState, Dashboard, Status};
pub use error::{FetchError, LocationError, WeatherError};
pub use geolocation::{DeviceLocator, FixedLocator, Geolocation, UnsupportedLocator};
pub use model::{CityIdentity, Condition, Coordinates, CurrentWeather, ForecastEntry};
pub use provider::{WeatherProvider, provider_from_config};
pub use recent::{FileStore, MemoryStore, RecentCities};
pub use resolver::Resolver;
