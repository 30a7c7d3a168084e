use crate::{
    Config,
    error::WeatherError,
    model::{CityIdentity, Coordinates, CurrentWeather, ForecastEntry, WeatherLocator},
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

/// Candidates requested from direct geocoding.
pub const GEOCODE_LIMIT: u8 = 5;

/// The upstream weather/geocoding service.
///
/// Any non-success status, transport failure or malformed body comes back as
/// an error; implementations never retry.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Free text to ranked candidate cities, best match first.
    async fn geocode_direct(&self, query: &str, limit: u8)
    -> Result<Vec<CityIdentity>, WeatherError>;

    /// Coordinates to the nearest named place, if any.
    async fn geocode_reverse(
        &self,
        coords: Coordinates,
    ) -> Result<Option<CityIdentity>, WeatherError>;

    async fn current_weather(
        &self,
        locator: &WeatherLocator,
    ) -> Result<CurrentWeather, WeatherError>;

    /// The raw 3-hour forecast series, oldest first.
    async fn forecast_series(&self, coords: Coordinates)
    -> Result<Vec<ForecastEntry>, WeatherError>;
}

/// Construct the OpenWeather provider from config.
pub fn provider_from_config(config: &Config) -> Box<dyn WeatherProvider> {
    Box::new(OpenWeatherProvider::with_base_url(
        config.api_key(),
        config.base_url.clone(),
    ))
}
