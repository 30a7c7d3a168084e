//! Location & weather resolver.
//!
//! Query flow:  short query → popular list | geocoding → local popular filter
//! Device flow: position + reverse geocoding → synthetic identity → Madrid

use async_trait::async_trait;
use tracing::{info, warn};

use crate::{
    error::{FetchError, LocationError, WeatherError},
    fallback::{Attempt, FallbackChain, Strategy},
    geolocation::Geolocation,
    model::{CityIdentity, Coordinates, CurrentWeather, ForecastEntry, WeatherLocator},
    popular::{filter_popular, popular_cities},
    provider::{GEOCODE_LIMIT, WeatherProvider},
};

/// Queries shorter than this (in characters) never reach the network.
pub const MIN_QUERY_CHARS: usize = 2;

/// Name given to a located device whose place name could not be looked up.
pub const SYNTHETIC_LOCATION_NAME: &str = "Tu ubicación";

/// 3-hour readings per day in the upstream forecast series.
pub const SAMPLES_PER_DAY: usize = 8;
pub const FORECAST_DAYS: usize = 5;

/// City used when the device cannot provide a position at all.
pub fn default_city() -> CityIdentity {
    CityIdentity::new("Madrid", "ES", 40.4168, -3.7038)
}

pub fn synthetic_identity(coords: Coordinates) -> CityIdentity {
    CityIdentity::new(SYNTHETIC_LOCATION_NAME, "", coords.lat, coords.lon)
}

/// One reading per day: every 8th entry of the series, first five days.
pub fn downsample_daily(series: Vec<ForecastEntry>) -> Vec<ForecastEntry> {
    series
        .into_iter()
        .step_by(SAMPLES_PER_DAY)
        .take(FORECAST_DAYS)
        .collect()
}

struct ShortQuery;

#[async_trait]
impl Strategy<String, Vec<CityIdentity>> for ShortQuery {
    fn name(&self) -> &'static str {
        "short-query"
    }

    async fn attempt(&self, query: &String) -> Attempt<Vec<CityIdentity>> {
        if query.chars().count() < MIN_QUERY_CHARS {
            Attempt::Resolved(popular_cities())
        } else {
            Attempt::NotApplicable
        }
    }
}

struct RemoteGeocode<'p> {
    provider: &'p dyn WeatherProvider,
}

#[async_trait]
impl<'p> Strategy<String, Vec<CityIdentity>> for RemoteGeocode<'p> {
    fn name(&self) -> &'static str {
        "remote-geocode"
    }

    async fn attempt(&self, query: &String) -> Attempt<Vec<CityIdentity>> {
        match self.provider.geocode_direct(query, GEOCODE_LIMIT).await {
            Ok(candidates) => Attempt::Resolved(candidates),
            Err(err) => {
                warn!(query = %query, error = %err, "geocoding failed, filtering popular cities");
                Attempt::NotApplicable
            }
        }
    }
}

type DeviceOutcome = Result<Coordinates, LocationError>;

struct ReverseGeocoded<'p> {
    provider: &'p dyn WeatherProvider,
}

#[async_trait]
impl<'p> Strategy<DeviceOutcome, CityIdentity> for ReverseGeocoded<'p> {
    fn name(&self) -> &'static str {
        "reverse-geocode"
    }

    async fn attempt(&self, outcome: &DeviceOutcome) -> Attempt<CityIdentity> {
        let Ok(coords) = *outcome else {
            return Attempt::NotApplicable;
        };

        match self.provider.geocode_reverse(coords).await {
            Ok(Some(place)) => Attempt::Resolved(CityIdentity {
                lat: coords.lat,
                lon: coords.lon,
                ..place
            }),
            Ok(None) | Err(_) => {
                let err = WeatherError::ReverseGeocodeFailed {
                    lat: coords.lat,
                    lon: coords.lon,
                };
                warn!(error = %err, "using coordinates without a place name");
                Attempt::NotApplicable
            }
        }
    }
}

struct SyntheticFromCoordinates;

#[async_trait]
impl Strategy<DeviceOutcome, CityIdentity> for SyntheticFromCoordinates {
    fn name(&self) -> &'static str {
        "synthetic-identity"
    }

    async fn attempt(&self, outcome: &DeviceOutcome) -> Attempt<CityIdentity> {
        match outcome {
            Ok(coords) => Attempt::Resolved(synthetic_identity(*coords)),
            Err(_) => Attempt::NotApplicable,
        }
    }
}

fn fallback_to_default_city(outcome: &DeviceOutcome) -> CityIdentity {
    if let Err(reason) = outcome {
        let err = WeatherError::LocationUnavailable(*reason);
        warn!(error = %err, "falling back to default city");
    }
    default_city()
}

#[derive(Debug)]
pub struct Resolver {
    provider: Box<dyn WeatherProvider>,
}

impl Resolver {
    pub fn new(provider: Box<dyn WeatherProvider>) -> Self {
        Self { provider }
    }

    fn query_chain(&self) -> FallbackChain<'_, String, Vec<CityIdentity>> {
        FallbackChain::new("query", |query: &String| filter_popular(query))
            .then(ShortQuery)
            .then(RemoteGeocode {
                provider: self.provider.as_ref(),
            })
    }

    fn device_chain(&self) -> FallbackChain<'_, DeviceOutcome, CityIdentity> {
        FallbackChain::new("device", fallback_to_default_city)
            .then(ReverseGeocoded {
                provider: self.provider.as_ref(),
            })
            .then(SyntheticFromCoordinates)
    }

    /// Ranked city candidates for free text, best match first. Never fails.
    pub async fn resolve_by_query(&self, text: &str) -> Vec<CityIdentity> {
        self.query_chain().run(&text.to_string()).await
    }

    /// The device's city. Every failure resolves to a usable identity.
    pub async fn resolve_by_device_location(&self, geolocation: &Geolocation) -> CityIdentity {
        let outcome = geolocation.request_position().await.map(|p| p.coords);
        let identity = self.device_chain().run(&outcome).await;
        info!(city = %identity.name, country = %identity.country, "device location resolved");
        identity
    }

    /// The city at explicit coordinates, named by reverse geocoding when possible.
    pub async fn resolve_by_coordinates(&self, coords: Coordinates) -> CityIdentity {
        self.device_chain().run(&Ok(coords)).await
    }

    pub async fn fetch_weather(&self, identity: &CityIdentity) -> Result<CurrentWeather, FetchError> {
        self.provider
            .current_weather(&WeatherLocator::from(identity))
            .await
            .map_err(|err| {
                warn!(city = %identity.name, error = %err, "current weather fetch failed");
                FetchError::from(err)
            })
    }

    pub async fn fetch_forecast(
        &self,
        identity: &CityIdentity,
    ) -> Result<Vec<ForecastEntry>, FetchError> {
        let series = self
            .provider
            .forecast_series(identity.coordinates())
            .await
            .map_err(|err| {
                warn!(city = %identity.name, error = %err, "forecast fetch failed");
                FetchError::from(err)
            })?;

        Ok(downsample_daily(series))
    }
}
