//! In-crate test doubles.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use crate::{
    error::WeatherError,
    model::{CityIdentity, Condition, Coordinates, CurrentWeather, ForecastEntry, WeatherLocator},
    provider::WeatherProvider,
};

#[derive(Debug, Clone)]
pub(crate) enum Reply<T> {
    Ok(T),
    Status(u16),
}

impl<T> Default for Reply<T> {
    fn default() -> Self {
        Reply::Status(503)
    }
}

impl<T: Clone> Reply<T> {
    fn get(&self) -> Result<T, WeatherError> {
        match self {
            Reply::Ok(value) => Ok(value.clone()),
            Reply::Status(code) => Err(WeatherError::CityNotFound {
                status: Some(*code),
            }),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub(crate) struct StubProvider {
    pub direct: Reply<Vec<CityIdentity>>,
    pub reverse: Reply<Option<CityIdentity>>,
    pub current: Reply<CurrentWeather>,
    pub forecast: Reply<Vec<ForecastEntry>>,
    pub calls: Arc<AtomicUsize>,
}

impl StubProvider {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl WeatherProvider for StubProvider {
    async fn geocode_direct(
        &self,
        _query: &str,
        _limit: u8,
    ) -> Result<Vec<CityIdentity>, WeatherError> {
        self.hit();
        self.direct.get()
    }

    async fn geocode_reverse(
        &self,
        _coords: Coordinates,
    ) -> Result<Option<CityIdentity>, WeatherError> {
        self.hit();
        self.reverse.get()
    }

    async fn current_weather(
        &self,
        _locator: &WeatherLocator,
    ) -> Result<CurrentWeather, WeatherError> {
        self.hit();
        self.current.get()
    }

    async fn forecast_series(
        &self,
        _coords: Coordinates,
    ) -> Result<Vec<ForecastEntry>, WeatherError> {
        self.hit();
        self.forecast.get()
    }
}

pub(crate) fn sample_weather(name: &str) -> CurrentWeather {
    CurrentWeather {
        location_name: name.to_string(),
        country: "ES".to_string(),
        temperature_c: 21.4,
        feels_like_c: 20.6,
        humidity_pct: 40,
        pressure_hpa: 1018,
        wind_speed_mps: 3.0,
        condition: Condition::Clear,
        description: "cielo claro".to_string(),
        visibility_m: Some(10_000),
        cloudiness_pct: Some(0),
        observed_at: DateTime::<Utc>::UNIX_EPOCH,
        sunrise: None,
        sunset: None,
    }
}

/// `len` consecutive 3-hour entries; `temp_max_c` carries the index.
pub(crate) fn three_hour_series(len: usize) -> Vec<ForecastEntry> {
    (0..len)
        .map(|i| ForecastEntry {
            timestamp: 1_760_875_200 + (i as i64) * 3 * 3600,
            temp_min_c: 10.0,
            temp_max_c: i as f64,
            condition: Condition::Clouds,
            description: "nubes".to_string(),
            text_timestamp: String::new(),
        })
        .collect()
}
