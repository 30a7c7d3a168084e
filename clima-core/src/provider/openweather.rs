use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use std::fmt;
use tracing::{debug, warn};

use crate::{
    config::DEFAULT_BASE_URL,
    error::WeatherError,
    model::{CityIdentity, Condition, Coordinates, CurrentWeather, ForecastEntry, WeatherLocator},
};

use super::WeatherProvider;

const UNITS: &str = "metric";
const LANG: &str = "es";

#[derive(Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl fmt::Debug for OpenWeatherProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenWeatherProvider")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string())
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, WeatherError> {
        let url = format!("{}{}", self.base_url, path);

        let res = self
            .http
            .get(&url)
            .query(params)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            warn!(
                path,
                status = status.as_u16(),
                body = %truncate_body(&body),
                "OpenWeather request failed"
            );
            return Err(WeatherError::from_status(status));
        }

        debug!(path, bytes = body.len(), "OpenWeather response received");
        Ok(serde_json::from_str(&body)?)
    }
}

#[derive(Debug, Deserialize)]
struct OwPlace {
    name: String,
    #[serde(default)]
    country: String,
    state: Option<String>,
    lat: f64,
    lon: f64,
}

impl From<OwPlace> for CityIdentity {
    fn from(place: OwPlace) -> Self {
        CityIdentity {
            name: place.name,
            country: place.country,
            state: place.state,
            lat: place.lat,
            lon: place.lon,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: u8,
    pressure: u32,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    main: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Default, Deserialize)]
struct OwSys {
    #[serde(default)]
    country: String,
    sunrise: Option<i64>,
    sunset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct OwClouds {
    all: u8,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    #[serde(default)]
    name: String,
    dt: i64,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    #[serde(default)]
    sys: OwSys,
    visibility: Option<u32>,
    clouds: Option<OwClouds>,
}

#[derive(Debug, Deserialize)]
struct OwForecastMain {
    temp_min: f64,
    temp_max: f64,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwForecastMain,
    weather: Vec<OwWeather>,
    #[serde(default)]
    dt_txt: String,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastEntry>,
}

/// Condition group and description of the first `weather` element.
fn primary_condition(weather: Vec<OwWeather>) -> (Condition, String) {
    weather
        .into_iter()
        .next()
        .map(|w| (Condition::parse(&w.main), w.description))
        .unwrap_or_else(|| (Condition::Other("Unknown".to_string()), String::new()))
}

impl From<OwCurrentResponse> for CurrentWeather {
    fn from(parsed: OwCurrentResponse) -> Self {
        let (condition, description) = primary_condition(parsed.weather);

        CurrentWeather {
            location_name: parsed.name,
            country: parsed.sys.country,
            temperature_c: parsed.main.temp,
            feels_like_c: parsed.main.feels_like,
            humidity_pct: parsed.main.humidity,
            pressure_hpa: parsed.main.pressure,
            wind_speed_mps: parsed.wind.speed,
            condition,
            description,
            visibility_m: parsed.visibility,
            cloudiness_pct: parsed.clouds.map(|c| c.all),
            observed_at: unix_to_utc(parsed.dt).unwrap_or_else(Utc::now),
            sunrise: parsed.sys.sunrise.and_then(unix_to_utc),
            sunset: parsed.sys.sunset.and_then(unix_to_utc),
        }
    }
}

impl From<OwForecastEntry> for ForecastEntry {
    fn from(entry: OwForecastEntry) -> Self {
        let (condition, description) = primary_condition(entry.weather);

        ForecastEntry {
            timestamp: entry.dt,
            temp_min_c: entry.main.temp_min,
            temp_max_c: entry.main.temp_max,
            condition,
            description,
            text_timestamp: entry.dt_txt,
        }
    }
}

fn coordinate_params(coords: Coordinates) -> Vec<(&'static str, String)> {
    vec![("lat", coords.lat.to_string()), ("lon", coords.lon.to_string())]
}

fn weather_params(mut params: Vec<(&'static str, String)>) -> Vec<(&'static str, String)> {
    params.push(("units", UNITS.to_string()));
    params.push(("lang", LANG.to_string()));
    params
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn geocode_direct(
        &self,
        query: &str,
        limit: u8,
    ) -> Result<Vec<CityIdentity>, WeatherError> {
        let params = [("q", query.to_string()), ("limit", limit.to_string())];
        let places: Vec<OwPlace> = self.get_json("/geo/1.0/direct", &params).await?;

        Ok(places.into_iter().map(CityIdentity::from).collect())
    }

    async fn geocode_reverse(
        &self,
        coords: Coordinates,
    ) -> Result<Option<CityIdentity>, WeatherError> {
        let mut params = coordinate_params(coords);
        params.push(("limit", "1".to_string()));
        let places: Vec<OwPlace> = self.get_json("/geo/1.0/reverse", &params).await?;

        Ok(places.into_iter().next().map(CityIdentity::from))
    }

    async fn current_weather(
        &self,
        locator: &WeatherLocator,
    ) -> Result<CurrentWeather, WeatherError> {
        let params = match locator {
            WeatherLocator::Coordinates(coords) => coordinate_params(*coords),
            WeatherLocator::Name(name) => vec![("q", name.clone())],
        };
        let parsed: OwCurrentResponse = self
            .get_json("/data/2.5/weather", &weather_params(params))
            .await?;

        Ok(parsed.into())
    }

    async fn forecast_series(
        &self,
        coords: Coordinates,
    ) -> Result<Vec<ForecastEntry>, WeatherError> {
        let params = weather_params(coordinate_params(coords));
        let parsed: OwForecastResponse = self.get_json("/data/2.5/forecast", &params).await?;

        Ok(parsed.list.into_iter().map(ForecastEntry::from).collect())
    }
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
