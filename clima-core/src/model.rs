use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4},{:.4}", self.lat, self.lon)
    }
}

/// A resolved city. The key for every weather and forecast lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityIdentity {
    pub name: String,
    /// ISO 3166-1 alpha-2 code, or empty when unknown.
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub lat: f64,
    pub lon: f64,
}

impl CityIdentity {
    pub fn new(name: impl Into<String>, country: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            name: name.into(),
            country: country.into(),
            state: None,
            lat,
            lon,
        }
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lon)
    }

    /// Label written back into the search box when a suggestion is chosen.
    pub fn display_name(&self) -> String {
        match &self.state {
            Some(state) => format!("{}, {}", self.name, state),
            None => self.name.clone(),
        }
    }
}

/// How the upstream current-weather endpoint is addressed.
#[derive(Debug, Clone, PartialEq)]
pub enum WeatherLocator {
    Coordinates(Coordinates),
    Name(String),
}

impl From<&CityIdentity> for WeatherLocator {
    fn from(identity: &CityIdentity) -> Self {
        WeatherLocator::Coordinates(identity.coordinates())
    }
}

/// Upstream `weather[0].main` group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Condition {
    Clear,
    Clouds,
    Rain,
    Drizzle,
    Snow,
    Thunderstorm,
    Mist,
    Fog,
    Other(String),
}

impl Condition {
    pub fn parse(raw: &str) -> Self {
        match raw.to_lowercase().as_str() {
            "clear" => Condition::Clear,
            "clouds" => Condition::Clouds,
            "rain" => Condition::Rain,
            "drizzle" => Condition::Drizzle,
            "snow" => Condition::Snow,
            "thunderstorm" => Condition::Thunderstorm,
            "mist" => Condition::Mist,
            "fog" => Condition::Fog,
            _ => Condition::Other(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Condition::Clear => "Clear",
            Condition::Clouds => "Clouds",
            Condition::Rain => "Rain",
            Condition::Drizzle => "Drizzle",
            Condition::Snow => "Snow",
            Condition::Thunderstorm => "Thunderstorm",
            Condition::Mist => "Mist",
            Condition::Fog => "Fog",
            Condition::Other(raw) => raw,
        }
    }

    /// Unknown groups fall back to the clear-sky glyph.
    pub fn glyph(&self) -> &'static str {
        match self {
            Condition::Clear => "☀️",
            Condition::Clouds => "☁️",
            Condition::Rain => "🌧️",
            Condition::Drizzle => "🌦️",
            Condition::Snow => "🌨️",
            Condition::Thunderstorm => "⛈️",
            Condition::Mist | Condition::Fog => "🌫️",
            Condition::Other(_) => "☀️",
        }
    }

    /// Name of the background theme for this condition.
    pub fn theme(&self) -> &'static str {
        match self {
            Condition::Clear => "clear-sky",
            Condition::Clouds => "overcast",
            Condition::Rain | Condition::Drizzle => "rain",
            Condition::Snow => "snow",
            Condition::Thunderstorm => "storm",
            Condition::Mist | Condition::Fog => "haze",
            Condition::Other(_) => "default",
        }
    }
}

impl From<String> for Condition {
    fn from(value: String) -> Self {
        Condition::parse(&value)
    }
}

impl From<Condition> for String {
    fn from(value: Condition) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current conditions for one city, metric units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub location_name: String,
    pub country: String,
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub humidity_pct: u8,
    pub pressure_hpa: u32,
    pub wind_speed_mps: f64,
    pub condition: Condition,
    pub description: String,
    pub visibility_m: Option<u32>,
    pub cloudiness_pct: Option<u8>,
    pub observed_at: DateTime<Utc>,
    pub sunrise: Option<DateTime<Utc>>,
    pub sunset: Option<DateTime<Utc>>,
}

/// One representative reading per forecast day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub timestamp: i64,
    pub temp_min_c: f64,
    pub temp_max_c: f64,
    pub condition: Condition,
    pub description: String,
    /// Upstream `dt_txt`, e.g. `2026-10-19 12:00:00`.
    pub text_timestamp: String,
}

impl ForecastEntry {
    pub fn time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.timestamp, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn condition_parse_is_case_insensitive() {
        assert_eq!(Condition::parse("clouds"), Condition::Clouds);
        assert_eq!(Condition::parse("THUNDERSTORM"), Condition::Thunderstorm);
        assert_eq!(Condition::parse("Smoke"), Condition::Other("Smoke".into()));
    }

    #[test]
    fn unknown_condition_keeps_raw_text_and_defaults_glyph() {
        let smoke = Condition::parse("Smoke");
        assert_eq!(smoke.as_str(), "Smoke");
        assert_eq!(smoke.glyph(), Condition::Clear.glyph());
        assert_eq!(smoke.theme(), "default");
    }

    #[test]
    fn mist_and_fog_share_presentation() {
        assert_eq!(Condition::Mist.glyph(), Condition::Fog.glyph());
        assert_eq!(Condition::Mist.theme(), Condition::Fog.theme());
    }

    #[test]
    fn display_name_includes_state_when_present() {
        let ny = CityIdentity::new("Nueva York", "US", 40.7128, -74.0060).with_state("NY");
        assert_eq!(ny.display_name(), "Nueva York, NY");

        let madrid = CityIdentity::new("Madrid", "ES", 40.4168, -3.7038);
        assert_eq!(madrid.display_name(), "Madrid");
    }

    #[test]
    fn condition_serializes_as_upstream_string() {
        let json = serde_json::to_string(&Condition::Rain).expect("serialize");
        assert_eq!(json, "\"Rain\"");
        let back: Condition = serde_json::from_str("\"Haze\"").expect("deserialize");
        assert_eq!(back, Condition::Other("Haze".into()));
    }
}
