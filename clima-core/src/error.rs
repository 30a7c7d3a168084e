use thiserror::Error;

/// Message shown whenever weather or forecast retrieval fails.
pub const FETCH_FAILED_MESSAGE: &str = "No se pudo obtener el clima. Intenta con otra ciudad.";

/// Why the device could not provide a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("position unavailable")]
    PositionUnavailable,
    #[error("location request timed out")]
    Timeout,
    #[error("geolocation is not supported on this device")]
    Unsupported,
}

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("city not found{}", status_suffix(.status))]
    CityNotFound { status: Option<u16> },

    #[error("location unavailable: {0}")]
    LocationUnavailable(#[from] LocationError),

    #[error("reverse geocoding failed for {lat:.4},{lon:.4}")]
    ReverseGeocodeFailed { lat: f64, lon: f64 },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl WeatherError {
    /// A non-success status is the only upstream failure signal.
    pub fn from_status(status: reqwest::StatusCode) -> Self {
        WeatherError::CityNotFound {
            status: Some(status.as_u16()),
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (status {s})")).unwrap_or_default()
}

/// Failure of `fetch_weather` / `fetch_forecast`, shown to the user as a
/// single fixed message.
#[derive(Debug, Error)]
#[error("{}", FETCH_FAILED_MESSAGE)]
pub struct FetchError {
    #[source]
    pub cause: WeatherError,
}

impl From<WeatherError> for FetchError {
    fn from(cause: WeatherError) -> Self {
        Self { cause }
    }
}
