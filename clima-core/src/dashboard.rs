//! Application state and the controller that drives it.
//!
//! [`AppState`] holds the single authoritative city together with its weather
//! and forecast. Selecting a city clears the previous data immediately; the
//! new data lands in one step when the fetch completes, and only if no newer
//! selection has started in the meantime.

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::{
    error::FetchError,
    geolocation::Geolocation,
    model::{CityIdentity, Coordinates, CurrentWeather, ForecastEntry},
    recent::RecentCities,
    resolver::Resolver,
};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Status {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed(String),
}

/// Identifies one selection; only the latest ticket may complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket(u64);

#[derive(Debug, Default)]
pub struct AppState {
    city: Option<CityIdentity>,
    weather: Option<CurrentWeather>,
    forecast: Vec<ForecastEntry>,
    status: Status,
    latest: u64,
}

impl AppState {
    pub fn city(&self) -> Option<&CityIdentity> {
        self.city.as_ref()
    }

    pub fn weather(&self) -> Option<&CurrentWeather> {
        self.weather.as_ref()
    }

    pub fn forecast(&self) -> &[ForecastEntry] {
        &self.forecast
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    /// Make `city` authoritative and drop everything shown for the previous one.
    pub fn begin(&mut self, city: CityIdentity) -> RequestTicket {
        self.latest += 1;
        self.city = Some(city);
        self.weather = None;
        self.forecast.clear();
        self.status = Status::Loading;
        RequestTicket(self.latest)
    }

    /// Apply a finished fetch. Returns `false` when a newer selection has
    /// superseded `ticket`, in which case nothing changes.
    pub fn complete(
        &mut self,
        ticket: RequestTicket,
        result: Result<(CurrentWeather, Vec<ForecastEntry>), FetchError>,
    ) -> bool {
        if ticket.0 != self.latest {
            debug!(ticket = ticket.0, latest = self.latest, "discarding stale response");
            return false;
        }

        match result {
            Ok((weather, forecast)) => {
                self.weather = Some(weather);
                self.forecast = forecast;
                self.status = Status::Ready;
            }
            Err(err) => {
                self.weather = None;
                self.forecast.clear();
                self.status = Status::Failed(err.to_string());
            }
        }
        true
    }
}

#[derive(Debug)]
pub struct Dashboard {
    resolver: Resolver,
    geolocation: Geolocation,
    recent: RecentCities,
    state: AppState,
}

impl Dashboard {
    pub fn new(resolver: Resolver, geolocation: Geolocation, recent: RecentCities) -> Self {
        Self {
            resolver,
            geolocation,
            recent,
            state: AppState::default(),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn recent(&self) -> &RecentCities {
        &self.recent
    }

    pub fn clear_recent(&mut self) {
        self.recent.clear();
    }

    pub async fn suggestions(&self, text: &str) -> Vec<CityIdentity> {
        self.resolver.resolve_by_query(text).await
    }

    /// Make `city` authoritative and clear whatever was shown before.
    pub fn begin_selection(&mut self, city: CityIdentity) -> RequestTicket {
        info!(city = %city.name, country = %city.country, "loading weather");
        self.state.begin(city)
    }

    /// Fetch everything shown for `city` without touching the state, so loads
    /// for overlapping selections may run side by side. Only current weather
    /// is required; a missing forecast leaves the forecast empty.
    pub async fn load(
        &self,
        city: &CityIdentity,
    ) -> Result<(CurrentWeather, Vec<ForecastEntry>), FetchError> {
        let weather = self.resolver.fetch_weather(city).await?;
        let forecast = match self.resolver.fetch_forecast(city).await {
            Ok(days) => days,
            Err(err) => {
                warn!(city = %city.name, error = %err.cause, "forecast unavailable");
                Vec::new()
            }
        };
        Ok((weather, forecast))
    }

    /// Apply a load started by [`Dashboard::begin_selection`]. Returns `false`
    /// when a newer selection has superseded `ticket`.
    pub fn finish_selection(
        &mut self,
        ticket: RequestTicket,
        result: Result<(CurrentWeather, Vec<ForecastEntry>), FetchError>,
    ) -> bool {
        let succeeded = result.is_ok();
        let applied = self.state.complete(ticket, result);

        let shown = self.state.city().filter(|_| applied && succeeded);
        if let Some(city) = shown {
            self.recent.add(&city.name, &city.country, Utc::now());
        }
        applied
    }

    /// Show `city`. Suggestion picks and location results both end up here.
    pub async fn select_city(&mut self, city: CityIdentity) -> &AppState {
        let ticket = self.begin_selection(city.clone());
        let result = self.load(&city).await;
        self.finish_selection(ticket, result);
        &self.state
    }

    /// Submitting the search box picks the best candidate, if there is one.
    pub async fn submit_query(&mut self, text: &str) -> Option<&AppState> {
        if text.trim().is_empty() {
            return None;
        }
        let best = self.suggestions(text).await.into_iter().next()?;
        Some(self.select_city(best).await)
    }

    pub async fn use_device_location(&mut self) -> &AppState {
        let city = self
            .resolver
            .resolve_by_device_location(&self.geolocation)
            .await;
        self.select_city(city).await
    }

    pub async fn use_coordinates(&mut self, coords: Coordinates) -> &AppState {
        let city = self.resolver.resolve_by_coordinates(coords).await;
        self.select_city(city).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::{FETCH_FAILED_MESSAGE, LocationError, WeatherError},
        geolocation::{FixedLocator, UnsupportedLocator},
        recent::MemoryStore,
        resolver::{default_city, synthetic_identity},
        testing::{Reply, StubProvider, sample_weather, three_hour_series},
    };

    fn ok_stub() -> StubProvider {
        StubProvider {
            current: Reply::Ok(sample_weather("Madrid")),
            forecast: Reply::Ok(three_hour_series(40)),
            ..StubProvider::default()
        }
    }

    fn dashboard(stub: &StubProvider, geolocation: Geolocation) -> Dashboard {
        Dashboard::new(
            Resolver::new(Box::new(stub.clone())),
            geolocation,
            RecentCities::load(Box::new(MemoryStore::default())),
        )
    }

    fn fetched() -> Result<(CurrentWeather, Vec<ForecastEntry>), FetchError> {
        Ok((sample_weather("X"), three_hour_series(5)))
    }

    #[test]
    fn begin_clears_previous_data_before_fetch_resolves() {
        let mut state = AppState::default();
        let first = state.begin(default_city());
        assert!(state.complete(first, fetched()));
        assert!(state.weather().is_some());

        state.begin(CityIdentity::new("Lima", "PE", -12.0464, -77.0428));
        assert_eq!(state.status(), &Status::Loading);
        assert!(state.weather().is_none());
        assert!(state.forecast().is_empty());
        assert_eq!(state.city().map(|c| c.name.as_str()), Some("Lima"));
    }

    #[test]
    fn stale_response_is_discarded() {
        let mut state = AppState::default();
        let older = state.begin(default_city());
        let newer = state.begin(CityIdentity::new("Lima", "PE", -12.0464, -77.0428));

        assert!(!state.complete(older, fetched()));
        assert_eq!(state.status(), &Status::Loading);
        assert!(state.weather().is_none());

        assert!(state.complete(newer, fetched()));
        assert_eq!(state.status(), &Status::Ready);
    }

    #[test]
    fn failure_leaves_no_data_and_user_message() {
        let mut state = AppState::default();
        let ticket = state.begin(default_city());
        let err = FetchError::from(WeatherError::LocationUnavailable(LocationError::Timeout));

        assert!(state.complete(ticket, Err(err)));
        assert_eq!(state.status(), &Status::Failed(FETCH_FAILED_MESSAGE.to_string()));
        assert!(state.weather().is_none());
        assert!(state.forecast().is_empty());
    }

    #[tokio::test]
    async fn selecting_city_loads_weather_forecast_and_records_recent() {
        let stub = ok_stub();
        let mut dash = dashboard(&stub, Geolocation::new(Box::new(UnsupportedLocator)));

        let state = dash.select_city(default_city()).await;
        assert_eq!(state.status(), &Status::Ready);
        assert_eq!(state.forecast().len(), 5);
        assert_eq!(dash.recent().cities()[0].name, "Madrid");
    }

    #[tokio::test]
    async fn forecast_outage_keeps_current_weather() {
        let stub = StubProvider {
            current: Reply::Ok(sample_weather("Madrid")),
            forecast: Reply::Status(500),
            ..StubProvider::default()
        };
        let mut dash = dashboard(&stub, Geolocation::new(Box::new(UnsupportedLocator)));

        let state = dash.select_city(default_city()).await;
        assert_eq!(state.status(), &Status::Ready);
        assert!(state.weather().is_some());
        assert!(state.forecast().is_empty());
        assert_eq!(dash.recent().cities()[0].name, "Madrid");
    }

    #[tokio::test]
    async fn weather_outage_fails_selection() {
        let stub = StubProvider {
            current: Reply::Status(500),
            forecast: Reply::Ok(three_hour_series(40)),
            ..StubProvider::default()
        };
        let mut dash = dashboard(&stub, Geolocation::new(Box::new(UnsupportedLocator)));

        let state = dash.select_city(default_city()).await;
        assert!(matches!(state.status(), Status::Failed(_)));
        assert!(state.weather().is_none());
        assert!(state.forecast().is_empty());
        assert!(dash.recent().cities().is_empty());
    }

    #[tokio::test]
    async fn overlapping_selections_keep_only_the_latest() {
        let stub = ok_stub();
        let mut dash = dashboard(&stub, Geolocation::new(Box::new(UnsupportedLocator)));
        let lima = CityIdentity::new("Lima", "PE", -12.0464, -77.0428);

        let first = dash.begin_selection(default_city());
        let second = dash.begin_selection(lima.clone());

        let late = dash.load(&default_city()).await;
        assert!(!dash.finish_selection(first, late));
        assert_eq!(dash.state().status(), &Status::Loading);
        assert!(dash.state().weather().is_none());
        assert!(dash.recent().cities().is_empty());

        let fresh = dash.load(&lima).await;
        assert!(dash.finish_selection(second, fresh));
        assert_eq!(dash.state().status(), &Status::Ready);
        assert_eq!(dash.state().city(), Some(&lima));
        assert_eq!(dash.recent().cities()[0].name, "Lima");
    }

    #[tokio::test]
    async fn device_location_without_support_shows_madrid() {
        let stub = ok_stub();
        let mut dash = dashboard(&stub, Geolocation::new(Box::new(UnsupportedLocator)));

        let state = dash.use_device_location().await;
        assert_eq!(state.city(), Some(&default_city()));
    }

    #[tokio::test]
    async fn device_location_with_failed_reverse_lookup_is_synthetic() {
        let stub = ok_stub();
        let here = Coordinates::new(-34.6, -58.4);
        let mut dash = dashboard(&stub, Geolocation::new(Box::new(FixedLocator::new(here))));

        let state = dash.use_device_location().await;
        assert_eq!(state.city(), Some(&synthetic_identity(here)));
    }

    #[tokio::test]
    async fn submit_picks_first_suggestion() {
        let stub = StubProvider {
            direct: Reply::Ok(vec![
                CityIdentity::new("London", "GB", 51.5073, -0.1276),
                CityIdentity::new("London", "CA", 42.9834, -81.2330),
            ]),
            ..ok_stub()
        };
        let mut dash = dashboard(&stub, Geolocation::new(Box::new(UnsupportedLocator)));

        let state = dash.submit_query("Lond").await.expect("selection");
        assert_eq!(state.city().map(|c| c.country.as_str()), Some("GB"));
    }

    #[tokio::test]
    async fn blank_submit_does_nothing() {
        let stub = ok_stub();
        let mut dash = dashboard(&stub, Geolocation::new(Box::new(UnsupportedLocator)));

        assert!(dash.submit_query("   ").await.is_none());
        assert_eq!(dash.state().status(), &Status::Idle);
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn clear_recent_empties_list() {
        let stub = ok_stub();
        let mut dash = dashboard(&stub, Geolocation::new(Box::new(UnsupportedLocator)));
        dash.select_city(default_city()).await;

        dash.clear_recent();
        assert!(dash.recent().cities().is_empty());
    }
}
