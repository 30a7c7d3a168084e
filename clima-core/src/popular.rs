//! Built-in city list shown before the user has typed enough to search, and
//! used as the offline fallback when the geocoding service is unreachable.

use crate::model::CityIdentity;

struct PopularCity {
    name: &'static str,
    country: &'static str,
    state: Option<&'static str>,
    lat: f64,
    lon: f64,
}

const POPULAR_CITIES: &[PopularCity] = &[
    PopularCity { name: "Madrid", country: "ES", state: None, lat: 40.4168, lon: -3.7038 },
    PopularCity { name: "Barcelona", country: "ES", state: None, lat: 41.3851, lon: 2.1734 },
    PopularCity { name: "Buenos Aires", country: "AR", state: None, lat: -34.6118, lon: -58.3960 },
    PopularCity {
        name: "México",
        country: "MX",
        state: Some("Ciudad de México"),
        lat: 19.4326,
        lon: -99.1332,
    },
    PopularCity { name: "Londres", country: "GB", state: None, lat: 51.5074, lon: -0.1278 },
    PopularCity { name: "París", country: "FR", state: None, lat: 48.8566, lon: 2.3522 },
    PopularCity { name: "Nueva York", country: "US", state: Some("NY"), lat: 40.7128, lon: -74.0060 },
    PopularCity { name: "Tokio", country: "JP", state: None, lat: 35.6762, lon: 139.6503 },
];

impl PopularCity {
    fn to_identity(&self) -> CityIdentity {
        CityIdentity {
            name: self.name.to_string(),
            country: self.country.to_string(),
            state: self.state.map(str::to_string),
            lat: self.lat,
            lon: self.lon,
        }
    }

    fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle) || self.country.to_lowercase().contains(needle)
    }
}

/// The full popular list, in display order.
pub fn popular_cities() -> Vec<CityIdentity> {
    POPULAR_CITIES.iter().map(PopularCity::to_identity).collect()
}

/// Popular cities whose name or country code contains `query`, ignoring case.
pub fn filter_popular(query: &str) -> Vec<CityIdentity> {
    let needle = query.to_lowercase();
    POPULAR_CITIES
        .iter()
        .filter(|city| city.matches(&needle))
        .map(PopularCity::to_identity)
        .collect()
}
