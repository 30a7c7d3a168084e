//! Plain-text rendering of the dashboard, suggestions and recent cities.

use chrono::{DateTime, TimeZone, Timelike};
use clima_core::{
    AppState, CityIdentity, CurrentWeather, ForecastEntry, Status,
    derived::{
        UvLevel, capitalize_words, cloudiness, country_flag, dew_point_c, forecast_day_label,
        format_clock, format_long_date, round_half_up, uv_index_placeholder, visibility_km,
        wind_kmh,
    },
    recent::RecentCityRecord,
};
use std::fmt;

/// One suggestion row: flag, display name and country code.
pub fn suggestion_line(city: &CityIdentity) -> String {
    if city.country.is_empty() {
        format!("{} {}", country_flag(&city.country), city.display_name())
    } else {
        format!(
            "{} {} ({})",
            country_flag(&city.country),
            city.display_name(),
            city.country
        )
    }
}

struct Suggestions<'a> {
    query: &'a str,
    cities: &'a [CityIdentity],
}

impl fmt::Display for Suggestions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.cities.is_empty() {
            return writeln!(f, "Sin resultados para \"{}\"", self.query);
        }
        for (i, city) in self.cities.iter().enumerate() {
            writeln!(f, "{:>2}. {}", i + 1, suggestion_line(city))?;
        }
        Ok(())
    }
}

pub fn suggestions(query: &str, cities: &[CityIdentity]) -> String {
    Suggestions { query, cities }.to_string()
}

struct Recent<'a>(&'a [RecentCityRecord]);

impl fmt::Display for Recent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No hay ciudades recientes");
        }
        writeln!(f, "Ciudades recientes:")?;
        for record in self.0 {
            writeln!(
                f,
                "  {} {} {}",
                country_flag(&record.country),
                record.name,
                record.country
            )?;
        }
        Ok(())
    }
}

pub fn recent(records: &[RecentCityRecord]) -> String {
    Recent(records).to_string()
}

fn write_current<Tz: TimeZone>(
    f: &mut fmt::Formatter<'_>,
    weather: &CurrentWeather,
    now: &DateTime<Tz>,
) -> fmt::Result {
    let uv = uv_index_placeholder(now.hour());

    writeln!(
        f,
        "{} {}°C  {}",
        weather.condition.glyph(),
        round_half_up(weather.temperature_c),
        capitalize_words(&weather.description)
    )?;
    writeln!(f, "  Sensación térmica  {}°C", round_half_up(weather.feels_like_c))?;
    writeln!(f, "  Humedad           {}%", weather.humidity_pct)?;
    writeln!(f, "  Presión           {} hPa", weather.pressure_hpa)?;
    writeln!(
        f,
        "  Viento            {} km/h",
        round_half_up(wind_kmh(weather.wind_speed_mps))
    )?;
    writeln!(f, "  Visibilidad       {} km", visibility_km(weather.visibility_m))?;
    writeln!(f, "  Nubosidad         {}%", cloudiness(weather.cloudiness_pct))?;
    writeln!(
        f,
        "  Punto de rocío    {}°C",
        dew_point_c(weather.temperature_c, weather.humidity_pct)
    )?;
    writeln!(
        f,
        "  Índice UV         {} ({})",
        uv,
        UvLevel::from_index(uv).label()
    )?;

    let tz = now.timezone();
    if let (Some(sunrise), Some(sunset)) = (weather.sunrise, weather.sunset) {
        writeln!(
            f,
            "  Amanecer {}  Atardecer {}",
            format_clock(&sunrise.with_timezone(&tz)),
            format_clock(&sunset.with_timezone(&tz))
        )?;
    }
    Ok(())
}

fn write_forecast(f: &mut fmt::Formatter<'_>, days: &[ForecastEntry]) -> fmt::Result {
    if days.is_empty() {
        return Ok(());
    }

    writeln!(f, "\nPronóstico:")?;
    for (i, day) in days.iter().enumerate() {
        writeln!(
            f,
            "  {:<7} {} {:>3}° / {:>3}°  {}",
            forecast_day_label(i, day),
            day.condition.glyph(),
            round_half_up(day.temp_max_c),
            round_half_up(day.temp_min_c),
            capitalize_words(&day.description)
        )?;
    }
    Ok(())
}

struct DashboardView<'a, Tz: TimeZone> {
    state: &'a AppState,
    now: &'a DateTime<Tz>,
}

impl<Tz: TimeZone> fmt::Display for DashboardView<'_, Tz> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(city) = self.state.city() {
            writeln!(f, "{}", suggestion_line(city))?;
        }
        writeln!(f, "{}  {}\n", format_long_date(self.now), format_clock(self.now))?;

        match self.state.status() {
            Status::Idle => Ok(()),
            Status::Loading => writeln!(f, "Cargando…"),
            Status::Failed(message) => writeln!(f, "{message}"),
            Status::Ready => {
                if let Some(weather) = self.state.weather() {
                    write_current(f, weather, self.now)?;
                }
                write_forecast(f, self.state.forecast())
            }
        }
    }
}

/// The whole dashboard for `state`, stamped with `now`.
pub fn dashboard<Tz: TimeZone>(state: &AppState, now: &DateTime<Tz>) -> String {
    DashboardView { state, now }.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use clima_core::{Condition, FetchError, WeatherError};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 30, 0)
            .single()
            .expect("time")
    }

    fn weather() -> CurrentWeather {
        CurrentWeather {
            location_name: "Madrid".into(),
            country: "ES".into(),
            temperature_c: 20.0,
            feels_like_c: 19.4,
            humidity_pct: 60,
            pressure_hpa: 1015,
            wind_speed_mps: 5.0,
            condition: Condition::Clouds,
            description: "nubes dispersas".into(),
            visibility_m: None,
            cloudiness_pct: Some(40),
            observed_at: now(),
            sunrise: None,
            sunset: None,
        }
    }

    fn day(ts: &str, max: f64) -> ForecastEntry {
        ForecastEntry {
            timestamp: 0,
            temp_min_c: 8.0,
            temp_max_c: max,
            condition: Condition::Rain,
            description: "lluvia ligera".into(),
            text_timestamp: ts.into(),
        }
    }

    fn madrid() -> CityIdentity {
        CityIdentity::new("Madrid", "ES", 40.4168, -3.7038)
    }

    #[test]
    fn ready_dashboard_shows_derived_values() {
        let mut state = AppState::default();
        let ticket = state.begin(madrid());
        state.complete(
            ticket,
            Ok((
                weather(),
                vec![day("2026-10-19 12:00:00", 21.0), day("2026-10-20 12:00:00", 18.6)],
            )),
        );

        let out = dashboard(&state, &now());
        assert!(out.contains("Madrid (ES)"));
        assert!(out.contains("lunes, 19 de octubre de 2026"));
        assert!(out.contains("20°C  Nubes Dispersas"));
        assert!(out.contains("Viento            18 km/h"));
        assert!(out.contains("Visibilidad       10 km"));
        assert!(out.contains("Punto de rocío    12°C"));
        assert!(out.contains("Índice UV         5 (Moderado)"));
        assert!(out.contains("Hoy"));
        assert!(out.contains("mar 20"));
    }

    #[test]
    fn weather_without_forecast_omits_forecast_block() {
        let mut state = AppState::default();
        let ticket = state.begin(madrid());
        state.complete(ticket, Ok((weather(), Vec::new())));

        let out = dashboard(&state, &now());
        assert!(out.contains("Humedad           60%"));
        assert!(!out.contains("Pronóstico"));
        assert!(out.ends_with("Índice UV         5 (Moderado)\n"));
    }

    #[test]
    fn failed_dashboard_shows_only_message() {
        let mut state = AppState::default();
        let ticket = state.begin(madrid());
        state.complete(
            ticket,
            Err(FetchError::from(WeatherError::CityNotFound { status: Some(500) })),
        );

        let out = dashboard(&state, &now());
        assert!(out.contains("No se pudo obtener el clima. Intenta con otra ciudad."));
        assert!(!out.contains("Humedad"));
    }

    #[test]
    fn synthetic_location_has_no_country_suffix() {
        let here = CityIdentity::new("Tu ubicación", "", 1.0, 2.0);
        assert_eq!(suggestion_line(&here), "🌍 Tu ubicación");
    }

    #[test]
    fn suggestions_are_numbered_with_state() {
        let cities = vec![
            CityIdentity::new("London", "GB", 51.5, -0.12).with_state("England"),
            CityIdentity::new("London", "CA", 42.98, -81.23),
        ];
        let out = suggestions("Lond", &cities);
        assert_eq!(out, " 1. 🇬🇧 London, England (GB)\n 2. 🇨🇦 London (CA)\n");
        assert_eq!(suggestions("xyz", &[]), "Sin resultados para \"xyz\"\n");
    }

    #[test]
    fn recent_list_renders_each_city() {
        let records = vec![RecentCityRecord {
            name: "Lima".into(),
            country: "PE".into(),
            timestamp_ms: 0,
        }];
        assert_eq!(recent(&records), "Ciudades recientes:\n  🌍 Lima PE\n");
        assert_eq!(recent(&[]), "No hay ciudades recientes\n");
    }
}
