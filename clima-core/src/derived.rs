//! Values derived from the upstream payload for display.

use chrono::{DateTime, Datelike, NaiveDateTime, TimeZone, Timelike, Weekday};

use crate::model::ForecastEntry;

/// Shown when the upstream omits visibility.
const DEFAULT_VISIBILITY_KM: &str = "10";

/// Round half up, so -2.5 becomes -2 and 2.5 becomes 3.
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Approximate dew point: `T - (100 - RH) / 5`, rounded.
pub fn dew_point_c(temperature_c: f64, humidity_pct: u8) -> i64 {
    round_half_up(temperature_c - (100.0 - f64::from(humidity_pct)) / 5.0)
}

/// Visibility in kilometres with one decimal. Missing or zero readings show
/// the default of 10 km.
pub fn visibility_km(visibility_m: Option<u32>) -> String {
    match visibility_m {
        Some(meters) if meters > 0 => format!("{:.1}", f64::from(meters) / 1000.0),
        _ => DEFAULT_VISIBILITY_KM.to_string(),
    }
}

pub fn wind_kmh(speed_mps: f64) -> f64 {
    speed_mps * 3.6
}

pub fn cloudiness(cloudiness_pct: Option<u8>) -> u8 {
    cloudiness_pct.unwrap_or(0)
}

/// Placeholder UV index: the upstream current-weather payload has none, so the
/// value only tracks whether the local hour falls in the 10:00-16:00 peak.
pub fn uv_index_placeholder(local_hour: u32) -> u8 {
    if (10..=16).contains(&local_hour) { 5 } else { 1 }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UvLevel {
    Low,
    Moderate,
    High,
    VeryHigh,
    Extreme,
}

impl UvLevel {
    pub fn from_index(index: u8) -> Self {
        match index {
            0..=2 => UvLevel::Low,
            3..=5 => UvLevel::Moderate,
            6..=7 => UvLevel::High,
            8..=10 => UvLevel::VeryHigh,
            _ => UvLevel::Extreme,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            UvLevel::Low => "Bajo",
            UvLevel::Moderate => "Moderado",
            UvLevel::High => "Alto",
            UvLevel::VeryHigh => "Muy Alto",
            UvLevel::Extreme => "Extremo",
        }
    }
}

pub fn country_flag(country: &str) -> &'static str {
    match country {
        "ES" => "🇪🇸",
        "AR" => "🇦🇷",
        "MX" => "🇲🇽",
        "GB" => "🇬🇧",
        "FR" => "🇫🇷",
        "US" => "🇺🇸",
        "JP" => "🇯🇵",
        "DE" => "🇩🇪",
        "IT" => "🇮🇹",
        "BR" => "🇧🇷",
        "CA" => "🇨🇦",
        "AU" => "🇦🇺",
        _ => "🌍",
    }
}

/// Upper-case the first letter of every word.
pub fn capitalize_words(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn weekday_short(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "lun",
        Weekday::Tue => "mar",
        Weekday::Wed => "mié",
        Weekday::Thu => "jue",
        Weekday::Fri => "vie",
        Weekday::Sat => "sáb",
        Weekday::Sun => "dom",
    }
}

fn weekday_long(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "lunes",
        Weekday::Tue => "martes",
        Weekday::Wed => "miércoles",
        Weekday::Thu => "jueves",
        Weekday::Fri => "viernes",
        Weekday::Sat => "sábado",
        Weekday::Sun => "domingo",
    }
}

const MONTHS: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

/// "Hoy" for the first forecast day, otherwise short weekday and day of month.
pub fn forecast_day_label(index: usize, entry: &ForecastEntry) -> String {
    if index == 0 {
        return "Hoy".to_string();
    }

    let date = NaiveDateTime::parse_from_str(&entry.text_timestamp, "%Y-%m-%d %H:%M:%S")
        .ok()
        .or_else(|| entry.time().map(|t| t.naive_utc()));

    match date {
        Some(date) => format!("{} {}", weekday_short(date.weekday()), date.day()),
        None => entry.text_timestamp.clone(),
    }
}

/// `HH:MM:SS`.
pub fn format_clock<Tz: TimeZone>(at: &DateTime<Tz>) -> String {
    format!("{:02}:{:02}:{:02}", at.hour(), at.minute(), at.second())
}

/// e.g. `lunes, 19 de octubre de 2026`.
pub fn format_long_date<Tz: TimeZone>(at: &DateTime<Tz>) -> String {
    format!(
        "{}, {} de {} de {}",
        weekday_long(at.weekday()),
        at.day(),
        MONTHS[at.month0() as usize],
        at.year()
    )
}
