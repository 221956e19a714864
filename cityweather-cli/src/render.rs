use chrono::{DateTime, Local, Utc};
use cityweather_core::{SearchState, WeatherRecord};

/// Terminal palette picked by the dark-mode preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn from_dark_mode(dark_mode: bool) -> Self {
        if dark_mode { Theme::Dark } else { Theme::Light }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Theme::Light => "☀️",
            Theme::Dark => "🌙",
        }
    }

    fn heading(&self, text: &str) -> String {
        match self {
            Theme::Light => format!("\x1b[1;34m{text}\x1b[0m"),
            Theme::Dark => format!("\x1b[1;96m{text}\x1b[0m"),
        }
    }
}

pub fn local_time(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%H:%M:%S").to_string()
}

/// Rounded for display; `+ 0.0` turns a rounded `-0.0` into `0`.
fn whole(value: f64) -> f64 {
    value.round() + 0.0
}

/// Full card for one record.
pub fn record(record: &WeatherRecord, theme: Theme) -> String {
    let units = record.units;
    let symbol = units.temperature_symbol();
    let title = match &record.region {
        Some(region) => format!("{}, {}", record.location_name, region),
        None => record.location_name.clone(),
    };
    let visibility = match record.visibility_m {
        Some(m) => format!("{} km", f64::from(m) / 1000.0),
        None => "n/a".to_string(),
    };

    [
        theme.heading(&title),
        format!("  {}{symbol}  {}", whole(record.temperature), record.condition),
        format!("  Humidity:   {}%", record.humidity_pct),
        format!("  Wind speed: {} {}", record.wind_speed, units.wind_speed_unit()),
        format!("  Cloudiness: {}%", record.cloudiness_pct),
        format!("  Visibility: {visibility}"),
        format!("  Pressure:   {} hPa", record.pressure_hpa),
        format!("  Sunrise:    {}", local_time(record.sunrise)),
        format!("  Sunset:     {}", local_time(record.sunset)),
        format!("  Feels like: {}{symbol}", whole(record.feels_like)),
    ]
    .join("\n")
}

/// One line per pinned record.
pub fn pinned_summary(records: &[WeatherRecord]) -> String {
    if records.is_empty() {
        return "No pinned cities.".to_string();
    }

    records
        .iter()
        .enumerate()
        .map(|(i, r)| {
            format!(
                "{:>2}. {:<20} {:>4}{}  {}",
                i + 1,
                r.location_name,
                whole(r.temperature),
                r.units.temperature_symbol(),
                r.condition
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// What the search view shows for the current state.
pub fn state(state: &SearchState, theme: Theme) -> String {
    if state.is_loading() {
        return "Loading...".to_string();
    }
    if let Some(error) = state.error() {
        return format!("Error: {error}");
    }
    match state.active() {
        Some(active) => record(active, theme),
        None => "Search for a city to see the weather ☁️".to_string(),
    }
}
