use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Measurement system sent with every weather request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }

    pub fn temperature_symbol(&self) -> &'static str {
        match self {
            Units::Metric => "°C",
            Units::Imperial => "°F",
        }
    }

    pub fn wind_speed_unit(&self) -> &'static str {
        match self {
            Units::Metric => "m/s",
            Units::Imperial => "mph",
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Units {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "metric" | "c" | "celsius" => Ok(Units::Metric),
            "imperial" | "f" | "fahrenheit" => Ok(Units::Imperial),
            _ => Err(anyhow::anyhow!(
                "Unknown units '{value}'. Supported units: metric, imperial."
            )),
        }
    }
}

/// A candidate location returned by the geocoding lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub name: String,
    pub state: Option<String>,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
}

impl fmt::Display for Suggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.state.as_deref().filter(|s| !s.is_empty()) {
            Some(state) => write!(f, "{}, {}, {}", self.name, state, self.country),
            None => write!(f, "{}, {}", self.name, self.country),
        }
    }
}

/// Normalized current-conditions snapshot for one location.
///
/// Records are identified by `location_name`; two records with the same name
/// describe the same city regardless of when they were fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub location_name: String,
    pub region: Option<String>,
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity_pct: u8,
    pub wind_speed: f64,
    pub cloudiness_pct: u8,
    /// Metres; the provider omits it for some stations.
    pub visibility_m: Option<u32>,
    pub pressure_hpa: u32,
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
    pub condition_code: Option<u32>,
    pub condition: String,
    #[serde(default)]
    pub units: Units,
}

impl WeatherRecord {
    pub fn is_same_city(&self, name: &str) -> bool {
        self.location_name == name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggestion_display_skips_missing_state() {
        let s = Suggestion {
            name: "Paris".into(),
            state: None,
            country: "FR".into(),
            lat: 48.85,
            lon: 2.35,
        };
        assert_eq!(s.to_string(), "Paris, FR");

        let s = Suggestion { state: Some("Texas".into()), country: "US".into(), ..s };
        assert_eq!(s.to_string(), "Paris, Texas, US");
    }

    #[test]
    fn units_parse_aliases() {
        assert_eq!(Units::try_from("Imperial").unwrap(), Units::Imperial);
        assert_eq!(Units::try_from("c").unwrap(), Units::Metric);
        assert!(Units::try_from("kelvin").is_err());
    }
}
