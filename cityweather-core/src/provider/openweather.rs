use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::{
    FetchError,
    model::{Suggestion, Units, WeatherRecord},
};

use super::{GeocodeProvider, WeatherProvider};

const GEOCODE_PATH: &str = "/geo/1.0/direct";
const WEATHER_PATH: &str = "/data/2.5/weather";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn with_base_url(api_key: String, base_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[derive(Debug, Deserialize)]
struct OwGeoEntry {
    name: String,
    lat: f64,
    lon: f64,
    country: String,
    state: Option<String>,
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
    id: u32,
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Default, Deserialize)]
struct OwClouds {
    all: u8,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    country: Option<String>,
    sunrise: i64,
    sunset: i64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
    wind: OwWind,
    #[serde(default)]
    clouds: OwClouds,
    visibility: Option<u32>,
    sys: OwSys,
}

impl OwCurrentResponse {
    fn into_record(self, units: Units) -> WeatherRecord {
        let (condition_code, condition) = match self.weather.into_iter().next() {
            Some(w) => (Some(w.id), w.description),
            None => (None, "Unknown".to_string()),
        };

        WeatherRecord {
            location_name: self.name,
            region: self.sys.country.filter(|c| !c.is_empty()),
            temperature: self.main.temp,
            feels_like: self.main.feels_like,
            humidity_pct: self.main.humidity,
            wind_speed: self.wind.speed,
            cloudiness_pct: self.clouds.all,
            visibility_m: self.visibility,
            pressure_hpa: self.main.pressure,
            sunrise: unix_to_utc(self.sys.sunrise),
            sunset: unix_to_utc(self.sys.sunset),
            condition_code,
            condition,
            units,
        }
    }
}

#[async_trait]
impl GeocodeProvider for OpenWeatherProvider {
    async fn geocode(&self, text: &str, limit: usize) -> Result<Vec<Suggestion>> {
        let limit_param = limit.to_string();
        let res = self
            .http
            .get(self.url(GEOCODE_PATH))
            .query(&[
                ("q", text),
                ("limit", limit_param.as_str()),
                ("appid", self.api_key.as_str()),
            ])
            .send()
            .await
            .context("Failed to send request to OpenWeather (geocoding)")?;

        let status = res.status();
        let body = res
            .text()
            .await
            .context("Failed to read OpenWeather geocoding response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "OpenWeather geocoding request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        let parsed: Vec<OwGeoEntry> =
            serde_json::from_str(&body).context("Failed to parse OpenWeather geocoding JSON")?;

        Ok(parsed
            .into_iter()
            .take(limit)
            .map(|e| Suggestion {
                name: e.name,
                state: e.state,
                country: e.country,
                lat: e.lat,
                lon: e.lon,
            })
            .collect())
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current(&self, city: &str, units: Units) -> Result<WeatherRecord, FetchError> {
        let res = self
            .http
            .get(self.url(WEATHER_PATH))
            .query(&[
                ("q", city),
                ("appid", self.api_key.as_str()),
                ("units", units.as_str()),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            tracing::debug!(
                %status,
                body = %truncate_body(&body),
                "OpenWeather current request for {city:?} failed"
            );
            return Err(FetchError::NotFound {
                city: city.to_string(),
                status: Some(status.as_u16()),
            });
        }

        // An empty success body resolves nothing.
        if body.trim().is_empty() {
            return Err(FetchError::not_found(city));
        }

        let parsed: OwCurrentResponse = serde_json::from_str(&body)?;
        Ok(parsed.into_record(units))
    }
}

fn unix_to_utc(ts: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(ts, 0).unwrap_or_default()
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
