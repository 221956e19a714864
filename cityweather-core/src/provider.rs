use crate::{
    Config, FetchError,
    model::{Suggestion, Units, WeatherRecord},
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod openweather;

/// Forward geocoding: free text to candidate locations.
#[async_trait]
pub trait GeocodeProvider: Send + Sync + Debug {
    async fn geocode(&self, text: &str, limit: usize) -> anyhow::Result<Vec<Suggestion>>;
}

/// Current conditions for a named city.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current(&self, city: &str, units: Units) -> Result<WeatherRecord, FetchError>;
}

/// Both halves of the provider, shared between suggester and fetcher.
#[derive(Debug, Clone)]
pub struct Providers {
    pub geocode: Arc<dyn GeocodeProvider>,
    pub weather: Arc<dyn WeatherProvider>,
}

/// Construct the HTTP provider from config.
pub fn providers_from_config(config: &Config) -> anyhow::Result<Providers> {
    let api_key = config.api_key()?;
    let provider = Arc::new(OpenWeatherProvider::with_base_url(
        api_key.to_owned(),
        &config.api_base,
        config.timeout(),
    )?);

    Ok(Providers { geocode: provider.clone(), weather: provider })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn providers_from_config_errors_when_missing_api_key() {
        let cfg = Config::default();
        let err = providers_from_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("No API key configured"));
    }

    #[test]
    fn providers_from_config_works_when_configured() {
        let mut cfg = Config::default();
        cfg.set_api_key("KEY".to_string());

        assert!(providers_from_config(&cfg).is_ok());
    }
}
