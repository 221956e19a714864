use std::sync::Arc;

use crate::{
    FetchError,
    model::{Units, WeatherRecord},
    provider::WeatherProvider,
};

/// Single-shot weather lookup. Never touches shared state; the caller
/// decides where the record goes.
#[derive(Debug, Clone)]
pub struct Fetcher {
    provider: Arc<dyn WeatherProvider>,
    units: Units,
}

impl Fetcher {
    pub fn new(provider: Arc<dyn WeatherProvider>, units: Units) -> Self {
        Self { provider, units }
    }

    pub async fn fetch(&self, city: &str) -> Result<WeatherRecord, FetchError> {
        let city = city.trim();
        if city.is_empty() {
            return Err(FetchError::not_found(city));
        }

        let result = self.provider.current(city, self.units).await;
        if let Err(e) = &result {
            tracing::debug!("Weather lookup for {city:?} failed: {e:?}");
        }
        result
    }
}
