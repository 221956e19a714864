//! Best-effort city suggestions for partially typed input.

use std::sync::Arc;

use crate::{model::Suggestion, provider::GeocodeProvider};

/// Maximum number of suggestions requested and returned.
pub const SUGGESTION_LIMIT: usize = 5;

/// Input must be longer than this many characters before the provider is asked.
pub const MIN_SUGGEST_CHARS: usize = 2;

/// Whether `partial` is long enough to be worth a geocoding call.
pub fn wants_suggestions(partial: &str) -> bool {
    partial.trim().chars().count() > MIN_SUGGEST_CHARS
}

#[derive(Debug, Clone)]
pub struct Suggester {
    provider: Arc<dyn GeocodeProvider>,
}

impl Suggester {
    pub fn new(provider: Arc<dyn GeocodeProvider>) -> Self {
        Self { provider }
    }

    /// Up to [`SUGGESTION_LIMIT`] candidates in provider order.
    ///
    /// Short input returns an empty list without a network call. Failures are
    /// logged and also produce an empty list.
    pub async fn suggest(&self, partial: &str) -> Vec<Suggestion> {
        if !wants_suggestions(partial) {
            return Vec::new();
        }

        match self.provider.geocode(partial.trim(), SUGGESTION_LIMIT).await {
            Ok(mut suggestions) => {
                suggestions.truncate(SUGGESTION_LIMIT);
                suggestions
            }
            Err(e) => {
                tracing::debug!("Suggestion lookup for {partial:?} failed: {e:#}");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct CountingGeocoder {
        calls: AtomicUsize,
        fail: bool,
        results: usize,
    }

    #[async_trait]
    impl GeocodeProvider for CountingGeocoder {
        async fn geocode(&self, text: &str, _limit: usize) -> anyhow::Result<Vec<Suggestion>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("connection refused");
            }
            Ok((0..self.results)
                .map(|i| Suggestion {
                    name: format!("{text}{i}"),
                    state: None,
                    country: "XX".into(),
                    lat: 0.0,
                    lon: 0.0,
                })
                .collect())
        }
    }

    #[tokio::test]
    async fn short_input_never_calls_provider() {
        let geocoder = Arc::new(CountingGeocoder { results: 3, ..Default::default() });
        let suggester = Suggester::new(geocoder.clone());

        for input in ["", "P", "Pa", "  Pa  ", "東京"] {
            assert!(suggester.suggest(input).await.is_empty(), "input {input:?}");
        }
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn caps_results_at_limit() {
        let geocoder = Arc::new(CountingGeocoder { results: 9, ..Default::default() });
        let suggester = Suggester::new(geocoder.clone());

        let out = suggester.suggest("Par").await;

        assert_eq!(out.len(), SUGGESTION_LIMIT);
        assert_eq!(out[0].name, "Par0");
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn provider_failure_is_swallowed() {
        let geocoder = Arc::new(CountingGeocoder { fail: true, ..Default::default() });
        let suggester = Suggester::new(geocoder);

        assert!(suggester.suggest("Paris").await.is_empty());
    }

    #[test]
    fn threshold_counts_chars_not_bytes() {
        assert!(!wants_suggestions("ab"));
        assert!(wants_suggestions("abc"));
        assert!(wants_suggestions("東京都"));
    }
}
