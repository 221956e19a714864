use thiserror::Error;

/// Why a weather lookup did not produce a record.
///
/// Every variant ends the lookup the same way for the user: an error notice
/// and no active city. The variants exist for logging.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("City not found: {city}")]
    NotFound {
        city: String,
        status: Option<u16>,
    },

    #[error("Could not reach the weather service")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected response from the weather service")]
    Malformed(#[from] serde_json::Error),
}

impl FetchError {
    pub fn not_found(city: impl Into<String>) -> Self {
        FetchError::NotFound { city: city.into(), status: None }
    }

    /// The single message shown to the user.
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}
