//! Core library for the `cityweather` client.
//!
//! This crate defines:
//! - Configuration handling
//! - Geocoding and weather provider abstractions, plus the OpenWeather client
//! - The suggestion/fetch coordinator and its stale-response suppression
//! - Pinned cities and their persistence
//!
//! It is used by `cityweather-cli`, but can also be reused by other front ends.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod fetch;
pub mod model;
pub mod provider;
pub mod store;
pub mod suggest;

pub use config::Config;
pub use coordinator::{Coordinator, FetchTicket, Phase, PinChange, SearchState, SuggestTicket};
pub use error::FetchError;
pub use fetch::Fetcher;
pub use model::{Suggestion, Units, WeatherRecord};
pub use provider::{GeocodeProvider, Providers, WeatherProvider, providers_from_config};
pub use store::{FileStorage, MemoryStorage, PinnedCities, Storage};
pub use suggest::Suggester;
