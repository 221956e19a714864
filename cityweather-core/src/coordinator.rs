//! Search and selection coordination.
//!
//! [`SearchState`] is the single owner of the query, suggestion list, active
//! city and pinned cities. Every network call is represented by a ticket
//! carrying the generation it was issued under; a completion is applied only
//! if no newer call of the same kind has been issued since.
//!
//! [`Coordinator`] drives the state with the real suggester and fetcher. Its
//! operations take `&self` and never hold a borrow across an `.await`, so
//! several of them can be in flight on one task at once.

use anyhow::Result;
use std::cell::{Ref, RefCell};

use crate::{
    FetchError,
    fetch::Fetcher,
    model::{Suggestion, Units, WeatherRecord},
    provider::Providers,
    store::PinnedCities,
    suggest::{Suggester, wants_suggestions},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Suggesting,
    Fetching,
}

/// Result of a pin toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinChange {
    Pinned,
    Unpinned,
    Unchanged,
}

/// Monotonic counter for one kind of request.
#[derive(Debug, Default)]
struct Generation(u64);

impl Generation {
    fn advance(&mut self) -> u64 {
        self.0 += 1;
        self.0
    }

    fn is_current(&self, generation: u64) -> bool {
        self.0 == generation
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestTicket {
    generation: u64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    pub city: String,
}

#[derive(Debug)]
pub struct SearchState {
    query: String,
    suggestions: Vec<Suggestion>,
    active: Option<WeatherRecord>,
    pinned: PinnedCities,
    error: Option<String>,
    resolved: Option<String>,
    suggest_generation: Generation,
    fetch_generation: Generation,
    suggesting: bool,
    fetching: bool,
}

impl SearchState {
    pub fn new(pinned: PinnedCities) -> Self {
        Self {
            query: String::new(),
            suggestions: Vec::new(),
            active: None,
            pinned,
            error: None,
            resolved: None,
            suggest_generation: Generation::default(),
            fetch_generation: Generation::default(),
            suggesting: false,
            fetching: false,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn suggestions(&self) -> &[Suggestion] {
        &self.suggestions
    }

    pub fn active(&self) -> Option<&WeatherRecord> {
        self.active.as_ref()
    }

    pub fn pinned(&self) -> &[WeatherRecord] {
        self.pinned.list()
    }

    pub fn is_pinned(&self, location_name: &str) -> bool {
        self.pinned.contains(location_name)
    }

    /// Message from the last failed lookup, cleared when the next one starts.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Location name the provider returned for the last applied lookup,
    /// whether it became the active city or refreshed a pinned one.
    pub fn last_resolved(&self) -> Option<&str> {
        self.resolved.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.fetching
    }

    pub fn phase(&self) -> Phase {
        if self.fetching {
            Phase::Fetching
        } else if self.suggesting {
            Phase::Suggesting
        } else {
            Phase::Idle
        }
    }

    /// Records typed text. Returns a ticket when the text warrants a
    /// suggestion lookup; any older lookup is superseded either way.
    pub fn begin_suggest(&mut self, text: &str) -> Option<SuggestTicket> {
        self.query = text.to_string();
        let generation = self.suggest_generation.advance();

        if wants_suggestions(text) {
            self.suggesting = true;
            Some(SuggestTicket { generation, text: text.to_string() })
        } else {
            self.suggestions.clear();
            self.suggesting = false;
            None
        }
    }

    /// Applies a suggestion list. Returns `false` if the ticket was superseded.
    pub fn finish_suggest(&mut self, ticket: SuggestTicket, suggestions: Vec<Suggestion>) -> bool {
        if !self.suggest_generation.is_current(ticket.generation) {
            tracing::debug!("Discarding stale suggestions for {:?}", ticket.text);
            return false;
        }

        self.suggestions = suggestions;
        self.suggesting = false;
        true
    }

    /// Starts a lookup for `city`. Blank names issue nothing.
    pub fn begin_fetch(&mut self, city: &str) -> Option<FetchTicket> {
        let city = city.trim();
        if city.is_empty() {
            return None;
        }

        self.suggest_generation.advance();
        self.suggestions.clear();
        self.suggesting = false;

        self.active = None;
        self.error = None;
        self.resolved = None;
        self.fetching = true;

        Some(FetchTicket {
            generation: self.fetch_generation.advance(),
            city: city.to_string(),
        })
    }

    /// Lookup for the current query.
    pub fn submit(&mut self) -> Option<FetchTicket> {
        let query = self.query.clone();
        self.begin_fetch(&query)
    }

    /// Adopts the suggestion at `index` as the query and starts its lookup.
    pub fn select(&mut self, index: usize) -> Option<FetchTicket> {
        let name = self.suggestions.get(index)?.name.clone();
        self.query = name.clone();
        self.begin_fetch(&name)
    }

    /// Applies a lookup result. Returns `false` if the ticket was superseded.
    ///
    /// A city that is already pinned has its pinned entry refreshed instead
    /// of becoming the active city.
    pub fn finish_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<WeatherRecord, FetchError>,
    ) -> bool {
        if !self.fetch_generation.is_current(ticket.generation) {
            tracing::debug!("Discarding stale weather result for {:?}", ticket.city);
            return false;
        }

        self.fetching = false;
        self.suggestions.clear();

        match result {
            Ok(record) if self.pinned.contains(&record.location_name) => {
                self.active = None;
                self.resolved = Some(record.location_name.clone());
                if let Err(e) = self.pinned.replace(record) {
                    tracing::warn!("Could not persist refreshed pinned city: {e:#}");
                }
            }
            Ok(record) => {
                self.resolved = Some(record.location_name.clone());
                self.active = Some(record);
            }
            Err(e) => {
                self.active = None;
                self.error = Some(e.user_message());
            }
        }

        true
    }

    /// Moves the active city into the pinned set. Returns its name, or
    /// `None` when there is no active city.
    pub fn pin_active(&mut self) -> Result<Option<String>> {
        let Some(record) = self.active.take() else {
            return Ok(None);
        };

        let name = record.location_name.clone();
        self.pinned.pin(record)?;
        Ok(Some(name))
    }

    /// Pins a record obtained outside the active-city path.
    pub fn pin_record(&mut self, record: WeatherRecord) -> Result<bool> {
        if self.active.as_ref().is_some_and(|a| a.is_same_city(&record.location_name)) {
            self.active = None;
        }
        self.pinned.pin(record)
    }

    pub fn unpin(&mut self, location_name: &str) -> Result<bool> {
        self.pinned.unpin(location_name)
    }

    /// Unpins a pinned city, or pins the active city when it has this name.
    pub fn toggle_pin(&mut self, location_name: &str) -> Result<PinChange> {
        if self.pinned.unpin(location_name)? {
            return Ok(PinChange::Unpinned);
        }

        let is_active = self.active.as_ref().is_some_and(|a| a.is_same_city(location_name));
        if !is_active {
            return Ok(PinChange::Unchanged);
        }

        self.pin_active()?;
        Ok(PinChange::Pinned)
    }

    pub fn replace_pinned(&mut self, record: WeatherRecord) -> Result<bool> {
        self.pinned.replace(record)
    }

    pub fn pinned_names(&self) -> Vec<String> {
        self.pinned.list().iter().map(|r| r.location_name.clone()).collect()
    }
}

/// Drives a [`SearchState`] with the suggester and fetcher.
#[derive(Debug)]
pub struct Coordinator {
    suggester: Suggester,
    fetcher: Fetcher,
    state: RefCell<SearchState>,
}

impl Coordinator {
    pub fn new(providers: Providers, units: Units, pinned: PinnedCities) -> Self {
        Self::from_parts(
            Suggester::new(providers.geocode),
            Fetcher::new(providers.weather, units),
            pinned,
        )
    }

    pub fn from_parts(suggester: Suggester, fetcher: Fetcher, pinned: PinnedCities) -> Self {
        Self {
            suggester,
            fetcher,
            state: RefCell::new(SearchState::new(pinned)),
        }
    }

    /// Read access for rendering. Do not hold across an `.await`.
    pub fn state(&self) -> Ref<'_, SearchState> {
        self.state.borrow()
    }

    /// Typing event. Returns `true` if this call's suggestions were applied.
    pub async fn input(&self, text: &str) -> bool {
        let Some(ticket) = self.state.borrow_mut().begin_suggest(text) else {
            return false;
        };

        let suggestions = self.suggester.suggest(&ticket.text).await;
        self.state.borrow_mut().finish_suggest(ticket, suggestions)
    }

    /// Submit event for the current query.
    pub async fn submit(&self) -> bool {
        let ticket = self.state.borrow_mut().submit();
        self.run_fetch(ticket).await
    }

    /// Suggestion click.
    pub async fn select(&self, index: usize) -> bool {
        let ticket = self.state.borrow_mut().select(index);
        self.run_fetch(ticket).await
    }

    /// Sets the query to `city` and submits it.
    pub async fn search(&self, city: &str) -> bool {
        let ticket = {
            let mut state = self.state.borrow_mut();
            state.query = city.to_string();
            state.submit()
        };
        self.run_fetch(ticket).await
    }

    async fn run_fetch(&self, ticket: Option<FetchTicket>) -> bool {
        let Some(ticket) = ticket else {
            return false;
        };

        let result = self.fetcher.fetch(&ticket.city).await;
        self.state.borrow_mut().finish_fetch(ticket, result)
    }

    pub fn pin_active(&self) -> Result<Option<String>> {
        self.state.borrow_mut().pin_active()
    }

    pub fn unpin(&self, location_name: &str) -> Result<bool> {
        self.state.borrow_mut().unpin(location_name)
    }

    pub fn toggle_pin(&self, location_name: &str) -> Result<PinChange> {
        self.state.borrow_mut().toggle_pin(location_name)
    }

    /// Looks `city` up and pins the result without touching the active city
    /// lifecycle. Returns the pinned name and whether it was newly added.
    pub async fn pin_city(&self, city: &str) -> Result<(String, bool)> {
        let record = self.fetcher.fetch(city).await?;
        let name = record.location_name.clone();
        let added = self.state.borrow_mut().pin_record(record)?;
        Ok((name, added))
    }

    /// Re-fetches every pinned city in order. Failed lookups keep the old
    /// record. Returns how many entries were refreshed.
    pub async fn refresh_pinned(&self) -> usize {
        let names = self.state.borrow().pinned_names();
        let mut refreshed = 0;

        for name in names {
            match self.fetcher.fetch(&name).await {
                Ok(record) if record.is_same_city(&name) => {
                    match self.state.borrow_mut().replace_pinned(record) {
                        Ok(true) => refreshed += 1,
                        Ok(false) => {}
                        Err(e) => tracing::warn!("Could not persist refreshed {name}: {e:#}"),
                    }
                }
                Ok(record) => tracing::warn!(
                    "Refresh of {name} resolved to {}; keeping the pinned record",
                    record.location_name
                ),
                Err(e) => tracing::warn!("Could not refresh {name}: {e}"),
            }
        }

        refreshed
    }
}
