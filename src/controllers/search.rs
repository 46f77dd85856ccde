//! Search box state: debounced suggestions, Enter search and the temporary
//! result marker.

use serde::Serialize;
use tokio::time::Instant;
use tracing::debug;

use crate::controllers::debounce::Debouncer;
use crate::fetchers::is_searchable;
use crate::models::{Coordinate, SuggestionRecord};
use crate::utils::constants::{SEARCH_DEBOUNCE, SEARCH_MARKER_LIFETIME};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionRequest {
    pub id: u64,
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub id: u64,
    pub query: String,
}

/// Marker for a search hit; removed again once `expires_at` passes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchMarker {
    pub coordinate: Coordinate,
    pub label: String,
    #[serde(skip)]
    pub expires_at: Instant,
}

#[derive(Debug)]
pub struct SearchController {
    query: String,
    debounce: Debouncer,
    latest_suggestion: u64,
    latest_search: u64,
    suggestions: Vec<SuggestionRecord>,
    dropdown_open: bool,
    marker: Option<SearchMarker>,
}

impl Default for SearchController {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchController {
    pub fn new() -> Self {
        Self {
            query: String::new(),
            debounce: Debouncer::new(SEARCH_DEBOUNCE),
            latest_suggestion: 0,
            latest_search: 0,
            suggestions: Vec::new(),
            dropdown_open: false,
            marker: None,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn suggestions(&self) -> &[SuggestionRecord] {
        &self.suggestions
    }

    pub fn is_dropdown_open(&self) -> bool {
        self.dropdown_open
    }

    pub fn search_marker(&self) -> Option<&SearchMarker> {
        self.marker.as_ref()
    }

    pub fn on_input(&mut self, text: impl Into<String>, now: Instant) {
        self.query = text.into();

        if is_searchable(&self.query) {
            self.debounce.trigger(now);
        } else {
            self.debounce.cancel();
            // Anything still in flight belongs to a longer query
            self.latest_suggestion += 1;
            self.close_dropdown();
        }
    }

    /// Advance timers; returns a suggestion request once typing has paused
    pub fn poll(&mut self, now: Instant) -> Option<SuggestionRequest> {
        if self.marker.as_ref().is_some_and(|m| m.expires_at <= now) {
            debug!("Search marker expired");
            self.marker = None;
        }

        if !self.debounce.fire(now) {
            return None;
        }

        self.latest_suggestion += 1;
        Some(SuggestionRequest {
            id: self.latest_suggestion,
            query: self.query.clone(),
        })
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        let expiry = self.marker.as_ref().map(|m| m.expires_at);
        match (self.debounce.deadline(), expiry) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Apply a suggestion response; returns false when it was superseded
    pub fn complete_suggestions(&mut self, id: u64, records: Vec<SuggestionRecord>) -> bool {
        if id != self.latest_suggestion {
            debug!(
                "Discarding suggestions for request {} (latest {})",
                id, self.latest_suggestion
            );
            return false;
        }

        self.dropdown_open = !records.is_empty();
        self.suggestions = records;
        true
    }

    /// Enter key: search the current text directly
    pub fn submit(&mut self) -> Option<SearchRequest> {
        self.debounce.cancel();
        self.latest_suggestion += 1;
        self.close_dropdown();

        if !is_searchable(&self.query) {
            return None;
        }

        self.latest_search += 1;
        Some(SearchRequest {
            id: self.latest_search,
            query: self.query.clone(),
        })
    }

    /// Apply an Enter search result; returns where to move the map
    pub fn complete_search(
        &mut self,
        id: u64,
        record: Option<SuggestionRecord>,
        now: Instant,
    ) -> Option<Coordinate> {
        if id != self.latest_search {
            debug!("Discarding search result {} (latest {})", id, self.latest_search);
            return None;
        }

        let record = record?;
        Some(self.place_marker(record, now))
    }

    /// Choose an entry from the dropdown
    pub fn pick(&mut self, index: usize, now: Instant) -> Option<Coordinate> {
        if !self.dropdown_open {
            return None;
        }
        let record = self.suggestions.get(index)?.clone();

        self.debounce.cancel();
        self.latest_suggestion += 1;
        self.query = record.display_name.clone();
        self.close_dropdown();

        Some(self.place_marker(record, now))
    }

    pub fn dismiss_dropdown(&mut self) {
        self.dropdown_open = false;
    }

    fn close_dropdown(&mut self) {
        self.dropdown_open = false;
        self.suggestions.clear();
    }

    fn place_marker(&mut self, record: SuggestionRecord, now: Instant) -> Coordinate {
        let coordinate = record.coordinate;
        self.marker = Some(SearchMarker {
            coordinate,
            label: record.display_name,
            expires_at: now + SEARCH_MARKER_LIFETIME,
        });
        coordinate
    }
}
