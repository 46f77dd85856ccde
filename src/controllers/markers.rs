//! Marker refresh state machine.
//!
//! Viewport changes are debounced into bounds fetches. Every successful fetch
//! replaces the marker set wholesale; since markers have no identity across
//! refreshes, the selection is carried as a coordinate and re-applied to
//! whichever new marker lies within the selection epsilon.

use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::controllers::debounce::Debouncer;
use crate::error::Result;
use crate::models::{Bounds, Coordinate, StationMarker};
use crate::utils::constants::{VIEWPORT_DEBOUNCE, ZOOM_GUARD_FALLBACK};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RefreshState {
    Idle,
    Refreshing,
}

/// Identifies a marker within one refresh generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct MarkerKey {
    pub generation: u64,
    pub index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefreshRequest {
    pub generation: u64,
    pub bounds: Bounds,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportOutcome {
    Scheduled,
    /// The move was our own fly-to animation finishing
    Suppressed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RefreshOutcome {
    Applied { markers: usize, highlighted: bool },
    /// A newer marker set is already displayed
    Stale,
    Failed,
}

/// The station the user picked, remembered by position
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SelectionState {
    coordinate: Option<Coordinate>,
}

impl SelectionState {
    pub fn coordinate(&self) -> Option<Coordinate> {
        self.coordinate
    }

    pub fn matches(&self, marker: &StationMarker) -> bool {
        self.coordinate
            .is_some_and(|c| c.is_near(&marker.coordinate))
    }
}

#[derive(Debug)]
pub struct MarkerRefreshController {
    debounce: Debouncer,
    pending_bounds: Option<Bounds>,
    zoom_guard_until: Option<Instant>,
    in_flight: usize,
    issued: u64,
    applied: u64,
    markers: Vec<StationMarker>,
    selection: SelectionState,
    highlighted: Option<usize>,
}

impl Default for MarkerRefreshController {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkerRefreshController {
    pub fn new() -> Self {
        Self {
            debounce: Debouncer::new(VIEWPORT_DEBOUNCE),
            pending_bounds: None,
            zoom_guard_until: None,
            in_flight: 0,
            issued: 0,
            applied: 0,
            markers: Vec::new(),
            selection: SelectionState::default(),
            highlighted: None,
        }
    }

    pub fn state(&self) -> RefreshState {
        if self.in_flight > 0 {
            RefreshState::Refreshing
        } else {
            RefreshState::Idle
        }
    }

    /// Generation of the marker set currently displayed
    pub fn generation(&self) -> u64 {
        self.applied
    }

    pub fn markers(&self) -> &[StationMarker] {
        &self.markers
    }

    pub fn marker(&self, key: MarkerKey) -> Option<&StationMarker> {
        if key.generation != self.applied {
            return None;
        }
        self.markers.get(key.index)
    }

    pub fn key_for(&self, index: usize) -> MarkerKey {
        MarkerKey {
            generation: self.applied,
            index,
        }
    }

    pub fn highlighted(&self) -> Option<MarkerKey> {
        self.highlighted.map(|index| self.key_for(index))
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn is_zoom_guarded(&self, now: Instant) -> bool {
        self.zoom_guard_until.is_some_and(|until| now < until)
    }

    /// Move-end from the map; schedules a debounced refresh unless we are flying to a marker
    pub fn on_viewport_change(&mut self, bounds: Bounds, now: Instant) -> ViewportOutcome {
        self.pending_bounds = Some(bounds);

        if self.is_zoom_guarded(now) {
            debug!("Viewport change during fly-to, refresh suppressed");
            self.zoom_guard_until = None;
            return ViewportOutcome::Suppressed;
        }

        self.zoom_guard_until = None;
        self.debounce.trigger(now);
        ViewportOutcome::Scheduled
    }

    /// Raise the guard before animating the map onto a marker
    pub fn begin_fly_to(&mut self, now: Instant) {
        self.zoom_guard_until = Some(now + ZOOM_GUARD_FALLBACK);
    }

    /// Issue a refresh immediately, e.g. for the initial load
    pub fn refresh_now(&mut self, bounds: Bounds) -> RefreshRequest {
        self.pending_bounds = Some(bounds);
        self.debounce.cancel();
        self.issue(bounds)
    }

    /// Advance timers; returns a request when the debounce window has elapsed
    pub fn poll(&mut self, now: Instant) -> Option<RefreshRequest> {
        if self
            .zoom_guard_until
            .is_some_and(|until| until <= now)
        {
            debug!("Fly-to guard expired without a move-end");
            self.zoom_guard_until = None;
        }

        if !self.debounce.fire(now) {
            return None;
        }
        let bounds = self.pending_bounds?;
        Some(self.issue(bounds))
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.debounce.deadline(), self.zoom_guard_until) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn issue(&mut self, bounds: Bounds) -> RefreshRequest {
        self.issued += 1;
        self.in_flight += 1;
        debug!("Refreshing markers (generation {}) for {:?}", self.issued, bounds);
        RefreshRequest {
            generation: self.issued,
            bounds,
        }
    }

    /// Apply the result of a bounds fetch
    pub fn complete(
        &mut self,
        generation: u64,
        result: Result<Vec<StationMarker>>,
    ) -> RefreshOutcome {
        self.in_flight = self.in_flight.saturating_sub(1);

        let markers = match result {
            Ok(markers) => markers,
            Err(e) => {
                error!("Error updating markers: {}", e);
                return RefreshOutcome::Failed;
            }
        };

        if generation < self.applied {
            debug!(
                "Discarding marker set {} older than displayed set {}",
                generation, self.applied
            );
            return RefreshOutcome::Stale;
        }

        self.markers = markers;
        self.applied = generation;
        self.highlighted = self
            .markers
            .iter()
            .position(|m| self.selection.matches(m));

        if self.markers.is_empty() {
            info!("No markers found in the current viewport");
        }

        RefreshOutcome::Applied {
            markers: self.markers.len(),
            highlighted: self.highlighted.is_some(),
        }
    }

    /// Highlight the marker behind `key` and remember its position
    pub fn select(&mut self, key: MarkerKey) -> Option<&StationMarker> {
        let coordinate = self.marker(key)?.coordinate;
        self.selection.coordinate = Some(coordinate);
        self.highlighted = Some(key.index);
        self.markers.get(key.index)
    }

    pub fn clear_selection(&mut self) {
        self.selection = SelectionState::default();
        self.highlighted = None;
    }
}
