//! The async map session.
//!
//! One tokio task owns every controller. UI events arrive over an mpsc
//! channel, fetches run as spawned tasks that report back with the token
//! they were issued under, and the resulting view state is published on a
//! watch channel after every step.

use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::controllers::{
    DetailsPanel, DragRelease, Layout, MarkerKey, MarkerRefreshController, PanelContent,
    PanelTransform, PanelVisibility, RefreshOutcome, RefreshRequest, RefreshState, SearchController,
    SearchMarker, SearchRequest, SuggestionRequest,
};
use crate::error::{MapError, Result};
use crate::fetchers::{ForecastSource, StationSource, SuggestionSource};
use crate::formatters::DisplayZone;
use crate::models::{Bounds, Coordinate, ForecastPayload, StationMarker, SuggestionRecord};
use crate::utils::constants::{MARKER_ZOOM, SEARCH_ZOOM, WIDE_VIEWPORT_MIN_WIDTH};

const EVENT_BUFFER: usize = 64;

/// Input from the map front end
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    /// Move-end with the bounds now visible
    ViewportChanged(Bounds),
    MarkerClicked(MarkerKey),
    BackgroundClicked,
    Resized { width: u32 },
    DragStarted { y: f64, panel_height: f64 },
    DragMoved { y: f64 },
    DragEnded,
    SearchInput(String),
    SearchSubmitted,
    SuggestionPicked(usize),
    SearchDismissed,
}

/// Instructions for the map renderer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapCommand {
    FlyTo { center: Coordinate, zoom: u8 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapSnapshot {
    pub refresh_state: RefreshState,
    pub generation: u64,
    /// Result of the latest bounds fetch that was not superseded
    pub last_refresh: Option<RefreshOutcome>,
    pub markers: Vec<StationMarker>,
    pub highlighted: Option<MarkerKey>,
    pub panel_visibility: PanelVisibility,
    pub panel_layout: Layout,
    pub panel_transform: PanelTransform,
    pub panel_content: Option<PanelContent>,
    pub query: String,
    pub suggestions: Vec<SuggestionRecord>,
    pub dropdown_open: bool,
    pub search_marker: Option<SearchMarker>,
}

enum Completion {
    Stations {
        generation: u64,
        result: Result<Vec<StationMarker>>,
    },
    Forecast {
        token: u64,
        payload: Option<ForecastPayload>,
    },
    Suggestions {
        id: u64,
        records: Vec<SuggestionRecord>,
    },
    Search {
        id: u64,
        record: Option<SuggestionRecord>,
    },
}

/// Builder for a map session over the three data sources
pub struct MapSession<S, F, G> {
    stations: Arc<S>,
    forecasts: Arc<F>,
    geocoder: Arc<G>,
    zone: DisplayZone,
    viewport_width: u32,
    initial_bounds: Option<Bounds>,
}

impl<S, F, G> MapSession<S, F, G>
where
    S: StationSource,
    F: ForecastSource,
    G: SuggestionSource,
{
    pub fn new(stations: S, forecasts: F, geocoder: G) -> Self {
        Self {
            stations: Arc::new(stations),
            forecasts: Arc::new(forecasts),
            geocoder: Arc::new(geocoder),
            zone: DisplayZone::default(),
            viewport_width: WIDE_VIEWPORT_MIN_WIDTH,
            initial_bounds: None,
        }
    }

    pub fn with_display_zone(mut self, zone: DisplayZone) -> Self {
        self.zone = zone;
        self
    }

    pub fn with_viewport_width(mut self, width: u32) -> Self {
        self.viewport_width = width;
        self
    }

    /// Bounds to load markers for as soon as the session starts
    pub fn with_initial_bounds(mut self, bounds: Bounds) -> Self {
        self.initial_bounds = Some(bounds);
        self
    }

    /// Start the session task on the current runtime
    pub fn spawn(self) -> MapHandle {
        let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER);
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (done_tx, done_rx) = mpsc::unbounded_channel();

        let state = SessionState {
            stations: self.stations,
            forecasts: self.forecasts,
            geocoder: self.geocoder,
            zone: self.zone,
            markers: MarkerRefreshController::new(),
            panel: DetailsPanel::new(self.viewport_width),
            search: SearchController::new(),
            last_refresh: None,
            commands: command_tx,
            done: done_tx,
        };
        let (snapshot_tx, snapshot_rx) = watch::channel(state.snapshot());

        let task = tokio::spawn(state.run(self.initial_bounds, event_rx, done_rx, snapshot_tx));

        MapHandle {
            events: event_tx,
            commands: command_rx,
            snapshots: snapshot_rx,
            task,
        }
    }
}

/// Front-end side of a running session
pub struct MapHandle {
    events: mpsc::Sender<MapEvent>,
    commands: mpsc::UnboundedReceiver<MapCommand>,
    snapshots: watch::Receiver<MapSnapshot>,
    task: JoinHandle<()>,
}

impl MapHandle {
    pub async fn send(&self, event: MapEvent) -> Result<()> {
        self.events
            .send(event)
            .await
            .map_err(|_| MapError::ChannelClosed)
    }

    pub fn snapshot(&self) -> MapSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<MapSnapshot> {
        self.snapshots.clone()
    }

    pub async fn next_command(&mut self) -> Option<MapCommand> {
        self.commands.recv().await
    }

    pub fn try_next_command(&mut self) -> Option<MapCommand> {
        self.commands.try_recv().ok()
    }

    /// Close the event channel and wait for the session to wind down
    pub async fn shutdown(self) -> Result<()> {
        drop(self.events);
        self.task.await?;
        Ok(())
    }
}

struct SessionState<S, F, G> {
    stations: Arc<S>,
    forecasts: Arc<F>,
    geocoder: Arc<G>,
    zone: DisplayZone,
    markers: MarkerRefreshController,
    panel: DetailsPanel,
    search: SearchController,
    last_refresh: Option<RefreshOutcome>,
    commands: mpsc::UnboundedSender<MapCommand>,
    done: mpsc::UnboundedSender<Completion>,
}

impl<S, F, G> SessionState<S, F, G>
where
    S: StationSource,
    F: ForecastSource,
    G: SuggestionSource,
{
    async fn run(
        mut self,
        initial_bounds: Option<Bounds>,
        mut events: mpsc::Receiver<MapEvent>,
        mut done: mpsc::UnboundedReceiver<Completion>,
        snapshots: watch::Sender<MapSnapshot>,
    ) {
        info!("Map session started");

        if let Some(bounds) = initial_bounds {
            let request = self.markers.refresh_now(bounds);
            self.spawn_refresh(request);
            snapshots.send_replace(self.snapshot());
        }

        loop {
            let deadline = self.next_deadline();

            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event, Instant::now()),
                    None => break,
                },
                Some(completion) = done.recv() => {
                    self.handle_completion(completion, Instant::now());
                }
                _ = sleep_until(deadline) => {}
            }

            self.poll(Instant::now());
            snapshots.send_replace(self.snapshot());
        }

        info!("Map session stopped");
    }

    fn next_deadline(&self) -> Option<Instant> {
        match (self.markers.next_deadline(), self.search.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn poll(&mut self, now: Instant) {
        if let Some(request) = self.markers.poll(now) {
            self.spawn_refresh(request);
        }
        if let Some(request) = self.search.poll(now) {
            self.spawn_suggestions(request);
        }
    }

    fn handle_event(&mut self, event: MapEvent, now: Instant) {
        debug!("Map event: {:?}", event);

        match event {
            MapEvent::ViewportChanged(bounds) => {
                self.markers.on_viewport_change(bounds, now);
            }
            MapEvent::MarkerClicked(key) => self.open_marker(key, now),
            MapEvent::BackgroundClicked => {
                if self.panel.hide() {
                    self.markers.clear_selection();
                }
            }
            MapEvent::Resized { width } => self.panel.resize(width),
            MapEvent::DragStarted { y, panel_height } => {
                self.panel.begin_drag(y, panel_height);
            }
            MapEvent::DragMoved { y } => {
                self.panel.drag_to(y);
            }
            MapEvent::DragEnded => {
                if self.panel.end_drag() == Some(DragRelease::Dismissed) {
                    self.markers.clear_selection();
                }
            }
            MapEvent::SearchInput(text) => self.search.on_input(text, now),
            MapEvent::SearchSubmitted => {
                if let Some(request) = self.search.submit() {
                    self.spawn_search(request);
                }
            }
            MapEvent::SuggestionPicked(index) => {
                if let Some(center) = self.search.pick(index, now) {
                    self.fly_to(center, SEARCH_ZOOM);
                }
            }
            MapEvent::SearchDismissed => self.search.dismiss_dropdown(),
        }
    }

    fn open_marker(&mut self, key: MarkerKey, now: Instant) {
        let Some(marker) = self.markers.select(key).cloned() else {
            warn!("Click on unknown marker {:?}", key);
            return;
        };

        self.markers.begin_fly_to(now);
        self.fly_to(marker.coordinate, MARKER_ZOOM);

        if let (Some(token), Some(station_id)) =
            (self.panel.show_station(&marker), marker.station_id)
        {
            self.spawn_forecast(token, station_id);
        }
    }

    fn handle_completion(&mut self, completion: Completion, now: Instant) {
        match completion {
            Completion::Stations { generation, result } => {
                let outcome = self.markers.complete(generation, result);
                debug!("Marker refresh {}: {:?}", generation, outcome);
                if outcome != RefreshOutcome::Stale {
                    self.last_refresh = Some(outcome);
                }
            }
            Completion::Forecast { token, payload } => {
                let view = payload.map(|p| self.zone.format(&p));
                self.panel.resolve_forecast(token, view);
            }
            Completion::Suggestions { id, records } => {
                self.search.complete_suggestions(id, records);
            }
            Completion::Search { id, record } => {
                if let Some(center) = self.search.complete_search(id, record, now) {
                    self.fly_to(center, SEARCH_ZOOM);
                }
            }
        }
    }

    fn fly_to(&self, center: Coordinate, zoom: u8) {
        if self.commands.send(MapCommand::FlyTo { center, zoom }).is_err() {
            debug!("No map renderer listening for commands");
        }
    }

    fn spawn_refresh(&self, request: RefreshRequest) {
        let stations = Arc::clone(&self.stations);
        self.spawn_fetch(async move {
            let result = stations.stations_in(request.bounds).await;
            Completion::Stations {
                generation: request.generation,
                result,
            }
        });
    }

    fn spawn_forecast(&self, token: u64, station_id: String) {
        let forecasts = Arc::clone(&self.forecasts);
        self.spawn_fetch(async move {
            let payload = forecasts.forecast(&station_id).await;
            Completion::Forecast { token, payload }
        });
    }

    fn spawn_suggestions(&self, request: SuggestionRequest) {
        let geocoder = Arc::clone(&self.geocoder);
        self.spawn_fetch(async move {
            let records = geocoder.suggestions(&request.query).await;
            Completion::Suggestions {
                id: request.id,
                records,
            }
        });
    }

    fn spawn_search(&self, request: SearchRequest) {
        let geocoder = Arc::clone(&self.geocoder);
        self.spawn_fetch(async move {
            let record = geocoder.search_location(&request.query).await;
            Completion::Search {
                id: request.id,
                record,
            }
        });
    }

    fn spawn_fetch<Fut>(&self, fetch: Fut)
    where
        Fut: Future<Output = Completion> + Send + 'static,
    {
        let done = self.done.clone();
        tokio::spawn(async move {
            // The session may have stopped while we were waiting
            let _ = done.send(fetch.await);
        });
    }

    fn snapshot(&self) -> MapSnapshot {
        MapSnapshot {
            refresh_state: self.markers.state(),
            generation: self.markers.generation(),
            last_refresh: self.last_refresh,
            markers: self.markers.markers().to_vec(),
            highlighted: self.markers.highlighted(),
            panel_visibility: self.panel.visibility(),
            panel_layout: self.panel.layout(),
            panel_transform: self.panel.transform(),
            panel_content: self.panel.content().cloned(),
            query: self.search.query().to_string(),
            suggestions: self.search.suggestions().to_vec(),
            dropdown_open: self.search.is_dropdown_open(),
            search_marker: self.search.search_marker().cloned(),
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
