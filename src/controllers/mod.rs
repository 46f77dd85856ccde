//! Synchronous state machines driven by the map session.
//!
//! Controllers never touch the network or the clock themselves: callers pass
//! the current [`tokio::time::Instant`] in and receive request descriptors
//! (with generation tokens) to execute.

pub mod debounce;
pub mod markers;
pub mod panel;
pub mod search;

pub use debounce::Debouncer;
pub use markers::{
    MarkerKey, MarkerRefreshController, RefreshOutcome, RefreshRequest, RefreshState,
    SelectionState, ViewportOutcome,
};
pub use panel::{
    DetailsPanel, DragRelease, Layout, PanelBody, PanelContent, PanelTransform, PanelVisibility,
};
pub use search::{SearchController, SearchMarker, SearchRequest, SuggestionRequest};
