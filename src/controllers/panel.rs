//! Details panel state machine.
//!
//! The panel slides in from the right on wide viewports and up from the
//! bottom on narrow ones, where it can also be dragged down to dismiss.

use serde::Serialize;
use tracing::debug;

use crate::formatters::ForecastView;
use crate::models::StationMarker;
use crate::utils::constants::{DISMISS_THRESHOLD_PERCENT, WIDE_VIEWPORT_MIN_WIDTH};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PanelVisibility {
    Hidden,
    Visible,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Layout {
    Narrow,
    Wide,
}

impl Layout {
    pub fn for_width(width: u32) -> Self {
        if width >= WIDE_VIEWPORT_MIN_WIDTH {
            Layout::Wide
        } else {
            Layout::Narrow
        }
    }
}

/// What the forecast section of the panel currently shows
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "view", rename_all = "snake_case")]
pub enum PanelBody {
    Loading,
    Forecast(ForecastView),
    LoadFailed,
    /// The marker carries no station id to fetch a forecast for
    NoForecastAvailable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelContent {
    pub title: String,
    pub lines: Vec<String>,
    pub body: PanelBody,
}

/// Slide offset in percent of the panel's own size
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum PanelTransform {
    TranslateX(f64),
    TranslateY(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragRelease {
    Opened,
    Dismissed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct DragState {
    start_y: f64,
    panel_height: f64,
    offset_percent: f64,
}

#[derive(Debug)]
pub struct DetailsPanel {
    visibility: PanelVisibility,
    layout: Layout,
    content: Option<PanelContent>,
    token: u64,
    drag: Option<DragState>,
}

impl DetailsPanel {
    pub fn new(width: u32) -> Self {
        Self {
            visibility: PanelVisibility::Hidden,
            layout: Layout::for_width(width),
            content: None,
            token: 0,
            drag: None,
        }
    }

    pub fn visibility(&self) -> PanelVisibility {
        self.visibility
    }

    pub fn is_visible(&self) -> bool {
        self.visibility == PanelVisibility::Visible
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn content(&self) -> Option<&PanelContent> {
        self.content.as_ref()
    }

    /// Open the panel for a marker.
    ///
    /// Returns the token the forecast result must be resolved with, or `None`
    /// when the marker has no station id and nothing will be fetched.
    pub fn show_station(&mut self, marker: &StationMarker) -> Option<u64> {
        self.token += 1;
        self.visibility = PanelVisibility::Visible;
        self.drag = None;

        let body = if marker.station_id.is_some() {
            PanelBody::Loading
        } else {
            PanelBody::NoForecastAvailable
        };

        self.content = Some(PanelContent {
            title: marker.title.clone(),
            lines: marker.info_lines(),
            body,
        });

        marker.station_id.as_ref().map(|_| self.token)
    }

    /// Fill in the forecast section; `None` means the fetch failed.
    ///
    /// Returns false when the result belongs to a station no longer shown.
    pub fn resolve_forecast(&mut self, token: u64, view: Option<ForecastView>) -> bool {
        if token != self.token {
            debug!("Ignoring forecast for panel token {} (current {})", token, self.token);
            return false;
        }

        match self.content.as_mut() {
            Some(content) if content.body == PanelBody::Loading => {
                content.body = match view {
                    Some(view) => PanelBody::Forecast(view),
                    None => PanelBody::LoadFailed,
                };
                true
            }
            _ => false,
        }
    }

    /// Returns true when the panel was visible
    pub fn hide(&mut self) -> bool {
        self.drag = None;
        if self.visibility == PanelVisibility::Hidden {
            return false;
        }
        self.visibility = PanelVisibility::Hidden;
        // Invalidate any forecast still in flight
        self.token += 1;
        true
    }

    pub fn resize(&mut self, width: u32) {
        let layout = Layout::for_width(width);
        if layout != self.layout {
            debug!("Panel layout changed to {:?}", layout);
            self.layout = layout;
            if layout == Layout::Wide {
                self.drag = None;
            }
        }
    }

    pub fn transform(&self) -> PanelTransform {
        let offset = match self.visibility {
            PanelVisibility::Hidden => 100.0,
            PanelVisibility::Visible => self.drag.map_or(0.0, |d| d.offset_percent),
        };

        match self.layout {
            Layout::Wide => PanelTransform::TranslateX(offset),
            Layout::Narrow => PanelTransform::TranslateY(offset),
        }
    }

    /// Start dragging the handle; only possible on a visible narrow panel
    pub fn begin_drag(&mut self, y: f64, panel_height: f64) -> bool {
        let usable = self.layout == Layout::Narrow
            && self.is_visible()
            && y.is_finite()
            && panel_height.is_finite()
            && panel_height > 0.0;
        if !usable {
            return false;
        }

        self.drag = Some(DragState {
            start_y: y,
            panel_height,
            offset_percent: 0.0,
        });
        true
    }

    /// Track the pointer; returns the new offset in percent
    pub fn drag_to(&mut self, y: f64) -> Option<f64> {
        let drag = self.drag.as_mut()?;
        if y.is_finite() {
            let delta = y - drag.start_y;
            drag.offset_percent = (delta / drag.panel_height * 100.0).clamp(0.0, 100.0);
        }
        Some(drag.offset_percent)
    }

    pub fn end_drag(&mut self) -> Option<DragRelease> {
        let drag = self.drag.take()?;
        if drag.offset_percent >= DISMISS_THRESHOLD_PERCENT {
            self.hide();
            Some(DragRelease::Dismissed)
        } else {
            Some(DragRelease::Opened)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Coordinate;
    use pretty_assertions::assert_eq;

    fn station(id: Option<&str>) -> StationMarker {
        StationMarker::new(
            id.map(str::to_string),
            Coordinate::new(54.3, 10.1).unwrap(),
            "Kiel-Holtenau".to_string(),
        )
        .with_readings(Some(11.5), None, Some(14.0))
    }

    #[test]
    fn test_layout_breakpoint() {
        assert_eq!(Layout::for_width(767), Layout::Narrow);
        assert_eq!(Layout::for_width(768), Layout::Wide);
    }

    #[test]
    fn test_show_station_starts_loading() {
        let mut panel = DetailsPanel::new(1024);
        let token = panel.show_station(&station(Some("10046")));

        assert!(token.is_some());
        assert!(panel.is_visible());
        assert_eq!(
            panel.content().unwrap(),
            &PanelContent {
                title: "Kiel-Holtenau".to_string(),
                lines: vec![
                    "Stations-ID: 10046".to_string(),
                    "Temperatur: 11.5°C".to_string(),
                    "Windgeschwindigkeit: 14 km/h".to_string(),
                ],
                body: PanelBody::Loading,
            }
        );
        assert_eq!(panel.transform(), PanelTransform::TranslateX(0.0));
    }

    #[test]
    fn test_station_without_id_skips_fetch() {
        let mut panel = DetailsPanel::new(1024);
        assert!(panel.show_station(&station(None)).is_none());
        assert_eq!(panel.content().unwrap().body, PanelBody::NoForecastAvailable);
        assert_eq!(panel.content().unwrap().lines[0], "Stations-ID: N/V");
    }

    #[test]
    fn test_resolve_forecast() {
        let mut panel = DetailsPanel::new(1024);
        let token = panel.show_station(&station(Some("10046"))).unwrap();

        assert!(panel.resolve_forecast(token, Some(ForecastView::Unavailable)));
        assert_eq!(
            panel.content().unwrap().body,
            PanelBody::Forecast(ForecastView::Unavailable)
        );

        let token = panel.show_station(&station(Some("10147"))).unwrap();
        assert!(panel.resolve_forecast(token, None));
        assert_eq!(panel.content().unwrap().body, PanelBody::LoadFailed);
    }

    #[test]
    fn test_stale_forecast_is_ignored() {
        let mut panel = DetailsPanel::new(1024);
        let first = panel.show_station(&station(Some("10046"))).unwrap();
        let second = panel.show_station(&station(Some("10147"))).unwrap();

        assert!(!panel.resolve_forecast(first, None));
        assert_eq!(panel.content().unwrap().body, PanelBody::Loading);
        assert!(panel.resolve_forecast(second, Some(ForecastView::Unavailable)));
    }

    #[test]
    fn test_hide_invalidates_pending_forecast() {
        let mut panel = DetailsPanel::new(1024);
        let token = panel.show_station(&station(Some("10046"))).unwrap();

        assert!(panel.hide());
        assert!(!panel.hide());
        assert!(!panel.resolve_forecast(token, None));
        assert_eq!(panel.transform(), PanelTransform::TranslateX(100.0));
    }

    #[test]
    fn test_resize_keeps_state() {
        let mut panel = DetailsPanel::new(1024);
        panel.show_station(&station(Some("10046")));

        panel.resize(500);
        assert!(panel.is_visible());
        assert_eq!(panel.transform(), PanelTransform::TranslateY(0.0));

        panel.hide();
        panel.resize(900);
        assert_eq!(panel.transform(), PanelTransform::TranslateX(100.0));
    }

    #[test]
    fn test_drag_only_on_narrow_visible_panel() {
        let mut panel = DetailsPanel::new(1024);
        panel.show_station(&station(Some("10046")));
        assert!(!panel.begin_drag(100.0, 400.0));

        panel.resize(400);
        panel.hide();
        assert!(!panel.begin_drag(100.0, 400.0));
        assert!(panel.drag_to(200.0).is_none());
    }

    #[test]
    fn test_drag_below_threshold_snaps_open() {
        let mut panel = DetailsPanel::new(400);
        panel.show_station(&station(Some("10046")));

        assert!(panel.begin_drag(100.0, 400.0));
        assert_eq!(panel.drag_to(200.0), Some(25.0));
        assert_eq!(panel.transform(), PanelTransform::TranslateY(25.0));
        // Dragging above the start point does not pull the panel further up
        assert_eq!(panel.drag_to(20.0), Some(0.0));
        assert_eq!(panel.drag_to(296.0), Some(49.0));

        assert_eq!(panel.end_drag(), Some(DragRelease::Opened));
        assert!(panel.is_visible());
        assert_eq!(panel.transform(), PanelTransform::TranslateY(0.0));
    }

    #[test]
    fn test_drag_past_threshold_dismisses() {
        let mut panel = DetailsPanel::new(400);
        panel.show_station(&station(Some("10046")));

        panel.begin_drag(100.0, 400.0);
        assert_eq!(panel.drag_to(300.0), Some(50.0));
        assert_eq!(panel.end_drag(), Some(DragRelease::Dismissed));
        assert_eq!(panel.visibility(), PanelVisibility::Hidden);

        panel.show_station(&station(Some("10046")));
        panel.begin_drag(0.0, 400.0);
        assert_eq!(panel.drag_to(10_000.0), Some(100.0));
        assert_eq!(panel.end_drag(), Some(DragRelease::Dismissed));
    }
}
