use log::{debug, info, warn};

use crate::geo::Rect;
use crate::loader::{DistrictSource, LoadOutcome};
use crate::map::BoundaryIndex;
use crate::state::{Arrival, OverlayMode, ViewState, ZoneKey};
use crate::submit::{ResultsSink, Submission};

/// Zoom gates for the district overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    /// Overlay panel is only active above this zoom
    pub overlay_zoom_threshold: u8,
    /// In Auto mode, districts are only drawn above this zoom
    pub minimum_zoom_for_auto: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            overlay_zoom_threshold: 9,
            minimum_zoom_for_auto: 12,
        }
    }
}

#[derive(Debug)]
pub enum MapEvent {
    /// A pan or zoom gesture completed
    ViewportChanged { bounds: Rect, zoom: u8 },
    ZoneClicked(ZoneKey),
    ZoneEntered(ZoneKey),
    ZoneLeft(ZoneKey),
    ZoneContextMenu(ZoneKey),
    ToggleOverlay,
    ClearAll,
    Submit,
    DistrictLoaded(LoadOutcome),
}

/// Turns viewport, pointer, control and load events into view state
/// transitions and district requests
pub struct Controller<S, R> {
    index: BoundaryIndex,
    state: ViewState,
    settings: Settings,
    source: S,
    sink: R,
}

impl<S: DistrictSource, R: ResultsSink> Controller<S, R> {
    pub fn new(index: BoundaryIndex, settings: Settings, source: S, sink: R) -> Self {
        Self {
            index,
            state: ViewState::new(),
            settings,
            source,
            sink,
        }
    }

    pub fn dispatch(&mut self, event: MapEvent) {
        match event {
            MapEvent::ViewportChanged { bounds, zoom } => self.update_map(bounds, zoom),
            MapEvent::ZoneClicked(key) => {
                if let Some(selected) = self.state.toggle_zone(&key) {
                    debug!("Zone {}/{} selected={selected}", key.district, key.index);
                }
            }
            MapEvent::ZoneEntered(key) => self.state.enter_zone(&key),
            MapEvent::ZoneLeft(key) => self.state.leave_zone(&key),
            MapEvent::ZoneContextMenu(key) => self.state.highlight_zone(&key),
            MapEvent::ToggleOverlay => self.change_overlay_setting(),
            MapEvent::ClearAll => self.deselect_all(),
            MapEvent::Submit => self.get_results(),
            MapEvent::DistrictLoaded(outcome) => self.district_loaded(outcome),
        }
    }

    /// Recompute what is drawn for a new viewport and zoom
    pub fn update_map(&mut self, bounds: Rect, zoom: u8) {
        let in_view = self.index.districts_intersecting(&bounds);
        let eligible = zoom > self.settings.overlay_zoom_threshold && !in_view.is_empty();

        if !eligible {
            self.clear_map();
            self.state.set_overlay_active(false);
        } else {
            self.state.set_overlay_active(true);
            let show = match self.state.overlay_mode() {
                OverlayMode::Auto => zoom > self.settings.minimum_zoom_for_auto,
                OverlayMode::On => true,
                OverlayMode::Off => false,
            };
            if show {
                self.show_districts(in_view.clone());
            } else {
                self.clear_map();
            }
        }

        self.state.set_in_view(in_view);
        self.state.record_view(bounds, zoom);
    }

    /// Hide every district and drop the highlight
    pub fn clear_map(&mut self) {
        self.state.clear_districts();
        self.state.clear_current_zone();
    }

    fn show_districts(&mut self, wanted: std::collections::BTreeSet<String>) {
        for code in self.state.show_districts(wanted) {
            debug!("Requesting district {code}");
            self.source.request(&code);
        }
    }

    /// Cycle Auto -> On -> Off and re-evaluate against the last viewport
    pub fn change_overlay_setting(&mut self) {
        let mode = self.state.cycle_overlay_mode();
        info!("Overlay mode set to {}", mode.label());
        if let Some(bounds) = self.state.viewport() {
            let zoom = self.state.zoom();
            self.update_map(bounds, zoom);
        }
    }

    /// Clear Map: deselect everything and drop the highlight
    pub fn deselect_all(&mut self) {
        self.state.deselect_all();
        self.state.clear_current_zone();
    }

    pub fn get_results(&mut self) {
        let submission = Submission::from_codes(self.state.selected_codes());
        info!(
            "Submitting {} zones, population {}",
            self.state.selected().len(),
            self.state.selected_population()
        );
        self.sink.submit(submission);
    }

    pub fn district_loaded(&mut self, outcome: LoadOutcome) {
        let LoadOutcome { code, result } = outcome;
        match result {
            Ok(layer) => {
                let zones = layer.zones.len();
                match self.state.district_loaded(layer) {
                    Arrival::Shown => debug!("District {code} loaded ({zones} zones), shown"),
                    Arrival::Cached => debug!("District {code} loaded ({zones} zones), no longer wanted"),
                    Arrival::Duplicate => debug!("District {code} arrived twice, keeping first copy"),
                }
            }
            Err(err) => {
                warn!("Failed to load district {code}: {err}");
                self.state.district_failed(&code);
            }
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn index(&self) -> &BoundaryIndex {
        &self.index
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn sink_mut(&mut self) -> &mut R {
        &mut self.sink
    }
}
