use std::sync::mpsc::Receiver;
use std::sync::Arc;

use anyhow::Result;
use log::{info, warn};

use crate::config::AppConfig;
use crate::controller::{Controller, MapEvent};
use crate::data::{self, demo::DemoDataset};
use crate::geo::Rect;
use crate::loader::{completion_channel, DemoSource, DistrictSource, FileSource, LoadOutcome};
use crate::map::{BoundaryIndex, MapRenderer, Viewport};
use crate::state::ZoneKey;
use crate::submit::{PendingNavigation, Submission};

pub type MapController = Controller<Box<dyn DistrictSource>, PendingNavigation>;

/// Where the map opens and where `r` returns to
#[derive(Debug, Clone, Copy)]
struct StartView {
    lon: f64,
    lat: f64,
    zoom: u8,
}

/// Application state
pub struct App {
    pub viewport: Viewport,
    pub map_renderer: MapRenderer,
    pub controller: MapController,
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    /// Current mouse position for cursor marker
    pub mouse_pos: Option<(u16, u16)>,
    /// Set when the pointer moved while the button was down
    dragged: bool,
    /// Zone under the pointer, for enter/leave events
    hovered: Option<ZoneKey>,
    /// Pan or zoom happened since the last viewport event
    view_dirty: bool,
    completions: Receiver<LoadOutcome>,
    start: StartView,
    demo: bool,
}

impl App {
    /// Build the app from configuration. Uses the boundary dataset on disk,
    /// or the built-in demo dataset when there is none.
    pub fn from_config(config: &AppConfig, width: usize, height: usize) -> Result<Self> {
        let (tx, completions) = completion_channel();
        let bounds_path = config.bounds_path();

        let (index, source, demo): (BoundaryIndex, Box<dyn DistrictSource>, bool) = if bounds_path.exists() {
            let index = data::load_boundary_index(&bounds_path)?;
            info!("Loaded {} districts from {}", index.len(), bounds_path.display());
            let source: Box<dyn DistrictSource> = Box::new(FileSource::new(config.districts_dir(), tx));
            (index, source, false)
        } else {
            warn!(
                "No boundary dataset at {}, using the demo dataset",
                bounds_path.display()
            );
            let dataset = Arc::new(DemoDataset::around(config.map.start_lon, config.map.start_lat));
            let index = dataset.boundary_index();
            let source: Box<dyn DistrictSource> = Box::new(DemoSource::new(dataset, tx));
            (index, source, true)
        };

        let mut start = StartView {
            lon: config.map.start_lon,
            lat: config.map.start_lat,
            zoom: config.map.start_zoom,
        };
        let mut preload = config.preload_bounds();
        if let Some(extent) = index.extent() {
            if !extent.contains_point(start.lon, start.lat) {
                (start.lon, start.lat) = extent.center();
                preload = None;
                warn!(
                    "Start point is outside the boundary dataset, starting at {:.4}, {:.4}",
                    start.lat, start.lon
                );
            }
        }

        let controller = Controller::new(index, config.settings(), source, PendingNavigation::default());
        let mut app = Self::new(controller, completions, start, width, height);
        app.demo = demo;
        app.preload(preload);
        Ok(app)
    }

    fn new(
        controller: MapController,
        completions: Receiver<LoadOutcome>,
        start: StartView,
        width: usize,
        height: usize,
    ) -> Self {
        let (pixel_width, pixel_height) = map_pixels(width, height);

        Self {
            viewport: Viewport::new(start.lon, start.lat, start.zoom, pixel_width, pixel_height),
            map_renderer: MapRenderer::new(),
            controller,
            should_quit: false,
            last_mouse: None,
            mouse_pos: None,
            dragged: false,
            hovered: None,
            view_dirty: false,
            completions,
            start,
            demo: false,
        }
    }

    /// First transition covers a wider area than the screen so nearby
    /// districts are already cached when the user starts panning
    fn preload(&mut self, preload: Option<Rect>) {
        let bounds = preload.unwrap_or_else(|| self.viewport.bounds());
        self.controller.dispatch(MapEvent::ViewportChanged {
            bounds,
            zoom: self.viewport.zoom,
        });
    }

    /// True when running on the built-in demo dataset
    pub fn is_demo(&self) -> bool {
        self.demo
    }

    /// Update viewport size when terminal resizes
    pub fn resize(&mut self, width: usize, height: usize) {
        let (pixel_width, pixel_height) = map_pixels(width, height);
        self.viewport.width = pixel_width;
        self.viewport.height = pixel_height;
        self.view_dirty = true;
    }

    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.viewport.pan(dx, dy);
        self.view_dirty = true;
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
        self.view_dirty = true;
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
        self.view_dirty = true;
    }

    /// Zoom in towards a screen position (terminal column/row)
    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        let (px, py) = to_pixels(col, row);
        self.viewport.zoom_in_at(px, py);
        self.view_dirty = true;
    }

    /// Zoom out from a screen position (terminal column/row)
    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        let (px, py) = to_pixels(col, row);
        self.viewport.zoom_out_at(px, py);
        self.view_dirty = true;
    }

    /// Emit a viewport change once a gesture has completed. Called once per
    /// loop iteration, after input has been handled.
    pub fn sync_viewport(&mut self) {
        if !self.view_dirty || self.last_mouse.is_some() {
            return;
        }
        self.view_dirty = false;
        self.controller.dispatch(MapEvent::ViewportChanged {
            bounds: self.viewport.bounds(),
            zoom: self.viewport.zoom,
        });
        self.refresh_hover();
    }

    /// Feed finished district loads to the controller. Returns true if any
    /// arrived.
    pub fn drain_loads(&mut self) -> bool {
        let mut any = false;
        while let Ok(outcome) = self.completions.try_recv() {
            self.controller.dispatch(MapEvent::DistrictLoaded(outcome));
            any = true;
        }
        if any {
            self.refresh_hover();
        }
        any
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn toggle_overlay(&mut self) {
        self.controller.dispatch(MapEvent::ToggleOverlay);
        self.refresh_hover();
    }

    pub fn clear_map(&mut self) {
        self.controller.dispatch(MapEvent::ClearAll);
    }

    /// Hand the selection to the results sink and leave the map
    pub fn submit(&mut self) {
        self.controller.dispatch(MapEvent::Submit);
        self.quit();
    }

    pub fn take_submission(&mut self) -> Option<Submission> {
        self.controller.sink_mut().take()
    }

    /// Back to the start view; selection and cache are kept
    pub fn reset_view(&mut self) {
        self.viewport = Viewport::new(
            self.start.lon,
            self.start.lat,
            self.start.zoom,
            self.viewport.width,
            self.viewport.height,
        );
        self.view_dirty = true;
    }

    /// Zone under a terminal cell, if any
    fn zone_at(&self, col: u16, row: u16) -> Option<ZoneKey> {
        let (px, py) = to_pixels(col, row);
        let (lon, lat) = self.viewport.unproject(px, py);
        self.controller.state().zone_at(lon, lat)
    }

    pub fn mouse_down(&mut self, col: u16, row: u16) {
        self.last_mouse = Some((col, row));
        self.dragged = false;
    }

    /// Handle mouse drag
    pub fn handle_drag(&mut self, x: u16, y: u16) {
        if let Some((last_x, last_y)) = self.last_mouse {
            let dx = last_x as i32 - x as i32;
            let dy = last_y as i32 - y as i32;
            if dx != 0 || dy != 0 {
                self.dragged = true;
                // One terminal cell is 2x4 braille pixels
                self.pan(dx * 2, dy * 4);
            }
        }
        self.last_mouse = Some((x, y));
    }

    /// Button released: a press without movement is a click on a zone
    pub fn mouse_up(&mut self, col: u16, row: u16) {
        let clicked = self.last_mouse.is_some() && !self.dragged;
        self.last_mouse = None;
        self.dragged = false;

        if clicked {
            if let Some(key) = self.zone_at(col, row) {
                self.controller.dispatch(MapEvent::ZoneClicked(key));
            }
        }
    }

    pub fn context_menu(&mut self, col: u16, row: u16) {
        if let Some(key) = self.zone_at(col, row) {
            self.controller.dispatch(MapEvent::ZoneContextMenu(key));
        }
    }

    /// Update mouse cursor position and the hovered zone
    pub fn set_mouse_pos(&mut self, col: u16, row: u16) {
        self.mouse_pos = Some((col, row));
        if self.last_mouse.is_none() {
            self.refresh_hover();
        }
    }

    /// Emit enter/leave events when the zone under the pointer changes
    fn refresh_hover(&mut self) {
        let Some((col, row)) = self.mouse_pos else {
            return;
        };
        let current = self.zone_at(col, row);
        if current == self.hovered {
            return;
        }
        if let Some(left) = self.hovered.take() {
            self.controller.dispatch(MapEvent::ZoneLeft(left));
        }
        if let Some(key) = &current {
            self.controller.dispatch(MapEvent::ZoneEntered(key.clone()));
        }
        self.hovered = current;
    }

    /// Get mouse position in braille pixel coordinates (for rendering marker)
    pub fn mouse_pixel_pos(&self) -> Option<(i32, i32)> {
        self.mouse_pos.map(|(col, row)| to_pixels(col, row))
    }

    pub fn zoom_level(&self) -> String {
        format!("z{}", self.viewport.zoom)
    }

    pub fn center_coords(&self) -> String {
        format!(
            "{:.4}°{}, {:.4}°{}",
            self.viewport.center_lat.abs(),
            if self.viewport.center_lat >= 0.0 { "N" } else { "S" },
            self.viewport.center_lon.abs(),
            if self.viewport.center_lon >= 0.0 { "E" } else { "W" }
        )
    }
}

/// Braille pixel size of the map area for a terminal of the given size:
/// one column of border each side, border rows plus the status bar
fn map_pixels(width: usize, height: usize) -> (usize, usize) {
    let inner_width = width.saturating_sub(2);
    let inner_height = height.saturating_sub(3);
    (inner_width * 2, inner_height * 4)
}

/// Terminal cell to braille pixel inside the map border
fn to_pixels(col: u16, row: u16) -> (i32, i32) {
    (
        (col.saturating_sub(1) as i32) * 2 + 1,
        (row.saturating_sub(1) as i32) * 4 + 2,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::{Duration, Instant};

    /// App on the built-in demo dataset
    fn with_demo(width: usize, height: usize) -> App {
        let config = AppConfig {
            data: crate::config::DataConfig {
                dir: PathBuf::from("/nonexistent-popbuilder-data"),
            },
            ..AppConfig::default()
        };
        App::from_config(&config, width, height).unwrap()
    }

    /// Drain loads until nothing is loading or the deadline passes
    fn settle(app: &mut App) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while app.controller.state().loading_count() > 0 && Instant::now() < deadline {
            app.drain_loads();
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_start_outside_dataset_moves_to_its_center() {
        let dir = tempfile::tempdir().unwrap();
        let app_dir = dir.path().join("app");
        std::fs::create_dir_all(&app_dir).unwrap();
        std::fs::write(
            app_dir.join("bounds.json"),
            r#"{"regions": {"R1": {"districts": {
                "D1": {"bounds": [[53.0, -3.0], [54.0, -2.0]]}
            }}}}"#,
        )
        .unwrap();
        let config = AppConfig {
            data: crate::config::DataConfig {
                dir: dir.path().to_path_buf(),
            },
            ..AppConfig::default()
        };

        let app = App::from_config(&config, 120, 40).unwrap();
        assert!(!app.is_demo());
        assert!((app.viewport.center_lon - -2.5).abs() < 1e-9);
        assert!((app.viewport.center_lat - 53.5).abs() < 1e-9);
        // First query used the visible area around the new start
        let bounds = app.controller.state().viewport().unwrap();
        assert!(bounds.contains_point(-2.5, 53.5));
    }

    #[test]
    fn test_demo_start_shows_districts() {
        let mut app = with_demo(120, 40);
        assert!(app.is_demo());
        settle(&mut app);

        let state = app.controller.state();
        assert!(state.overlay_active());
        assert!(!state.on_map().is_empty());
        // Preload area is wider than the screen, so more is cached than drawn later
        assert!(state.loaded_count() >= state.on_map().len());
    }

    #[test]
    fn test_click_selects_zone_under_pointer() {
        let mut app = with_demo(120, 40);
        settle(&mut app);
        app.zoom_in();
        app.sync_viewport();
        settle(&mut app);

        let (col, row) = (60, 20);
        app.mouse_down(col, row);
        app.mouse_up(col, row);
        let state = app.controller.state();
        assert_eq!(state.selected().len(), 1);
        assert!(state.selected_population() > 0);

        app.clear_map();
        assert_eq!(app.controller.state().selected_population(), 0);
    }

    #[test]
    fn test_drag_does_not_select() {
        let mut app = with_demo(120, 40);
        settle(&mut app);
        let before = app.viewport.center_lon;

        app.mouse_down(60, 20);
        app.handle_drag(55, 20);
        app.mouse_up(55, 20);
        assert!(app.controller.state().selected().is_empty());
        assert!(app.viewport.center_lon > before);
    }

    #[test]
    fn test_zooming_out_hides_districts() {
        let mut app = with_demo(120, 40);
        settle(&mut app);
        for _ in 0..6 {
            app.zoom_out();
        }
        app.sync_viewport();
        let state = app.controller.state();
        assert!(state.on_map().is_empty());
        assert!(!state.overlay_active());
    }

    #[test]
    fn test_submit_quits_with_selection() {
        let mut app = with_demo(120, 40);
        settle(&mut app);
        app.mouse_down(60, 20);
        app.mouse_up(60, 20);
        let code = app.controller.state().selected()[0].code.clone();

        app.submit();
        assert!(app.should_quit);
        let submission = app.take_submission().unwrap();
        assert_eq!(submission.zones, code);
    }

    #[test]
    fn test_hover_shows_zone_code() {
        let mut app = with_demo(120, 40);
        settle(&mut app);
        app.set_mouse_pos(60, 20);
        assert!(app.controller.state().zone_code().is_some());
        assert!(app.controller.state().highlighted().is_some());
    }
}
