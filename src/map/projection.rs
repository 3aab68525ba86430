use std::f64::consts::PI;

use crate::geo::Rect;

/// Lowest and highest zoom levels, matching slippy-map conventions
pub const MIN_ZOOM: u8 = 0;
pub const MAX_ZOOM: u8 = 19;

/// Braille pixels spanned by the whole world at zoom 0. Smaller than a web
/// tile so a terminal window covers a similar area to a browser window.
const WORLD_PIXELS_AT_ZOOM0: f64 = 64.0;

const MAX_LAT: f64 = 85.0;

/// Web Mercator x in [0, 1)
#[inline(always)]
fn mercator_x(lon: f64) -> f64 {
    (lon + 180.0) / 360.0
}

/// Web Mercator y in [0, 1), 0 at the top
#[inline(always)]
fn mercator_y(lat: f64) -> f64 {
    let lat_rad = lat * PI / 180.0;
    (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0
}

#[inline(always)]
fn inverse_mercator(x: f64, y: f64) -> (f64, f64) {
    let lon = x * 360.0 - 180.0;
    let lat_rad = (PI * (1.0 - 2.0 * y)).sinh().atan();
    (lon, lat_rad * 180.0 / PI)
}

/// Viewport representing the visible map area and zoom level
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    /// Center longitude (-180 to 180)
    pub center_lon: f64,
    /// Center latitude (-85 to 85)
    pub center_lat: f64,
    /// Integer zoom level; each step doubles the scale
    pub zoom: u8,
    /// Canvas pixel width
    pub width: usize,
    /// Canvas pixel height
    pub height: usize,
}

impl Viewport {
    pub fn new(center_lon: f64, center_lat: f64, zoom: u8, width: usize, height: usize) -> Self {
        Self {
            center_lon,
            center_lat: center_lat.clamp(-MAX_LAT, MAX_LAT),
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            width,
            height,
        }
    }

    /// Pixels spanned by the whole world at the current zoom
    #[inline(always)]
    fn scale(&self) -> f64 {
        WORLD_PIXELS_AT_ZOOM0 * (1u64 << self.zoom) as f64
    }

    /// Pan the viewport by pixel delta
    pub fn pan(&mut self, dx: i32, dy: i32) {
        let scale = self.scale();
        let x = mercator_x(self.center_lon) + dx as f64 / scale;
        let y = mercator_y(self.center_lat) + dy as f64 / scale;
        let (lon, lat) = inverse_mercator(x, y);

        // Wrap longitude
        self.center_lon = if lon > 180.0 {
            lon - 360.0
        } else if lon < -180.0 {
            lon + 360.0
        } else {
            lon
        };

        self.center_lat = lat.clamp(-MAX_LAT, MAX_LAT);
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom + 1).min(MAX_ZOOM);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = self.zoom.saturating_sub(1).max(MIN_ZOOM);
    }

    /// Zoom in towards a specific pixel location
    pub fn zoom_in_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, true);
    }

    /// Zoom out from a specific pixel location
    pub fn zoom_out_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, false);
    }

    /// Change zoom by one level keeping the point under (px, py) fixed
    fn zoom_at(&mut self, px: i32, py: i32, zoom_in: bool) {
        // Geographic coordinates under the mouse
        let (lon, lat) = self.unproject(px, py);

        if zoom_in {
            self.zoom_in();
        } else {
            self.zoom_out();
        }

        // Where that point projects now, and the pan that brings it back
        let (new_px, new_py) = self.project(lon, lat);
        self.pan(new_px - px, new_py - py);
    }

    /// Unproject pixel coordinates back to geographic coordinates (lon, lat)
    pub fn unproject(&self, px: i32, py: i32) -> (f64, f64) {
        let scale = self.scale();
        let x = (px as f64 - self.width as f64 / 2.0) / scale + mercator_x(self.center_lon);
        let y = (py as f64 - self.height as f64 / 2.0) / scale + mercator_y(self.center_lat);
        inverse_mercator(x, y)
    }

    /// Project a geographic coordinate (lon, lat) to pixel coordinates
    pub fn project(&self, lon: f64, lat: f64) -> (i32, i32) {
        let scale = self.scale();
        let px = (mercator_x(lon) - mercator_x(self.center_lon)) * scale + self.width as f64 / 2.0;
        let py = (mercator_y(lat) - mercator_y(self.center_lat)) * scale + self.height as f64 / 2.0;
        (px.round() as i32, py.round() as i32)
    }

    /// Geographic rectangle covered by the canvas
    pub fn bounds(&self) -> Rect {
        Rect::from_corners(
            self.unproject(0, 0),
            self.unproject(self.width as i32, self.height as i32),
        )
    }

    /// Check if a line segment might be visible (rough bounding box check)
    pub fn line_might_be_visible(&self, p1: (i32, i32), p2: (i32, i32)) -> bool {
        let min_x = p1.0.min(p2.0);
        let max_x = p1.0.max(p2.0);
        let min_y = p1.1.min(p2.1);
        let max_y = p1.1.max(p2.1);

        max_x >= 0
            && min_x < self.width as i32
            && max_y >= 0
            && min_y < self.height as i32
    }
}
