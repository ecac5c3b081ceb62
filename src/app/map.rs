//! Map viewport: center, zoom and marker picking

use crate::constants::{DEFAULT_MAP_CENTER, DEFAULT_MAP_ZOOM, SELECTED_MAP_ZOOM};
use crate::models::Winery;

pub const MIN_ZOOM: u8 = 1;
pub const MAX_ZOOM: u8 = 18;
const MAX_LATITUDE: f64 = 85.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MapView {
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: u8,
}

impl Default for MapView {
    fn default() -> Self {
        MapView {
            latitude: DEFAULT_MAP_CENTER.0,
            longitude: DEFAULT_MAP_CENTER.1,
            zoom: DEFAULT_MAP_ZOOM,
        }
    }
}

impl MapView {
    /// Recenter on a point at street-level zoom
    pub fn focus(&mut self, latitude: f64, longitude: f64) {
        self.latitude = latitude.clamp(-MAX_LATITUDE, MAX_LATITUDE);
        self.longitude = longitude;
        self.zoom = SELECTED_MAP_ZOOM;
    }

    /// Visible longitude span in degrees; halves with every zoom level
    pub fn lon_span(&self) -> f64 {
        720.0 / f64::from(1u32 << self.zoom)
    }

    /// Visible latitude span in degrees
    pub fn lat_span(&self) -> f64 {
        self.lon_span() * 0.75
    }

    /// `(x_bounds, y_bounds)` for a canvas: longitude on x, latitude on y
    pub fn bounds(&self) -> ([f64; 2], [f64; 2]) {
        let half_lon = self.lon_span() / 2.0;
        let half_lat = self.lat_span() / 2.0;
        (
            [self.longitude - half_lon, self.longitude + half_lon],
            [self.latitude - half_lat, self.latitude + half_lat],
        )
    }

    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        let ([x0, x1], [y0, y1]) = self.bounds();
        (x0..=x1).contains(&longitude) && (y0..=y1).contains(&latitude)
    }

    /// Move by a quarter of the visible span per step
    pub fn pan(&mut self, lat_steps: i32, lon_steps: i32) {
        self.latitude = (self.latitude + f64::from(lat_steps) * self.lat_span() / 4.0)
            .clamp(-MAX_LATITUDE, MAX_LATITUDE);
        let lon = self.longitude + f64::from(lon_steps) * self.lon_span() / 4.0;
        self.longitude = (lon + 180.0).rem_euclid(360.0) - 180.0;
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom + 1).min(MAX_ZOOM);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = self.zoom.saturating_sub(1).max(MIN_ZOOM);
    }

    /// Visible winery closest to the map center
    pub fn nearest<'a>(&self, wineries: &'a [Winery]) -> Option<&'a Winery> {
        let scale = self.latitude.to_radians().cos();
        let distance = |w: &Winery| {
            let dy = w.latitude - self.latitude;
            let dx = (w.longitude - self.longitude) * scale;
            dx * dx + dy * dy
        };
        wineries
            .iter()
            .filter(|w| self.contains(w.latitude, w.longitude))
            .min_by(|a, b| distance(a).total_cmp(&distance(b)))
    }
}
