pub mod animation;
pub mod data;
pub mod geo;
pub mod path;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees. May leave [-180, 180] after date-line adjustment.
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        GeoPoint { lat, lon }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }

    /// Same point with the longitude shifted by `degrees`.
    pub fn shifted_lon(&self, degrees: f64) -> GeoPoint {
        GeoPoint {
            lat: self.lat,
            lon: self.lon + degrees,
        }
    }
}
