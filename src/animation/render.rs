use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::animation::flight::FlightState;
use crate::GeoPoint;

/// How the marker icon should be drawn.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct IconOptions {
    /// Extra rotation baked into the icon artwork, in degrees.
    pub rotate: f64,
    /// Whether a mirrored asset is available.
    pub flipped_asset: bool,
    /// Whether the caller wants mirroring when the heading points left.
    pub flip_requested: bool,
}

impl Default for IconOptions {
    fn default() -> Self {
        IconOptions {
            rotate: 0.0,
            flipped_asset: false,
            flip_requested: true,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq)]
pub struct IconOrientation {
    /// Rotation to apply to the chosen asset, in [0, 360).
    pub angle: f64,
    /// Use the mirrored asset.
    pub flipped: bool,
}

/// Rotation and mirroring for a marker heading `heading` degrees.
///
/// Headings pointing left (strictly between 90° and 270°) switch to the
/// mirrored asset, if there is one, and turn it by 180° so the nose still
/// points along the path.
pub fn orient_icon(heading: f64, options: &IconOptions) -> IconOrientation {
    let mut angle = (heading + options.rotate + 360.0) % 360.0;
    let mut flipped = false;

    if options.flip_requested && options.flipped_asset && angle > 90.0 && angle < 270.0 {
        flipped = true;
        angle = (angle + 180.0) % 360.0;
    }

    IconOrientation { angle, flipped }
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq)]
pub struct MarkerPose {
    pub position: GeoPoint,
    /// Compass heading in [0, 360).
    pub heading: f64,
    pub icon: IconOrientation,
}

/// Everything the renderer needs to draw one flight for one frame.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct FlightFrame {
    pub identifier: String,
    pub state: FlightState,
    /// `None` once landed or while tracking is off.
    pub marker: Option<MarkerPose>,
    pub elapsed: Vec<GeoPoint>,
    pub remaining: Vec<GeoPoint>,
}

impl FlightFrame {
    pub fn is_finite(&self) -> bool {
        self.marker
            .map_or(true, |m| m.position.is_finite() && m.heading.is_finite())
            && self.elapsed.iter().all(GeoPoint::is_finite)
            && self.remaining.iter().all(GeoPoint::is_finite)
    }
}

/// Splits the sampled path at `ratio` into the travelled and remaining parts.
///
/// Both parts share `current` as their boundary point: it is appended to the
/// elapsed part and replaces the first point of the remaining part.
pub fn split_path(
    points: &[GeoPoint],
    ratio: f64,
    current: GeoPoint,
) -> (Vec<GeoPoint>, Vec<GeoPoint>) {
    if points.is_empty() {
        return (vec![current], vec![current]);
    }

    let segments = points.len() - 1;
    let index = ((ratio * segments as f64).round() as usize)
        .max(1)
        .min(points.len());

    let mut elapsed = Vec::with_capacity(index + 1);
    elapsed.extend_from_slice(&points[..index]);
    elapsed.push(current);

    let mut remaining = points[index - 1..].to_vec();
    remaining[0] = current;

    (elapsed, remaining)
}

/// The drawing side of the scheduler.
pub trait FlightRenderer {
    /// Draw or redraw a flight.
    fn draw(&mut self, frame: &FlightFrame);

    /// Remove everything previously drawn for `identifier`.
    fn retire(&mut self, identifier: &str);
}

/// Renderer that keeps the latest frame per flight in memory.
#[derive(Debug, Default)]
pub struct FrameLog {
    latest: HashMap<String, FlightFrame>,
    retired: Vec<String>,
    draws: usize,
}

impl FrameLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(&self, identifier: &str) -> Option<&FlightFrame> {
        self.latest.get(identifier)
    }

    /// Identifiers retired so far, oldest first.
    pub fn retired(&self) -> &[String] {
        &self.retired
    }

    pub fn draw_count(&self) -> usize {
        self.draws
    }

    pub fn len(&self) -> usize {
        self.latest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.latest.is_empty()
    }
}

impl FlightRenderer for FrameLog {
    fn draw(&mut self, frame: &FlightFrame) {
        self.draws += 1;
        self.latest.insert(frame.identifier.clone(), frame.clone());
    }

    fn retire(&mut self, identifier: &str) {
        self.latest.remove(identifier);
        self.retired.push(identifier.to_string());
    }
}
