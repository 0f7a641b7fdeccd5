use serde::{Deserialize, Serialize};

use crate::geo::bearing::bearing;
use crate::geo::bezier::{bezier_point, sample_bezier};
use crate::geo::sphere::{sample_great_circle, slerp};
use crate::geo::PATH_SAMPLE_SEGMENTS;
use crate::GeoPoint;

/// The Bézier control point never bows further towards a pole than this.
pub const CONTROL_LATITUDE_LIMIT: f64 = 85.0;

/// Path fraction used to look ahead when computing a heading.
pub const HEADING_LOOKAHEAD: f64 = 0.01;

/// Curve a flight follows, fixed when the flight is planned.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PathGeometry {
    GreatCircle {
        origin: GeoPoint,
        destination: GeoPoint,
    },
    /// Bézier routed over the date line. `end` carries the adjusted longitude.
    Antimeridian {
        start: GeoPoint,
        control: GeoPoint,
        end: GeoPoint,
    },
}

impl PathGeometry {
    pub fn is_antimeridian(&self) -> bool {
        matches!(self, PathGeometry::Antimeridian { .. })
    }

    pub fn control_point(&self) -> Option<GeoPoint> {
        match self {
            PathGeometry::Antimeridian { control, .. } => Some(*control),
            PathGeometry::GreatCircle { .. } => None,
        }
    }

    /// Position at `ratio` (0 at the origin, 1 at the destination).
    pub fn point_at(&self, ratio: f64) -> GeoPoint {
        match *self {
            PathGeometry::GreatCircle {
                origin,
                destination,
            } => slerp(origin, destination, ratio),
            PathGeometry::Antimeridian {
                start,
                control,
                end,
            } => bezier_point(start, control, end, ratio),
        }
    }

    /// Position at `ratio` and the heading towards the point
    /// [`HEADING_LOOKAHEAD`] further along.
    pub fn pose_at(&self, ratio: f64) -> (GeoPoint, f64) {
        let here = self.point_at(ratio);
        let ahead = self.point_at((ratio + HEADING_LOOKAHEAD).min(1.0));
        (here, bearing(here.lat, here.lon, ahead.lat, ahead.lon))
    }
}

#[derive(Clone, Debug)]
pub struct PlannedPath {
    pub geometry: PathGeometry,
    /// `segments + 1` sampled points from origin to destination.
    pub points: Vec<GeoPoint>,
}

pub fn crosses_antimeridian(origin: GeoPoint, destination: GeoPoint) -> bool {
    (destination.lon - origin.lon).abs() > 180.0
}

/// Shifts the destination longitude by ±360° so that a path running
/// monotonically in longitude from the origin crosses the date line.
pub fn adjusted_endpoints(origin: GeoPoint, destination: GeoPoint) -> (GeoPoint, GeoPoint) {
    let lon_diff = destination.lon - origin.lon;
    let end = if lon_diff > 180.0 {
        destination.shifted_lon(-360.0)
    } else if lon_diff < -180.0 {
        destination.shifted_lon(360.0)
    } else {
        destination
    };
    (origin, end)
}

/// Control point halfway between `p0` and `p2`, bowed away from the equator
/// by a quarter of the longitude span.
pub fn control_point(p0: GeoPoint, p2: GeoPoint) -> GeoPoint {
    let mid_lon = (p0.lon + p2.lon) / 2.0;
    let mid_lat = (p0.lat + p2.lat) / 2.0;
    let lat_offset = (p2.lon - p0.lon).abs() / 4.0;

    let lat = if mid_lat < 0.0 {
        (mid_lat - lat_offset).max(-CONTROL_LATITUDE_LIMIT)
    } else {
        (mid_lat + lat_offset).min(CONTROL_LATITUDE_LIMIT)
    };
    GeoPoint { lat, lon: mid_lon }
}

pub fn plan_path(origin: GeoPoint, destination: GeoPoint) -> PlannedPath {
    plan_path_with_segments(origin, destination, PATH_SAMPLE_SEGMENTS)
}

pub fn plan_path_with_segments(
    origin: GeoPoint,
    destination: GeoPoint,
    segments: usize,
) -> PlannedPath {
    if crosses_antimeridian(origin, destination) {
        let (start, end) = adjusted_endpoints(origin, destination);
        let control = control_point(start, end);
        PlannedPath {
            geometry: PathGeometry::Antimeridian {
                start,
                control,
                end,
            },
            points: sample_bezier(start, control, end, segments),
        }
    } else {
        PlannedPath {
            geometry: PathGeometry::GreatCircle {
                origin,
                destination,
            },
            points: sample_great_circle(origin, destination, segments),
        }
    }
}
