use crate::GeoPoint;

/// Quadratic Bézier evaluated independently on latitude and longitude.
///
/// This is a flat-map approximation, not a geodesic.
pub fn bezier_point(p0: GeoPoint, control: GeoPoint, p2: GeoPoint, t: f64) -> GeoPoint {
    let one_minus_t = 1.0 - t;
    let a = one_minus_t * one_minus_t;
    let b = 2.0 * one_minus_t * t;
    let c = t * t;

    GeoPoint {
        lat: a * p0.lat + b * control.lat + c * p2.lat,
        lon: a * p0.lon + b * control.lon + c * p2.lon,
    }
}

/// Samples the curve at `num_points + 1` evenly spaced `t`. No longitude
/// unwrapping is applied; the control point keeps the curve monotonic.
pub fn sample_bezier(
    p0: GeoPoint,
    control: GeoPoint,
    p2: GeoPoint,
    num_points: usize,
) -> Vec<GeoPoint> {
    let num_points = num_points.max(1);
    (0..=num_points)
        .map(|i| bezier_point(p0, control, p2, i as f64 / num_points as f64))
        .collect()
}
