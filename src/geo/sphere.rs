use crate::GeoPoint;

/// Point on the unit sphere, `[x, y, z]`.
pub type Vec3 = [f64; 3];

/// Below this `sin(ω)` the endpoints are treated as antipodal and the slerp
/// weights are no longer usable.
const ANTIPODAL_EPSILON: f64 = 1e-12;

pub fn to_cartesian(p: GeoPoint) -> Vec3 {
    let lat = p.lat.to_radians();
    let lon = p.lon.to_radians();
    [lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin()]
}

/// Inverse of [`to_cartesian`]. The vector is expected to be unit length
/// already; it is not renormalised.
pub fn to_geographic(v: Vec3) -> GeoPoint {
    GeoPoint {
        lat: v[2].clamp(-1.0, 1.0).asin().to_degrees(),
        lon: v[1].atan2(v[0]).to_degrees(),
    }
}

fn dot(a: Vec3, b: Vec3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Spherical linear interpolation between `p1` and `p2`.
///
/// `fraction` runs from 0 (at `p1`) to 1 (at `p2`). Coincident endpoints
/// return `p1` unchanged.
pub fn slerp(p1: GeoPoint, p2: GeoPoint, fraction: f64) -> GeoPoint {
    let v1 = to_cartesian(p1);
    let v2 = to_cartesian(p2);

    let omega = dot(v1, v2).clamp(-1.0, 1.0).acos();
    if omega == 0.0 {
        return p1;
    }

    let sin_omega = omega.sin();
    if sin_omega.abs() < ANTIPODAL_EPSILON {
        return antipodal_arc(v1, omega, fraction);
    }

    let a = ((1.0 - fraction) * omega).sin() / sin_omega;
    let b = (fraction * omega).sin() / sin_omega;

    to_geographic([
        a * v1[0] + b * v2[0],
        a * v1[1] + b * v2[1],
        a * v1[2] + b * v2[2],
    ])
}

// Every great circle through v1 reaches its antipode, so pick the one heading
// towards the pole (or along the prime meridian when already at a pole).
fn antipodal_arc(v1: Vec3, omega: f64, fraction: f64) -> GeoPoint {
    let reference: Vec3 = if v1[2].abs() > 0.9 {
        [1.0, 0.0, 0.0]
    } else {
        [0.0, 0.0, 1.0]
    };
    let k = dot(reference, v1);
    let mut u = [
        reference[0] - k * v1[0],
        reference[1] - k * v1[1],
        reference[2] - k * v1[2],
    ];
    let norm = dot(u, u).sqrt();
    for c in &mut u {
        *c /= norm;
    }

    let theta = fraction * omega;
    let (sin_t, cos_t) = theta.sin_cos();
    to_geographic([
        v1[0] * cos_t + u[0] * sin_t,
        v1[1] * cos_t + u[1] * sin_t,
        v1[2] * cos_t + u[2] * sin_t,
    ])
}

/// Samples the great circle from `p1` to `p2` at `num_points + 1` evenly
/// spaced fractions, unwrapping longitudes so consecutive points never jump
/// by more than 180°.
pub fn sample_great_circle(p1: GeoPoint, p2: GeoPoint, num_points: usize) -> Vec<GeoPoint> {
    let num_points = num_points.max(1);
    let mut points: Vec<GeoPoint> = Vec::with_capacity(num_points + 1);

    for i in 0..=num_points {
        let fraction = i as f64 / num_points as f64;
        let mut pt = slerp(p1, p2, fraction);

        if let Some(last) = points.last() {
            if pt.is_finite() && last.is_finite() {
                while pt.lon - last.lon > 180.0 {
                    pt.lon -= 360.0;
                }
                while last.lon - pt.lon > 180.0 {
                    pt.lon += 360.0;
                }
            }
        }
        points.push(pt);
    }

    points
}
