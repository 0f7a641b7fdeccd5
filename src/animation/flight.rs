use serde::{Deserialize, Deserializer, Serialize};

use crate::animation::config::AnimationConfig;
use crate::animation::render::{orient_icon, split_path, FlightFrame, MarkerPose};
use crate::animation::scheduler::SchedulerError;
use crate::path::planner::{plan_path, PathGeometry};
use crate::GeoPoint;

const MS_PER_HOUR: f64 = 3_600_000.0;

/// A flight as delivered by the feed.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FlightRecord {
    pub identifier: String,
    pub origin: GeoPoint,
    pub destination: GeoPoint,
    pub elapsed_distance: f64,
    pub remaining_distance: f64,
    /// Distance units per hour.
    pub speed: f64,
    /// Milliseconds since the Unix epoch at which the distances were valid.
    #[serde(deserialize_with = "deserialize_millis")]
    pub last_updated_at: u64,
}

/// Feeds produced by JavaScript send timestamps as plain numbers, which may
/// carry a fractional part or an exponent. Those are floored to whole
/// milliseconds; negative values become 0. Binary snapshots store a `u64`.
fn deserialize_millis<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    if deserializer.is_human_readable() {
        let ms = f64::deserialize(deserializer)?;
        Ok(ms.max(0.0).floor() as u64)
    } else {
        u64::deserialize(deserializer)
    }
}

impl FlightRecord {
    pub fn validate(&self) -> Result<(), SchedulerError> {
        let invalid = |reason: &'static str| SchedulerError::InvalidRecord {
            identifier: self.identifier.clone(),
            reason,
        };

        if self.identifier.is_empty() {
            return Err(invalid("empty identifier"));
        }
        for p in [self.origin, self.destination] {
            if !p.is_finite() || p.lat.abs() > 90.0 {
                return Err(invalid("coordinates out of range"));
            }
        }
        if !(self.elapsed_distance.is_finite() && self.elapsed_distance >= 0.0)
            || !(self.remaining_distance.is_finite() && self.remaining_distance >= 0.0)
        {
            return Err(invalid("distances must be finite and non-negative"));
        }
        if !(self.speed.is_finite() && self.speed > 0.0) {
            return Err(invalid("speed must be finite and positive"));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlightState {
    Active,
    /// Terminal: the whole path has been flown.
    Landed,
}

/// Outcome of advancing a flight by one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Advance {
    /// Already landed, nothing changed.
    Idle,
    Moved,
    /// Reached the destination during this frame.
    Landed,
}

/// Scheduler-owned animation state for one flight.
#[derive(Clone, Debug)]
pub struct ManagedFlight {
    record: FlightRecord,
    full_path_points: Vec<GeoPoint>,
    geometry: PathGeometry,
    total_distance: f64,
    elapsed_distance: f64,
    remaining_distance: f64,
    last_animated_at: u64,
}

impl ManagedFlight {
    /// Plans the path once; it is never resampled afterwards.
    pub fn new(record: FlightRecord) -> Self {
        let plan = plan_path(record.origin, record.destination);
        let total_distance = record.elapsed_distance + record.remaining_distance;
        let elapsed_distance = record.elapsed_distance.min(total_distance);

        ManagedFlight {
            full_path_points: plan.points,
            geometry: plan.geometry,
            total_distance,
            elapsed_distance,
            remaining_distance: total_distance - elapsed_distance,
            last_animated_at: record.last_updated_at,
            record,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.record.identifier
    }

    pub fn record(&self) -> &FlightRecord {
        &self.record
    }

    pub fn full_path_points(&self) -> &[GeoPoint] {
        &self.full_path_points
    }

    pub fn geometry(&self) -> &PathGeometry {
        &self.geometry
    }

    pub fn is_antimeridian_path(&self) -> bool {
        self.geometry.is_antimeridian()
    }

    pub fn bezier_control_point(&self) -> Option<GeoPoint> {
        self.geometry.control_point()
    }

    pub fn total_distance(&self) -> f64 {
        self.total_distance
    }

    pub fn elapsed_distance(&self) -> f64 {
        self.elapsed_distance
    }

    pub fn remaining_distance(&self) -> f64 {
        self.remaining_distance
    }

    pub fn last_animated_at(&self) -> u64 {
        self.last_animated_at
    }

    pub fn state(&self) -> FlightState {
        if self.elapsed_distance >= self.total_distance {
            FlightState::Landed
        } else {
            FlightState::Active
        }
    }

    /// Fraction of the path flown; 0 for a zero-length path.
    pub fn elapsed_ratio(&self) -> f64 {
        if self.total_distance > 0.0 {
            self.elapsed_distance / self.total_distance
        } else {
            0.0
        }
    }

    /// Moves the flight forward by the time elapsed since the last frame.
    ///
    /// A clock reading older than `last_animated_at` (a feed timestamp from
    /// the future) counts as no time passing.
    pub fn advance(&mut self, now_ms: u64) -> Advance {
        if self.state() == FlightState::Landed {
            return Advance::Idle;
        }

        let dt_ms = now_ms.saturating_sub(self.last_animated_at);
        let travelled = self.record.speed * dt_ms as f64 / MS_PER_HOUR;
        self.elapsed_distance += travelled;
        self.remaining_distance = self.total_distance - self.elapsed_distance;
        self.last_animated_at = self.last_animated_at.max(now_ms);

        if self.elapsed_distance >= self.total_distance {
            self.elapsed_distance = self.total_distance;
            self.remaining_distance = 0.0;
            return Advance::Landed;
        }
        Advance::Moved
    }

    /// Builds the rendering output for the current state.
    pub fn frame(&self, config: &AnimationConfig) -> FlightFrame {
        let identifier = self.record.identifier.clone();
        let state = self.state();

        if !config.currently_tracking {
            return FlightFrame {
                identifier,
                state,
                marker: None,
                elapsed: Vec::new(),
                remaining: self.full_path_points.clone(),
            };
        }
        if state == FlightState::Landed {
            return FlightFrame {
                identifier,
                state,
                marker: None,
                elapsed: self.full_path_points.clone(),
                remaining: Vec::new(),
            };
        }

        let ratio = self.elapsed_ratio();
        let (position, heading) = self.geometry.pose_at(ratio);
        let (elapsed, remaining) = split_path(&self.full_path_points, ratio, position);

        FlightFrame {
            identifier,
            state,
            marker: Some(MarkerPose {
                position,
                heading,
                icon: orient_icon(heading, &config.icon),
            }),
            elapsed,
            remaining,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::PATH_SAMPLE_SEGMENTS;
    use assert_approx_eq::assert_approx_eq;

    fn record(elapsed: f64, remaining: f64, speed: f64) -> FlightRecord {
        FlightRecord {
            identifier: "BA117".into(),
            origin: GeoPoint::new(51.5, -0.1),
            destination: GeoPoint::new(40.7, -74.0),
            elapsed_distance: elapsed,
            remaining_distance: remaining,
            speed,
            last_updated_at: 0,
        }
    }

    #[test]
    fn one_hour_at_500_covers_500() {
        let mut flight = ManagedFlight::new(record(0.0, 1000.0, 500.0));
        assert_eq!(flight.advance(3_600_000), Advance::Moved);
        assert_eq!(flight.elapsed_distance(), 500.0);
        assert_eq!(flight.remaining_distance(), 500.0);
        assert_eq!(flight.last_animated_at(), 3_600_000);
    }

    #[test]
    fn zero_dt_changes_nothing() {
        let mut flight = ManagedFlight::new(record(250.0, 750.0, 500.0));
        flight.advance(0);
        assert_eq!(flight.elapsed_distance(), 250.0);
        assert_eq!(flight.remaining_distance(), 750.0);
    }

    #[test]
    fn lands_exactly_once_and_stays_put() {
        let mut flight = ManagedFlight::new(record(900.0, 100.0, 500.0));
        assert_eq!(flight.advance(3_600_000), Advance::Landed);
        assert_eq!(flight.state(), FlightState::Landed);
        assert_eq!(flight.elapsed_distance(), 1000.0);
        assert_eq!(flight.remaining_distance(), 0.0);

        assert_eq!(flight.advance(7_200_000), Advance::Idle);
        assert_eq!(flight.elapsed_distance(), 1000.0);
        assert_eq!(flight.remaining_distance(), 0.0);
        assert_eq!(flight.last_animated_at(), 3_600_000);
    }

    #[test]
    fn remaining_tracks_total_minus_elapsed() {
        let mut flight = ManagedFlight::new(record(0.0, 1234.667, 487.3));
        let mut now = 0;
        while flight.state() == FlightState::Active {
            now += 1_337;
            flight.advance(now);
            assert_eq!(
                flight.remaining_distance(),
                flight.total_distance() - flight.elapsed_distance()
            );
        }
        assert_eq!(flight.remaining_distance(), 0.0);
    }

    #[test]
    fn future_timestamp_holds_position() {
        let mut r = record(0.0, 1000.0, 500.0);
        r.last_updated_at = 10_000;
        let mut flight = ManagedFlight::new(r);
        flight.advance(5_000);
        assert_eq!(flight.elapsed_distance(), 0.0);
        assert_eq!(flight.last_animated_at(), 10_000);
    }

    #[test]
    fn zero_length_flight_is_landed_with_zero_ratio() {
        let flight = ManagedFlight::new(record(0.0, 0.0, 500.0));
        assert_eq!(flight.state(), FlightState::Landed);
        assert_eq!(flight.elapsed_ratio(), 0.0);
    }

    #[test]
    fn path_is_planned_once() {
        let mut flight = ManagedFlight::new(record(0.0, 1000.0, 500.0));
        let before = flight.full_path_points().to_vec();
        assert_eq!(before.len(), PATH_SAMPLE_SEGMENTS + 1);
        flight.advance(1_800_000);
        assert_eq!(flight.full_path_points(), &before[..]);
        assert!(!flight.is_antimeridian_path());
        assert!(flight.bezier_control_point().is_none());
    }

    #[test]
    fn tracking_frame_places_marker_on_path() {
        let mut flight = ManagedFlight::new(record(0.0, 1000.0, 500.0));
        flight.advance(3_600_000);
        let frame = flight.frame(&AnimationConfig::tracking(true));
        let marker = frame.marker.expect("marker while active");
        let midpoint = crate::geo::sphere::slerp(
            GeoPoint::new(51.5, -0.1),
            GeoPoint::new(40.7, -74.0),
            0.5,
        );
        assert_approx_eq!(marker.position.lat, midpoint.lat, 1e-12);
        assert_approx_eq!(marker.position.lon, midpoint.lon, 1e-12);
        assert!(marker.heading > 180.0 && marker.heading < 360.0);
        assert_eq!(frame.elapsed.last(), frame.remaining.first());
    }

    #[test]
    fn untracked_frame_shows_whole_remaining_path() {
        let flight = ManagedFlight::new(record(300.0, 700.0, 500.0));
        let frame = flight.frame(&AnimationConfig::tracking(false));
        assert!(frame.marker.is_none());
        assert!(frame.elapsed.is_empty());
        assert_eq!(frame.remaining, flight.full_path_points());
    }

    #[test]
    fn landed_frame_shows_whole_elapsed_path() {
        let flight = ManagedFlight::new(record(1000.0, 0.0, 500.0));
        let frame = flight.frame(&AnimationConfig::tracking(true));
        assert!(frame.marker.is_none());
        assert!(frame.remaining.is_empty());
        assert_eq!(frame.elapsed, flight.full_path_points());
    }

    #[test]
    fn antimeridian_frame_uses_the_bezier() {
        let r = FlightRecord {
            identifier: "NZ8".into(),
            origin: GeoPoint::new(0.0, 170.0),
            destination: GeoPoint::new(0.0, -170.0),
            elapsed_distance: 500.0,
            remaining_distance: 500.0,
            speed: 800.0,
            last_updated_at: 0,
        };
        let flight = ManagedFlight::new(r);
        assert!(flight.is_antimeridian_path());
        let frame = flight.frame(&AnimationConfig::tracking(true));
        let marker = frame.marker.expect("marker");
        assert_approx_eq!(marker.position.lon, 180.0, 1e-9);
        // Top of the arc: heading due east, just starting to descend.
        assert!((marker.heading - 90.0).abs() < 1.0);
    }

    #[test]
    fn validation_rejects_bad_records() {
        assert!(record(0.0, 100.0, 0.0).validate().is_err());
        assert!(record(-1.0, 100.0, 10.0).validate().is_err());
        assert!(record(0.0, f64::NAN, 10.0).validate().is_err());
        let mut r = record(0.0, 100.0, 10.0);
        r.origin.lat = 91.0;
        assert!(r.validate().is_err());
        assert!(record(0.0, 100.0, 10.0).validate().is_ok());
    }
}
