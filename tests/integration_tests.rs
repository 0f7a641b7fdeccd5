use assert_approx_eq::assert_approx_eq;
use flightmap_engine::animation::clock::{Clock, ManualClock};
use flightmap_engine::animation::config::AnimationConfig;
use flightmap_engine::animation::flight::{FlightRecord, FlightState};
use flightmap_engine::animation::render::FrameLog;
use flightmap_engine::animation::scheduler::{FlightAnimationScheduler, FrameRequest};
use flightmap_engine::data::{deserialize_feed, parse_feed_json, serialize_feed};
use flightmap_engine::geo::sphere::sample_great_circle;
use flightmap_engine::path::planner::plan_path;
use flightmap_engine::GeoPoint;

const FEED: &str = r#"{
    "flights": [
        {
            "identifier": "BA117",
            "origin": {"name": "LHR", "lat": 51.5, "lon": -0.1},
            "destination": {"name": "JFK", "lat": 40.7, "lon": -74.0},
            "elapsedDistance": 0.0,
            "remainingDistance": 1000.0,
            "speed": 500.0,
            "lastUpdatedAt": 1000
        },
        {
            "identifier": "NZ8",
            "origin": {"name": "X", "lat": 0.0, "lon": 170.0},
            "destination": {"name": "Y", "lat": 0.0, "lon": -170.0},
            "elapsedDistance": 0.0,
            "remainingDistance": 1200.0,
            "speed": 600.0,
            "lastUpdatedAt": 1000
        }
    ],
    "tracking": {"arrivalDates": [], "currentlyTracking": true}
}"#;

fn loaded_scheduler() -> FlightAnimationScheduler<FrameLog> {
    let feed = parse_feed_json(FEED.as_bytes()).expect("feed");
    let mut scheduler =
        FlightAnimationScheduler::new(AnimationConfig::from_feed(&feed), FrameLog::new());
    for record in feed.flights {
        scheduler.register_flight(record).expect("register");
    }
    scheduler.add_flights(feed.tracking.currently_tracking);
    scheduler
}

#[test]
fn integration_frame_loop_until_landing() {
    let clock = ManualClock::new(1000);
    let mut scheduler = loaded_scheduler();
    assert!(scheduler.start_animation());

    let mut frames = 0;
    while !scheduler.all_landed() {
        clock.advance(36_000);
        assert_eq!(scheduler.on_frame(clock.now_ms()), FrameRequest::Next);
        frames += 1;

        for flight in scheduler.flights() {
            let sum = flight.elapsed_distance() + flight.remaining_distance();
            assert_approx_eq!(sum, flight.total_distance(), 1e-9);
            if let Some(frame) = scheduler.renderer().latest(flight.identifier()) {
                if frame.marker.is_some() {
                    assert_eq!(frame.elapsed.last(), frame.remaining.first());
                }
            }
        }
        assert!(frames < 1000, "flights never landed");
    }

    // Both flights need exactly two hours, in steps of 0.01 h.
    assert_eq!(frames, 200);
    for flight in scheduler.flights() {
        assert_eq!(flight.state(), FlightState::Landed);
        let frame = scheduler.renderer().latest(flight.identifier()).unwrap();
        assert!(frame.marker.is_none());
        assert_eq!(frame.elapsed, flight.full_path_points());
    }
}

#[test]
fn integration_antimeridian_flight_crosses_at_180() {
    let mut scheduler = loaded_scheduler();
    let nz8 = scheduler.flight("NZ8").unwrap();
    assert!(nz8.is_antimeridian_path());
    let control = nz8.bezier_control_point().unwrap();
    assert_approx_eq!(control.lon, 180.0, 1e-12);
    assert_approx_eq!(nz8.full_path_points().last().unwrap().lon, 190.0, 1e-12);

    // Halfway after one hour at 600 over 1200.
    scheduler.update_flight_positions(1000 + 3_600_000);
    let frame = scheduler.renderer().latest("NZ8").unwrap();
    let marker = frame.marker.unwrap();
    assert_approx_eq!(marker.position.lon, 180.0, 1e-9);
    for pair in frame.elapsed.windows(2).chain(frame.remaining.windows(2)) {
        assert!((pair[1].lon - pair[0].lon).abs() <= 180.0);
    }
}

#[test]
fn integration_refresh_replaces_flight() {
    let mut scheduler = loaded_scheduler();
    scheduler.update_flight_positions(1000 + 1_800_000);

    let refreshed = FlightRecord {
        identifier: "BA117".into(),
        origin: GeoPoint::new(51.5, -0.1),
        destination: GeoPoint::new(40.7, -74.0),
        elapsed_distance: 400.0,
        remaining_distance: 600.0,
        speed: 450.0,
        last_updated_at: 1000 + 1_800_000,
    };
    scheduler.update_flight(refreshed).unwrap();
    let flight = scheduler.flight("BA117").unwrap();
    assert_eq!(flight.elapsed_distance(), 400.0);
    assert_eq!(flight.record().speed, 450.0);
    assert!(scheduler
        .renderer()
        .retired()
        .iter()
        .any(|id| id == "BA117"));
}

#[test]
fn integration_snapshot_feeds_the_scheduler() {
    let feed = parse_feed_json(FEED.as_bytes()).unwrap();
    let restored = deserialize_feed(&serialize_feed(&feed).unwrap()).unwrap();
    let mut scheduler =
        FlightAnimationScheduler::new(AnimationConfig::tracking(true), FrameLog::new());
    for record in restored.flights {
        scheduler.register_flight(record).unwrap();
    }
    assert_eq!(scheduler.len(), 2);
    assert_eq!(scheduler.renderer().len(), 2);
}

#[test]
fn integration_planner_matches_sampler() {
    let london = GeoPoint::new(51.5, -0.1);
    let new_york = GeoPoint::new(40.7, -74.0);
    let plan = plan_path(london, new_york);
    assert_eq!(plan.points, sample_great_circle(london, new_york, 100));
}
