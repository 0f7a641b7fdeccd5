use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use flightmap_engine::animation::clock::{Clock, SystemClock};
use flightmap_engine::animation::config::AnimationConfig;
use flightmap_engine::animation::flight::FlightRecord;
use flightmap_engine::animation::render::{FlightFrame, FlightRenderer};
use flightmap_engine::animation::scheduler::{FlightAnimationScheduler, FrameRequest};
use flightmap_engine::data::{read_feed_from_file, FlightFeed, TrackingStatus};
use flightmap_engine::GeoPoint;
use log::{debug, info, warn};
use once_cell::sync::Lazy;

const DEFAULT_FRAME_MS: u64 = 16;
const DEFAULT_MAX_FRAMES: u64 = 600;

static SAMPLE_FEED: Lazy<FlightFeed> = Lazy::new(|| {
    // Small demo feed used when no file is given.
    let now = SystemClock.now_ms();
    let flight = |id: &str, route: (GeoPoint, GeoPoint), elapsed: f64, remaining: f64| FlightRecord {
        identifier: id.into(),
        origin: route.0,
        destination: route.1,
        elapsed_distance: elapsed,
        remaining_distance: remaining,
        speed: 480.0,
        last_updated_at: now,
    };
    let lhr = GeoPoint::new(51.47, -0.45);
    let jfk = GeoPoint::new(40.64, -73.78);
    let akl = GeoPoint::new(-37.0, 174.8);
    let sfo = GeoPoint::new(37.62, -122.38);
    let syd = GeoPoint::new(-33.94, 151.18);
    let lax = GeoPoint::new(33.94, -118.41);
    FlightFeed {
        flights: vec![
            flight("BA117", (lhr, jfk), 1500.0, 1951.0),
            flight("NZ8", (akl, sfo), 3000.0, 3523.0),
            flight("QF12", (syd, lax), 6500.0, 1.0),
        ],
        tracking: TrackingStatus {
            arrival_dates: Vec::new(),
            currently_tracking: true,
        },
    }
});

/// Renderer that reports frames through the log.
#[derive(Default)]
struct LogRenderer {
    draws: u64,
}

impl FlightRenderer for LogRenderer {
    fn draw(&mut self, frame: &FlightFrame) {
        self.draws += 1;
        match frame.marker {
            Some(marker) => debug!(
                "{} at ({:.4}, {:.4}) heading {:.1} (icon {:.1}{}), {} elapsed / {} remaining points",
                frame.identifier,
                marker.position.lat,
                marker.position.lon,
                marker.heading,
                marker.icon.angle,
                if marker.icon.flipped { ", mirrored" } else { "" },
                frame.elapsed.len(),
                frame.remaining.len()
            ),
            None => info!("{} is {:?}, path drawn statically", frame.identifier, frame.state),
        }
    }

    fn retire(&mut self, identifier: &str) {
        debug!("{identifier} removed from map");
    }
}

fn env_u64(name: &str, default: u64) -> Result<u64> {
    match env::var(name) {
        Ok(value) => value
            .parse()
            .with_context(|| format!("{name} must be an integer, got {value:?}")),
        Err(_) => Ok(default),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let frame_ms = env_u64("FLIGHTMAP_FRAME_MS", DEFAULT_FRAME_MS)?.max(1);
    let max_frames = env_u64("FLIGHTMAP_MAX_FRAMES", DEFAULT_MAX_FRAMES)?;

    let feed = match env::args().nth(1) {
        Some(path) => read_feed_from_file(&path)
            .with_context(|| format!("failed to read flight feed from {path}"))?,
        None => SAMPLE_FEED.clone(),
    };

    let config = AnimationConfig::from_feed(&feed);
    let tracking = config.currently_tracking;
    let mut scheduler = FlightAnimationScheduler::new(config, LogRenderer::default());
    for record in feed.flights {
        if let Err(e) = scheduler.register_flight(record) {
            warn!("Skipping flight: {e}");
        }
    }
    scheduler.add_flights(tracking);

    if !tracking {
        info!(
            "Live tracking not active (arrival dates: {}), {} flights drawn statically",
            feed.tracking.arrival_dates.join(", "),
            scheduler.len()
        );
        return Ok(());
    }

    scheduler.start_animation();
    let clock = SystemClock;
    let mut interval = tokio::time::interval(Duration::from_millis(frame_ms));
    let mut frames = 0u64;
    while frames < max_frames && !scheduler.all_landed() {
        interval.tick().await;
        if scheduler.on_frame(clock.now_ms()) == FrameRequest::Stop {
            break;
        }
        frames += 1;
    }
    scheduler.stop_animation();

    info!(
        "Ran {} frames, {} of {} flights still airborne, {} draws",
        frames,
        scheduler.active_count(),
        scheduler.len(),
        scheduler.renderer().draws
    );
    Ok(())
}
