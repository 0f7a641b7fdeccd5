use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, Context, Result};
use flightmap_engine::animation::flight::FlightRecord;
use flightmap_engine::data::{parse_feed_json, write_snapshot_to_file, FlightFeed};
use flightmap_engine::path::planner::plan_path;
use log::{info, warn};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct SnapshotMetadata {
    source: String,
    flights: usize,
    skipped: usize,
    antimeridian_paths: usize,
    currently_tracking: bool,
    generated_at_epoch: u64,
}

fn main() -> Result<()> {
    env_logger::init();

    let mut args = env::args().skip(1);
    let input = args
        .next()
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("usage: build_snapshot <feed.json> [output_dir]"))?;
    let output_dir = args.next().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("data"));

    let bytes = fs::read(&input).with_context(|| format!("failed to read {}", input.display()))?;
    let feed = parse_feed_json(&bytes)
        .with_context(|| format!("failed to parse feed {}", input.display()))?;

    let (flights, skipped) = keep_valid(feed.flights);
    let antimeridian_paths = flights
        .iter()
        .filter(|f| plan_path(f.origin, f.destination).geometry.is_antimeridian())
        .count();
    let snapshot = FlightFeed {
        flights,
        tracking: feed.tracking,
    };

    fs::create_dir_all(&output_dir).context("failed to create snapshot output directory")?;
    let snapshot_path = output_dir.join("flights.bin");
    write_snapshot_to_file(&snapshot, &snapshot_path)
        .with_context(|| format!("failed to write snapshot to {}", snapshot_path.display()))?;

    let metadata = SnapshotMetadata {
        source: input.display().to_string(),
        flights: snapshot.flights.len(),
        skipped,
        antimeridian_paths,
        currently_tracking: snapshot.tracking.currently_tracking,
        generated_at_epoch: current_epoch_seconds(),
    };
    let metadata_path = output_dir.join("flights.meta.json");
    let metadata_json = serde_json::to_vec_pretty(&metadata)?;
    fs::write(&metadata_path, metadata_json)
        .with_context(|| format!("failed to write metadata to {}", metadata_path.display()))?;

    info!(
        "Wrote snapshot to {} ({} flights, {} over the date line, {} skipped)",
        snapshot_path.display(),
        metadata.flights,
        metadata.antimeridian_paths,
        metadata.skipped
    );

    Ok(())
}

fn keep_valid(records: Vec<FlightRecord>) -> (Vec<FlightRecord>, usize) {
    let total = records.len();
    let mut seen = HashSet::new();
    let kept: Vec<FlightRecord> = records
        .into_iter()
        .filter(|r| match r.validate() {
            Err(e) => {
                warn!("Dropping record: {e}");
                false
            }
            Ok(()) if !seen.insert(r.identifier.clone()) => {
                warn!("Dropping duplicate record {}", r.identifier);
                false
            }
            Ok(()) => true,
        })
        .collect();
    let skipped = total - kept.len();
    (kept, skipped)
}

fn current_epoch_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
