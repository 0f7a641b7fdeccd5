use std::fs;
use std::io::Cursor;
use std::path::Path;

use bincode::ErrorKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::animation::flight::FlightRecord;

/// Compression level used when encoding feed snapshots.
///
/// Snapshots are written once and replayed many times, so we trade encode
/// time for size.
const SNAPSHOT_COMPRESSION_LEVEL: i32 = 19;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Serialization error: {0}")]
    Serialize(#[from] Box<ErrorKind>),
    #[error("Compression error: {0}")]
    Compression(#[source] std::io::Error),
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct TrackingStatus {
    /// Days on which tracked flights arrive, as given by the server.
    pub arrival_dates: Vec<String>,
    pub currently_tracking: bool,
}

/// Flight payload as served to the map.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct FlightFeed {
    pub flights: Vec<FlightRecord>,
    pub tracking: TrackingStatus,
}

pub fn parse_feed_json(bytes: &[u8]) -> Result<FlightFeed, DataError> {
    Ok(serde_json::from_slice(bytes)?)
}

pub fn serialize_feed(feed: &FlightFeed) -> Result<Vec<u8>, DataError> {
    let encoded = bincode::serialize(feed)?;
    let mut cursor = Cursor::new(encoded);
    zstd::stream::encode_all(&mut cursor, SNAPSHOT_COMPRESSION_LEVEL)
        .map_err(DataError::Compression)
}

pub fn deserialize_feed(bytes: &[u8]) -> Result<FlightFeed, DataError> {
    let mut cursor = Cursor::new(bytes);
    let decoded = zstd::stream::decode_all(&mut cursor).map_err(DataError::Compression)?;
    Ok(bincode::deserialize(&decoded)?)
}

pub fn write_snapshot_to_file<P: AsRef<Path>>(feed: &FlightFeed, path: P) -> Result<(), DataError> {
    let bytes = serialize_feed(feed)?;
    fs::write(path, bytes)?;
    Ok(())
}

pub fn read_snapshot_from_file<P: AsRef<Path>>(path: P) -> Result<FlightFeed, DataError> {
    let bytes = fs::read(path)?;
    deserialize_feed(&bytes)
}

/// Reads a feed from disk: `.json` files are parsed as JSON, anything else
/// is treated as a compressed snapshot.
pub fn read_feed_from_file<P: AsRef<Path>>(path: P) -> Result<FlightFeed, DataError> {
    let path = path.as_ref();
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        parse_feed_json(&fs::read(path)?)
    } else {
        read_snapshot_from_file(path)
    }
}
