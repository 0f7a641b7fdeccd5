pub mod bearing;
pub mod bezier;
pub mod sphere;

/// Number of segments every sampled path is split into.
pub const PATH_SAMPLE_SEGMENTS: usize = 100;
