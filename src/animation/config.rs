use serde::{Deserialize, Serialize};

use crate::animation::render::IconOptions;
use crate::data::FlightFeed;

/// Scheduler-wide settings.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct AnimationConfig {
    /// When false, flights are drawn as static not-yet-departed paths and
    /// never advance.
    pub currently_tracking: bool,
    pub icon: IconOptions,
}

impl AnimationConfig {
    pub fn tracking(currently_tracking: bool) -> Self {
        AnimationConfig {
            currently_tracking,
            ..Default::default()
        }
    }

    pub fn from_feed(feed: &FlightFeed) -> Self {
        Self::tracking(feed.tracking.currently_tracking)
    }
}
