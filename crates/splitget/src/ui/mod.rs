pub mod tracker;

use std::sync::Arc;

use tracker::{DotTracker, ProgressTrackerBuilder, Tracker};

pub fn new_tracker(bar: bool) -> Arc<dyn Tracker> {
    if bar {
        Arc::new(ProgressTrackerBuilder::default().with_prefix("Fetching").build())
    } else {
        Arc::new(DotTracker)
    }
}
