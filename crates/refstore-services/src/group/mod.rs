//! Request group lifecycle tracking.

pub mod tracker;

pub use tracker::{GroupTracker, GroupTrackerConfig};
