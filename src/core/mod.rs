//! Core functionality for the Drill Sensor Agent.
//!
//! This module contains:
//! - The live feed holding the most recent samples
//! - Feature windows for the prediction endpoints
//! - Per-channel window summaries

pub mod features;
pub mod summary;
pub mod windowing;

// Re-export commonly used types
pub use features::{
    build_feature_rows, torque_estimate, FeatureRow, FeatureWindow, FEATURE_COUNT,
    FEATURES_WITHOUT_TEMPERATURE, TORQUE_CONSTANT,
};
pub use summary::{ChannelStats, WindowSummary};
pub use windowing::{
    create_shared_feed, FeedError, FeedUpdate, SampleFeed, SharedFeed, DEFAULT_FEED_CAPACITY,
};
