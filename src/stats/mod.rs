//! Run statistics for the Drill Sensor Agent.
//!
//! This module keeps the counters shown by `drill-sensor status` and at the
//! end of a run.

pub mod log;

// Re-export commonly used types
pub use log::{
    create_shared_log, create_shared_log_with_persistence, PersistedStats, RunLog, RunStats,
    SharedRunLog,
};
