//! Run statistics for the drill agent.
//!
//! Counts what the agent did during a run (samples generated, windows
//! evaluated, prediction results) and optionally persists the totals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters for the current run.
#[derive(Debug)]
pub struct RunLog {
    /// Samples produced by the generator
    samples_generated: AtomicU64,
    /// Appends rejected by the feed
    append_failures: AtomicU64,
    /// Windows handed to the predictors
    windows_evaluated: AtomicU64,
    /// Prediction calls that returned a value
    predictions_succeeded: AtomicU64,
    /// Prediction calls that failed
    predictions_failed: AtomicU64,
    /// Run start time
    session_start: DateTime<Utc>,
    /// Path for persisting stats
    persist_path: Option<PathBuf>,
}

impl RunLog {
    /// Create a new run log.
    pub fn new() -> Self {
        Self {
            samples_generated: AtomicU64::new(0),
            append_failures: AtomicU64::new(0),
            windows_evaluated: AtomicU64::new(0),
            predictions_succeeded: AtomicU64::new(0),
            predictions_failed: AtomicU64::new(0),
            session_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create a run log that continues from the totals stored at `path`.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut log = Self::new();
        log.persist_path = Some(path);

        if let Err(e) = log.load() {
            tracing::warn!("Could not load previous run stats: {e}");
        }

        log
    }

    pub fn record_sample_generated(&self) {
        self.samples_generated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_append_failure(&self) {
        self.append_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_window_evaluated(&self) {
        self.windows_evaluated.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the outcome of one prediction call.
    pub fn record_prediction(&self, succeeded: bool) {
        if succeeded {
            self.predictions_succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.predictions_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Get the current statistics.
    pub fn stats(&self) -> RunStats {
        RunStats {
            samples_generated: self.samples_generated.load(Ordering::Relaxed),
            append_failures: self.append_failures.load(Ordering::Relaxed),
            windows_evaluated: self.windows_evaluated.load(Ordering::Relaxed),
            predictions_succeeded: self.predictions_succeeded.load(Ordering::Relaxed),
            predictions_failed: self.predictions_failed.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Run Statistics:\n\
             - Samples generated: {}\n\
             - Feed append failures: {}\n\
             - Windows evaluated: {}\n\
             - Predictions succeeded: {}\n\
             - Predictions unavailable: {}\n\
             - Run duration: {} seconds",
            stats.samples_generated,
            stats.append_failures,
            stats.windows_evaluated,
            stats.predictions_succeeded,
            stats.predictions_failed,
            stats.session_duration_secs
        )
    }

    /// Save stats to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let stats = self.stats();
            let persisted = PersistedStats {
                samples_generated: stats.samples_generated,
                append_failures: stats.append_failures,
                windows_evaluated: stats.windows_evaluated,
                predictions_succeeded: stats.predictions_succeeded,
                predictions_failed: stats.predictions_failed,
                last_updated: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;

            std::fs::write(path, json)?;
        }
        Ok(())
    }

    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let persisted: PersistedStats =
                    serde_json::from_str(&content).map_err(std::io::Error::other)?;

                self.samples_generated
                    .store(persisted.samples_generated, Ordering::Relaxed);
                self.append_failures
                    .store(persisted.append_failures, Ordering::Relaxed);
                self.windows_evaluated
                    .store(persisted.windows_evaluated, Ordering::Relaxed);
                self.predictions_succeeded
                    .store(persisted.predictions_succeeded, Ordering::Relaxed);
                self.predictions_failed
                    .store(persisted.predictions_failed, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    /// Reset all counters.
    pub fn reset(&self) {
        self.samples_generated.store(0, Ordering::Relaxed);
        self.append_failures.store(0, Ordering::Relaxed);
        self.windows_evaluated.store(0, Ordering::Relaxed);
        self.predictions_succeeded.store(0, Ordering::Relaxed);
        self.predictions_failed.store(0, Ordering::Relaxed);
    }
}

impl Default for RunLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of run statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStats {
    pub samples_generated: u64,
    pub append_failures: u64,
    pub windows_evaluated: u64,
    pub predictions_succeeded: u64,
    pub predictions_failed: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

/// Stats format for persistence.
#[derive(Debug, Serialize, Deserialize)]
pub struct PersistedStats {
    pub samples_generated: u64,
    #[serde(default)]
    pub append_failures: u64,
    pub windows_evaluated: u64,
    pub predictions_succeeded: u64,
    pub predictions_failed: u64,
    pub last_updated: DateTime<Utc>,
}

/// Thread-safe shared run log.
pub type SharedRunLog = Arc<RunLog>;

/// Create a new shared run log.
pub fn create_shared_log() -> SharedRunLog {
    Arc::new(RunLog::new())
}

/// Create a new shared run log with persistence.
pub fn create_shared_log_with_persistence(path: PathBuf) -> SharedRunLog {
    Arc::new(RunLog::with_persistence(path))
}
