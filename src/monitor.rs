//! Reactive consumer of feed updates.
//!
//! The monitor waits until the feed holds a full window, derives the
//! feature window, asks the predictors for remaining useful life and
//! temperature, and keeps the most recent report. A failed prediction is
//! recorded as unavailable and never interrupts the run.

use crate::core::features::FeatureWindow;
use crate::core::summary::WindowSummary;
use crate::core::windowing::FeedUpdate;
use crate::predictor::{
    PredictionOutcome, Predictor, PredictorError, RulRequest, TemperatureRequest,
};
use crate::sensor::types::SampleFields;
use crate::stats::SharedRunLog;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

/// Window length expected by the prediction models.
pub const DEFAULT_WINDOW_SIZE: usize = 20;

/// Predictions and context for one evaluated window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionReport {
    /// Drill that produced the samples
    pub drill_id: String,
    /// When the window was evaluated
    pub evaluated_at: DateTime<Utc>,
    /// Feed sequence number of the newest sample, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feed_sequence: Option<u64>,
    /// Rows in the evaluated window
    pub window_len: usize,
    /// Channel statistics over the window
    pub summary: Option<WindowSummary>,
    /// Remaining useful life estimate
    pub rul: PredictionOutcome,
    /// Temperature estimate
    pub temperature: PredictionOutcome,
}

/// Latest report shared between the monitor and readers.
pub type SharedReport = Arc<RwLock<Option<PredictionReport>>>;

/// Generate an identifier for this drill instance.
pub fn generate_drill_id() -> String {
    let hostname = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    format!(
        "drill-{}-{}",
        hostname,
        &uuid::Uuid::new_v4().to_string()[..8]
    )
}

/// Turns feed windows into prediction reports.
pub struct DrillMonitor {
    drill_id: String,
    window_size: usize,
    log: SharedRunLog,
    latest: SharedReport,
}

impl DrillMonitor {
    /// Create a monitor requiring `window_size` samples (minimum 1).
    pub fn new(window_size: usize, log: SharedRunLog) -> Self {
        Self {
            drill_id: generate_drill_id(),
            window_size: window_size.max(1),
            log,
            latest: Arc::new(RwLock::new(None)),
        }
    }

    /// Use a fixed drill identifier.
    pub fn with_drill_id(mut self, drill_id: impl Into<String>) -> Self {
        self.drill_id = drill_id.into();
        self
    }

    pub fn drill_id(&self) -> &str {
        &self.drill_id
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Feature window over the newest `window_size` samples, or `None` if
    /// fewer are available.
    pub fn prepare<S: SampleFields>(&self, samples: &[S]) -> Option<FeatureWindow> {
        if samples.len() < self.window_size {
            tracing::debug!(
                available = samples.len(),
                required = self.window_size,
                "Window not full yet"
            );
            return None;
        }
        let start = samples.len() - self.window_size;
        Some(FeatureWindow::from_samples(&samples[start..]))
    }

    /// Evaluate a chronologically ordered window against a predictor.
    pub fn evaluate<S, P>(&self, samples: &[S], predictor: &P) -> Option<PredictionReport>
    where
        S: SampleFields,
        P: Predictor + ?Sized,
    {
        self.evaluate_with_sequence(samples, predictor, None)
    }

    /// Evaluate a feed update and keep the report as the latest.
    pub fn handle_update<P>(&self, update: &FeedUpdate, predictor: &P) -> Option<PredictionReport>
    where
        P: Predictor + ?Sized,
    {
        let report = self.evaluate_with_sequence(&update.samples, predictor, Some(update.sequence))?;

        match self.latest.write() {
            Ok(mut latest) => *latest = Some(report.clone()),
            Err(e) => tracing::warn!("Could not store prediction report: {e}"),
        }

        Some(report)
    }

    fn evaluate_with_sequence<S, P>(
        &self,
        samples: &[S],
        predictor: &P,
        feed_sequence: Option<u64>,
    ) -> Option<PredictionReport>
    where
        S: SampleFields,
        P: Predictor + ?Sized,
    {
        let window = self.prepare(samples)?;
        self.log.record_window_evaluated();

        let rul = self.outcome("rul", predictor.predict_rul(&RulRequest::from_window(&window)));
        let temperature = self.outcome(
            "temperature",
            predictor.predict_temperature(&TemperatureRequest::from_window(&window)),
        );

        let start = samples.len() - window.len();
        let report = PredictionReport {
            drill_id: self.drill_id.clone(),
            evaluated_at: Utc::now(),
            feed_sequence,
            window_len: window.len(),
            summary: WindowSummary::from_samples(&samples[start..]),
            rul,
            temperature,
        };

        tracing::info!(
            drill_id = %report.drill_id,
            rul = %report.rul,
            temperature = %report.temperature,
            "Window evaluated"
        );

        Some(report)
    }

    fn outcome(&self, name: &str, result: Result<f64, PredictorError>) -> PredictionOutcome {
        self.log.record_prediction(result.is_ok());
        match &result {
            Ok(_) => {}
            Err(PredictorError::Disabled) => {
                tracing::debug!(prediction = name, "Predictor disabled")
            }
            Err(e) => tracing::warn!(prediction = name, "Prediction unavailable: {e}"),
        }
        result.into()
    }

    /// Most recent report, if any window has been evaluated.
    pub fn latest_report(&self) -> Option<PredictionReport> {
        self.latest.read().ok().and_then(|latest| latest.clone())
    }

    /// Handle for readers of the latest report.
    pub fn shared_report(&self) -> SharedReport {
        self.latest.clone()
    }
}
