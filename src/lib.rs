//! Drill Sensor Agent - simulated drill monitoring with predictive features.
//!
//! This library simulates the sensors of a drill whose bit wears over time,
//! keeps a live feed of the most recent readings, and shapes them into the
//! feature sequences consumed by remaining-useful-life and temperature
//! prediction models.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Drill Sensor Agent                      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐        │
//! │  │   Timer +   │──▶│ Sample Feed │──▶│  Features   │        │
//! │  │  Generator  │   │ (latest N)  │   │ (window W)  │        │
//! │  └─────────────┘   └─────────────┘   └─────────────┘        │
//! │         │                 │                  │              │
//! │         ▼                 ▼                  ▼              │
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐        │
//! │  │   Run Log   │   │  Dashboard  │◀──│ Predictors  │        │
//! │  │             │   │     API     │   │ (RUL, temp) │        │
//! │  └─────────────┘   └─────────────┘   └─────────────┘        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use drill_sensor_agent::{core::FeatureWindow, sensor::SignalGenerator, SampleFeed};
//!
//! let mut generator = SignalGenerator::with_seed(7);
//! let feed = SampleFeed::new(50);
//! for _ in 0..20 {
//!     feed.append(generator.generate()).unwrap();
//! }
//!
//! let window = FeatureWindow::from_samples(&feed.window(20));
//! assert_eq!(window.temperature_excluded().len(), 6 * 20);
//! ```

pub mod config;
pub mod core;
pub mod monitor;
pub mod predictor;
pub mod sensor;
pub mod stats;

#[cfg(feature = "server")]
pub mod server;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigError};
pub use core::{FeatureRow, FeatureWindow, FeedError, FeedUpdate, SampleFeed, WindowSummary};
pub use monitor::{DrillMonitor, PredictionReport};
pub use predictor::{
    DisabledPredictor, PredictionOutcome, Predictor, PredictorConfig, PredictorError,
};
pub use sensor::{GeneratorState, PartialSample, Sample, SampleTimer, SignalGenerator};
pub use stats::{RunLog, RunStats, SharedRunLog};

// Prediction client re-exports (when enabled)
#[cfg(feature = "predictor")]
pub use predictor::{BlockingPredictionClient, PredictionClient};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Notice shown to operators about the nature of the data.
pub const SIMULATION_NOTICE: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║              DRILL SENSOR AGENT - SIMULATION NOTICE              ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  All readings produced by this agent are SYNTHETIC.              ║
║                                                                  ║
║  ✓ WHAT IS MODELLED:                                             ║
║    • Temperature, load and vibration rise as the bit wears       ║
║    • Spindle speed falls by 1 rpm per cycle (never below floor)  ║
║    • Depth is independent of wear                                ║
║                                                                  ║
║  ✗ WHAT IS NOT:                                                  ║
║    • Any physical drill, PLC or field bus                        ║
║    • Calibration, sensor faults or maintenance events            ║
║                                                                  ║
║  Predictions come from external models fed with the latest       ║
║  20 readings. When a model cannot be reached the dashboard       ║
║  shows "prediction unavailable" and the run continues.           ║
║                                                                  ║
║  You can view run statistics anytime with:                       ║
║    drill-sensor status                                           ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulation_notice_contents() {
        assert!(SIMULATION_NOTICE.contains("SYNTHETIC"));
        assert!(SIMULATION_NOTICE.contains("prediction unavailable"));
        assert!(SIMULATION_NOTICE.contains("drill-sensor status"));
    }
}
