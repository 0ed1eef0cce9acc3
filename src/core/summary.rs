//! Per-channel statistics over a window of samples.

use crate::sensor::types::SampleFields;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Statistics for one channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelStats {
    /// Value of the newest sample
    pub latest: f64,
    pub mean: f64,
    /// Sample standard deviation (0 for fewer than two samples)
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl ChannelStats {
    fn from_values(values: &[f64]) -> Option<Self> {
        let latest = *values.last()?;
        let std_dev = if values.len() < 2 {
            0.0
        } else {
            values.iter().std_dev()
        };

        Some(Self {
            latest,
            mean: values.iter().mean(),
            std_dev,
            min: Statistics::min(values.iter()),
            max: Statistics::max(values.iter()),
        })
    }
}

/// Statistics for every channel of a window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSummary {
    /// Number of samples summarized
    pub count: usize,
    pub temperature: ChannelStats,
    pub rpm: ChannelStats,
    pub load: ChannelStats,
    pub vibration: ChannelStats,
    pub depth: ChannelStats,
}

impl WindowSummary {
    /// Summarize a chronologically ordered window. Returns `None` when empty.
    pub fn from_samples<S: SampleFields>(samples: &[S]) -> Option<Self> {
        let channel = |f: fn(&S) -> f64| -> Option<ChannelStats> {
            let values: Vec<f64> = samples.iter().map(f).collect();
            ChannelStats::from_values(&values)
        };

        Some(Self {
            count: samples.len(),
            temperature: channel(S::temperature_or_default)?,
            rpm: channel(S::rpm_or_default)?,
            load: channel(S::load_or_default)?,
            vibration: channel(S::vibration_or_default)?,
            depth: channel(S::depth_or_default)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::types::Sample;

    #[test]
    fn test_empty_window_has_no_summary() {
        assert!(WindowSummary::from_samples::<Sample>(&[]).is_none());
    }

    #[test]
    fn test_single_sample_summary() {
        let summary = WindowSummary::from_samples(&[Sample::new(40.0, 4000, 10.0, 2.0, 5.0)]).unwrap();
        assert_eq!(summary.count, 1);
        assert_eq!(summary.temperature.latest, 40.0);
        assert_eq!(summary.temperature.mean, 40.0);
        assert_eq!(summary.temperature.std_dev, 0.0);
        assert_eq!(summary.rpm.min, 4000.0);
    }

    #[test]
    fn test_summary_statistics() {
        let samples = [
            Sample::new(30.0, 4990, 10.0, 1.0, 10.0),
            Sample::new(32.0, 4989, 12.0, 2.0, 20.0),
            Sample::new(34.0, 4988, 14.0, 3.0, 30.0),
        ];
        let summary = WindowSummary::from_samples(&samples).unwrap();

        assert_eq!(summary.count, 3);
        assert_eq!(summary.temperature.latest, 34.0);
        assert!((summary.temperature.mean - 32.0).abs() < 1e-12);
        assert!((summary.temperature.std_dev - 2.0).abs() < 1e-12);
        assert_eq!(summary.rpm.min, 4988.0);
        assert_eq!(summary.rpm.max, 4990.0);
        assert!((summary.depth.mean - 20.0).abs() < 1e-12);
    }
}
