//! Feature windows for the prediction endpoints.
//!
//! A window of chronologically ordered samples becomes one [`FeatureRow`]
//! per sample. The rows are then shaped two ways: the full sequence for the
//! remaining-useful-life model, and a flat list without temperature for the
//! temperature model.

use crate::sensor::types::SampleFields;
use serde::{Deserialize, Serialize};

/// Number of values in a feature row.
pub const FEATURE_COUNT: usize = 7;

/// Number of values per row once temperature is dropped.
pub const FEATURES_WITHOUT_TEMPERATURE: usize = FEATURE_COUNT - 1;

/// Converts load (A) and speed (rpm) into a torque proxy.
pub const TORQUE_CONSTANT: f64 = 9.55;

/// Per-timestep feature vector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub temperature: f64,
    pub rpm: f64,
    pub load: f64,
    pub vibration: f64,
    pub depth: f64,
    /// Temperature minus the previous row's temperature
    pub temperature_change: f64,
    /// `load * 9.55 / max(rpm, 1)`
    pub torque_estimate: f64,
}

impl FeatureRow {
    /// Build a row from a sample and its predecessor in the window.
    pub fn from_sample<S: SampleFields>(sample: &S, previous: Option<&S>) -> Self {
        let temperature = sample.temperature_or_default();
        let rpm = sample.rpm_or_default();
        let load = sample.load_or_default();
        let previous_temperature = previous
            .map(|p| p.temperature_or_default())
            .unwrap_or(temperature);

        Self {
            temperature,
            rpm,
            load,
            vibration: sample.vibration_or_default(),
            depth: sample.depth_or_default(),
            temperature_change: temperature - previous_temperature,
            torque_estimate: torque_estimate(load, rpm),
        }
    }

    /// Values in model order.
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.temperature,
            self.rpm,
            self.load,
            self.vibration,
            self.depth,
            self.temperature_change,
            self.torque_estimate,
        ]
    }

    /// Values in model order with temperature removed.
    pub fn without_temperature(&self) -> [f64; FEATURES_WITHOUT_TEMPERATURE] {
        [
            self.rpm,
            self.load,
            self.vibration,
            self.depth,
            self.temperature_change,
            self.torque_estimate,
        ]
    }
}

/// Torque proxy; speeds below 1 rpm use a denominator of 1.
pub fn torque_estimate(load: f64, rpm: f64) -> f64 {
    (load * TORQUE_CONSTANT) / rpm.max(1.0)
}

/// Build one feature row per sample, oldest first.
pub fn build_feature_rows<S: SampleFields>(samples: &[S]) -> Vec<FeatureRow> {
    samples
        .iter()
        .enumerate()
        .map(|(i, sample)| {
            let previous = if i == 0 { None } else { samples.get(i - 1) };
            FeatureRow::from_sample(sample, previous)
        })
        .collect()
}

/// Prediction-ready features for one window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureWindow {
    pub rows: Vec<FeatureRow>,
}

impl FeatureWindow {
    /// Derive features for a chronologically ordered window.
    ///
    /// Any length is accepted; an empty window yields empty sequences.
    pub fn from_samples<S: SampleFields>(samples: &[S]) -> Self {
        Self {
            rows: build_feature_rows(samples),
        }
    }

    /// Number of rows in the window.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The full sequence, one array per row.
    pub fn full_sequence(&self) -> Vec<[f64; FEATURE_COUNT]> {
        self.rows.iter().map(FeatureRow::to_array).collect()
    }

    /// All rows without temperature, concatenated into one list.
    pub fn temperature_excluded(&self) -> Vec<f64> {
        self.rows
            .iter()
            .flat_map(|row| row.without_temperature())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::types::{PartialSample, Sample};

    fn sample(temperature: f64, rpm: u32, load: f64) -> Sample {
        Sample::new(temperature, rpm, load, 4.5, 20.0)
    }

    #[test]
    fn test_single_row_window() {
        let window = FeatureWindow::from_samples(&[sample(45.0, 4800, 12.0)]);
        assert_eq!(window.len(), 1);

        let row = window.rows[0];
        assert_eq!(row.temperature_change, 0.0);
        assert!((row.torque_estimate - 12.0 * 9.55 / 4800.0).abs() < 1e-12);
    }

    #[test]
    fn test_temperature_change_sequence() {
        let samples = [
            sample(30.0, 4900, 10.0),
            sample(32.0, 4899, 10.0),
            sample(31.0, 4898, 10.0),
        ];
        let changes: Vec<f64> = build_feature_rows(&samples)
            .iter()
            .map(|r| r.temperature_change)
            .collect();
        assert_eq!(changes, vec![0.0, 2.0, -1.0]);
    }

    #[test]
    fn test_zero_rpm_uses_unit_denominator() {
        let row = FeatureRow::from_sample(&sample(50.0, 0, 20.0), None);
        assert!((row.torque_estimate - 20.0 * 9.55).abs() < 1e-12);
        assert!(row.torque_estimate.is_finite());
    }

    #[test]
    fn test_full_sequence_field_order() {
        let window = FeatureWindow::from_samples(&[Sample::new(40.0, 1000, 10.0, 2.5, 33.0)]);
        let full = window.full_sequence();
        assert_eq!(full.len(), 1);
        assert_eq!(&full[0][..6], &[40.0, 1000.0, 10.0, 2.5, 33.0, 0.0]);
        assert!((full[0][6] - 0.0955).abs() < 1e-12);
    }

    #[test]
    fn test_temperature_excluded_length_and_order() {
        let samples = [
            Sample::new(30.0, 1000, 10.0, 1.0, 5.0),
            Sample::new(35.0, 2000, 20.0, 2.0, 6.0),
        ];
        let flat = FeatureWindow::from_samples(&samples).temperature_excluded();
        assert_eq!(flat.len(), 6 * samples.len());
        assert_eq!(&flat[..5], &[1000.0, 10.0, 1.0, 5.0, 0.0]);
        assert_eq!(&flat[6..11], &[2000.0, 20.0, 2.0, 6.0, 5.0]);
        assert!(!flat.contains(&30.0));
        assert!(!flat.contains(&35.0));
    }

    #[test]
    fn test_empty_window() {
        let window = FeatureWindow::from_samples::<Sample>(&[]);
        assert!(window.is_empty());
        assert!(window.full_sequence().is_empty());
        assert!(window.temperature_excluded().is_empty());
    }

    #[test]
    fn test_partial_samples_default_to_zero() {
        let samples = [
            PartialSample {
                temperature: Some(30.0),
                load: Some(5.0),
                ..Default::default()
            },
            PartialSample::default(),
        ];
        let rows = build_feature_rows(&samples);
        assert_eq!(rows[0].rpm, 0.0);
        assert!((rows[0].torque_estimate - 5.0 * 9.55).abs() < 1e-12);
        assert_eq!(rows[1].temperature, 0.0);
        assert_eq!(rows[1].temperature_change, -30.0);
    }
}
