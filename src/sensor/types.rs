//! Sample types for the simulated drill.
//!
//! A [`Sample`] is one complete reading across the five physical channels.
//! A [`PartialSample`] is what external sources may hand us: any channel can
//! be missing, and missing channels read as zero.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One sensor reading from the drill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Bit temperature in °C
    pub temperature: f64,
    /// Spindle speed in revolutions per minute
    pub rpm: u32,
    /// Motor load in amperes
    pub load: f64,
    /// Vibration in m/s²
    pub vibration: f64,
    /// Drilling depth in millimetres
    pub depth: f64,
    /// Assigned by the feed when the sample is appended
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_at: Option<DateTime<Utc>>,
}

impl Sample {
    /// Create an unrecorded sample.
    pub fn new(temperature: f64, rpm: u32, load: f64, vibration: f64, depth: f64) -> Self {
        Self {
            temperature,
            rpm,
            load,
            vibration,
            depth,
            recorded_at: None,
        }
    }

    /// Whether the feed has stamped this sample.
    pub fn is_recorded(&self) -> bool {
        self.recorded_at.is_some()
    }
}

/// A reading where any channel may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialSample {
    pub temperature: Option<f64>,
    pub rpm: Option<f64>,
    pub load: Option<f64>,
    pub vibration: Option<f64>,
    pub depth: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recorded_at: Option<DateTime<Utc>>,
}

impl PartialSample {
    /// First supplied channel that is negative or not finite.
    ///
    /// A negative rpm is not reported here since conversion clamps it at 0.
    pub fn invalid_channel(&self) -> Option<&'static str> {
        let channels = [
            ("temperature", self.temperature),
            ("load", self.load),
            ("vibration", self.vibration),
            ("depth", self.depth),
        ];
        for (name, value) in channels {
            if matches!(value, Some(v) if !v.is_finite() || v < 0.0) {
                return Some(name);
            }
        }
        match self.rpm {
            Some(rpm) if !rpm.is_finite() => Some("rpm"),
            _ => None,
        }
    }
}

impl From<PartialSample> for Sample {
    fn from(partial: PartialSample) -> Self {
        let rpm = partial.rpm_or_default().round().max(0.0).min(u32::MAX as f64) as u32;
        Self {
            temperature: partial.temperature_or_default(),
            rpm,
            load: partial.load_or_default(),
            vibration: partial.vibration_or_default(),
            depth: partial.depth_or_default(),
            recorded_at: partial.recorded_at,
        }
    }
}

impl From<Sample> for PartialSample {
    fn from(sample: Sample) -> Self {
        Self {
            temperature: Some(sample.temperature),
            rpm: Some(sample.rpm as f64),
            load: Some(sample.load),
            vibration: Some(sample.vibration),
            depth: Some(sample.depth),
            recorded_at: sample.recorded_at,
        }
    }
}

/// Channel accessors that read a missing value as zero.
///
/// Feature and summary code is written against this trait so that complete
/// and partially populated records go through the same path.
pub trait SampleFields {
    fn temperature_or_default(&self) -> f64;
    fn rpm_or_default(&self) -> f64;
    fn load_or_default(&self) -> f64;
    fn vibration_or_default(&self) -> f64;
    fn depth_or_default(&self) -> f64;
}

impl SampleFields for Sample {
    fn temperature_or_default(&self) -> f64 {
        self.temperature
    }

    fn rpm_or_default(&self) -> f64 {
        self.rpm as f64
    }

    fn load_or_default(&self) -> f64 {
        self.load
    }

    fn vibration_or_default(&self) -> f64 {
        self.vibration
    }

    fn depth_or_default(&self) -> f64 {
        self.depth
    }
}

impl SampleFields for PartialSample {
    fn temperature_or_default(&self) -> f64 {
        self.temperature.unwrap_or_default()
    }

    fn rpm_or_default(&self) -> f64 {
        self.rpm.unwrap_or_default()
    }

    fn load_or_default(&self) -> f64 {
        self.load.unwrap_or_default()
    }

    fn vibration_or_default(&self) -> f64 {
        self.vibration.unwrap_or_default()
    }

    fn depth_or_default(&self) -> f64 {
        self.depth.unwrap_or_default()
    }
}

impl<T: SampleFields + ?Sized> SampleFields for &T {
    fn temperature_or_default(&self) -> f64 {
        (**self).temperature_or_default()
    }

    fn rpm_or_default(&self) -> f64 {
        (**self).rpm_or_default()
    }

    fn load_or_default(&self) -> f64 {
        (**self).load_or_default()
    }

    fn vibration_or_default(&self) -> f64 {
        (**self).vibration_or_default()
    }

    fn depth_or_default(&self) -> f64 {
        (**self).depth_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_sample_missing_fields_read_as_zero() {
        let partial: PartialSample = serde_json::from_str(r#"{"temperature": 41.5}"#).unwrap();
        assert_eq!(partial.temperature_or_default(), 41.5);
        assert_eq!(partial.rpm_or_default(), 0.0);
        assert_eq!(partial.load_or_default(), 0.0);
        assert_eq!(partial.vibration_or_default(), 0.0);
        assert_eq!(partial.depth_or_default(), 0.0);
    }

    #[test]
    fn test_partial_to_sample_rounds_and_clamps_rpm() {
        let sample = Sample::from(PartialSample {
            rpm: Some(4321.6),
            ..Default::default()
        });
        assert_eq!(sample.rpm, 4322);

        let sample = Sample::from(PartialSample {
            rpm: Some(-12.0),
            ..Default::default()
        });
        assert_eq!(sample.rpm, 0);
    }

    #[test]
    fn test_invalid_channel_detection() {
        let partial: PartialSample =
            serde_json::from_str(r#"{"temperature": 41.5, "rpm": -3}"#).unwrap();
        assert_eq!(partial.invalid_channel(), None);

        let partial = PartialSample {
            temperature: Some(-40.0),
            load: Some(-5.0),
            ..Default::default()
        };
        assert_eq!(partial.invalid_channel(), Some("temperature"));

        let partial = PartialSample {
            depth: Some(f64::NAN),
            ..Default::default()
        };
        assert_eq!(partial.invalid_channel(), Some("depth"));

        let partial = PartialSample {
            rpm: Some(f64::INFINITY),
            ..Default::default()
        };
        assert_eq!(partial.invalid_channel(), Some("rpm"));
    }

    #[test]
    fn test_recorded_at_omitted_until_stamped() {
        let sample = Sample::new(30.0, 4990, 12.5, 3.25, 17.0);
        assert!(!sample.is_recorded());

        let json = serde_json::to_value(&sample).unwrap();
        assert!(json.get("recorded_at").is_none());
        assert_eq!(json["rpm"], 4990);
    }
}
