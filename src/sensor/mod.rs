//! Simulated drill sensors.
//!
//! This module provides the sample types, the wear-aware signal generator
//! and the repeating timer that drives it.

pub mod generator;
pub mod timer;
pub mod types;

// Re-export commonly used types
pub use generator::{
    degradation_factor, nominal_rpm, temperature_floor, GeneratorState, SignalGenerator,
};
pub use timer::SampleTimer;
pub use types::{PartialSample, Sample, SampleFields};
