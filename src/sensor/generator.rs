//! Wear-aware synthetic signal generator.
//!
//! Every call advances a cycle counter. The degradation factor
//! `cycle / 1000` pushes temperature, load and vibration up and spindle
//! speed down, so a long run drifts the way a wearing bit would.

use crate::sensor::types::Sample;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Nominal spindle speed of a fresh bit.
pub const BASE_RPM: f64 = 5000.0;

/// Ambient temperature floor in °C.
pub const BASE_TEMPERATURE: f64 = 20.0;

/// Cycles per unit of degradation.
pub const CYCLES_PER_DEGRADATION_UNIT: f64 = 1000.0;

const TEMPERATURE_SPREAD: f64 = 60.0;
const LOAD_SPREAD: f64 = 30.0;
const VIBRATION_SPREAD: f64 = 10.0;
const DEPTH_SPREAD: f64 = 50.0;

const TEMPERATURE_WEAR_GAIN: f64 = 10.0;
const RPM_WEAR_LOSS: f64 = 1000.0;
const LOAD_WEAR_GAIN: f64 = 5.0;
const VIBRATION_WEAR_GAIN: f64 = 2.0;

/// Cross-call memory of the generator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorState {
    /// Number of samples produced so far
    pub cycle: u64,
}

impl GeneratorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume from a previously reached cycle.
    pub fn at_cycle(cycle: u64) -> Self {
        Self { cycle }
    }

    /// Current degradation factor.
    pub fn degradation(&self) -> f64 {
        degradation_factor(self.cycle)
    }
}

/// Unitless wear proxy for a cycle.
pub fn degradation_factor(cycle: u64) -> f64 {
    cycle as f64 / CYCLES_PER_DEGRADATION_UNIT
}

/// Spindle speed at a cycle, clamped at `floor`.
pub fn nominal_rpm(cycle: u64, floor: u32) -> u32 {
    let rpm = (BASE_RPM - degradation_factor(cycle) * RPM_WEAR_LOSS).round();
    if rpm <= floor as f64 {
        floor
    } else {
        rpm as u32
    }
}

/// Lowest temperature the generator can emit at a cycle.
pub fn temperature_floor(cycle: u64) -> f64 {
    BASE_TEMPERATURE + degradation_factor(cycle) * TEMPERATURE_WEAR_GAIN
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// Produces one [`Sample`] per call.
#[derive(Debug)]
pub struct SignalGenerator<R = StdRng> {
    state: GeneratorState,
    rng: R,
    rpm_floor: u32,
}

impl SignalGenerator<StdRng> {
    /// Create a generator seeded from OS entropy.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Create a reproducible generator.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl Default for SignalGenerator<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> SignalGenerator<R> {
    /// Create a generator over any random source.
    pub fn with_rng(rng: R) -> Self {
        Self {
            state: GeneratorState::new(),
            rng,
            rpm_floor: 0,
        }
    }

    /// Set the lowest rpm the generator will emit.
    pub fn with_rpm_floor(mut self, floor: u32) -> Self {
        self.rpm_floor = floor;
        self
    }

    /// Continue from a saved state.
    pub fn with_state(mut self, state: GeneratorState) -> Self {
        self.state = state;
        self
    }

    /// Produce the next sample and advance the cycle.
    pub fn generate(&mut self) -> Sample {
        self.state.cycle += 1;
        let cycle = self.state.cycle;
        let degradation = degradation_factor(cycle);

        let temperature = round_to(
            temperature_floor(cycle) + self.rng.gen_range(0.0..TEMPERATURE_SPREAD),
            2,
        );
        let rpm = nominal_rpm(cycle, self.rpm_floor);
        let load = round_to(
            self.rng.gen_range(0.0..LOAD_SPREAD) + degradation * LOAD_WEAR_GAIN,
            2,
        );
        let vibration = round_to(
            self.rng.gen_range(0.0..VIBRATION_SPREAD) + degradation * VIBRATION_WEAR_GAIN,
            3,
        );
        let depth = round_to(self.rng.gen_range(0.0..DEPTH_SPREAD), 2);

        tracing::trace!(cycle, temperature, rpm, load, vibration, depth, "generated sample");

        Sample::new(temperature, rpm, load, vibration, depth)
    }

    /// Current state.
    pub fn state(&self) -> GeneratorState {
        self.state
    }

    /// Samples produced since creation or the last reset.
    pub fn cycle(&self) -> u64 {
        self.state.cycle
    }

    pub fn rpm_floor(&self) -> u32 {
        self.rpm_floor
    }

    /// Start the wear model over from a fresh bit.
    pub fn reset(&mut self) {
        self.state = GeneratorState::new();
    }
}
