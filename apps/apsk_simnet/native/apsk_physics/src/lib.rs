//! APSK Physics for the simnet SER/BER studies
//!
//! Monte-Carlo simulation of an M-M dual-ring APSK constellation over an
//! AWGN channel with maximum-likelihood (nearest point) detection.
//! Everything here is pure computation: presentation, CSV export and the
//! BEAM bindings live in separate crates.

pub mod constellation;
pub mod error;
pub mod experiment;
pub mod noise;
pub mod sweep;
pub mod symbol;
pub mod theory;
pub mod utils;

#[cfg(test)]
mod statistics_tests;

// Re-export core types for convenience
pub use constellation::{Constellation, ConstellationPoint, Label, Ring, MAX_BITS_PER_SYMBOL};
pub use error::{ConfigurationError, Result};
pub use experiment::{noise_variance_for_snr, Experiment, ExperimentParams, ExperimentResult};
pub use noise::NoiseSource;
pub use sweep::{RatioSweep, Sweep, SweepParams, SweepPlan, SweepPoint, SweepResult};
pub use symbol::TransmissionEvent;
