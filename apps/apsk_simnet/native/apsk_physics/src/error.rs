//! Configuration errors
//!
//! Every failure in the simulator is a bad input. They are all detected
//! before the first random draw and surfaced unchanged to the caller.

use thiserror::Error;

/// Result type for simulator construction
pub type Result<T> = std::result::Result<T, ConfigurationError>;

/// Invalid simulator parameters
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    /// A ring must hold at least one symbol
    #[error("ring symbol count must be positive")]
    EmptyRing,

    /// Labels need 2M to be an exact power of two
    #[error("2 x {ring_symbols} = {order} points is not a power of two")]
    NotPowerOfTwo { ring_symbols: usize, order: usize },

    /// Labels are held in a u32 and capped well below that
    #[error("{order} points exceed the {max_bits}-bit label limit")]
    TooManyPoints { order: usize, max_bits: u32 },

    #[error("{name} radius must be positive and finite, got {value}")]
    InvalidRadius { name: &'static str, value: f64 },

    /// Inner/outer ring ratio b
    #[error("ring ratio b must be positive and finite, got {0}")]
    InvalidRatio(f64),

    /// Noise variance, given directly or derived from an SNR target
    #[error("noise variance must be positive and finite, got {0}")]
    InvalidVariance(f64),

    #[error("symbol count must be positive")]
    ZeroSymbolCount,

    /// Constellation radii disagree with the experiment's b
    #[error("constellation ratio {constellation} does not match b = {requested}")]
    RatioMismatch { constellation: f64, requested: f64 },

    #[error("label {label} assigned to both index {first} and {second}")]
    DuplicateLabel {
        label: String,
        first: usize,
        second: usize,
    },

    #[error("indices {first} and {second} share the same vector")]
    DuplicateVector { first: usize, second: usize },

    /// Sweep step/count parameters
    #[error("invalid sweep: {0}")]
    InvalidSweep(String),
}
