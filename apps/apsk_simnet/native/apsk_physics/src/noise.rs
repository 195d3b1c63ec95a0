//! Additive White Gaussian Noise source
//!
//! Zero-mean Gaussian samples with a configured per-axis variance. The
//! source keeps no state between draws; randomness comes from the
//! generator the caller passes in, so seeding and per-worker streams stay
//! with the caller.

use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::error::{ConfigurationError, Result};

/// Per-axis AWGN source
#[derive(Debug, Clone, Copy)]
pub struct NoiseSource {
    variance: f64,
    /// None for the silent channel
    distr: Option<Normal<f64>>,
}

impl NoiseSource {
    /// Create a source with the given per-axis variance
    ///
    /// # Errors
    /// `ConfigurationError::InvalidVariance` unless `variance` is positive
    /// and finite.
    pub fn new(variance: f64) -> Result<Self> {
        if !(variance.is_finite() && variance > 0.0) {
            return Err(ConfigurationError::InvalidVariance(variance));
        }
        let distr =
            Normal::new(0.0, variance.sqrt()).map_err(|_| ConfigurationError::InvalidVariance(variance))?;
        Ok(Self {
            variance,
            distr: Some(distr),
        })
    }

    /// Silent channel: every sample is exactly zero
    pub fn noiseless() -> Self {
        Self {
            variance: 0.0,
            distr: None,
        }
    }

    pub fn variance(&self) -> f64 {
        self.variance
    }

    pub fn mean(&self) -> f64 {
        0.0
    }

    /// Complex noise power, 2 × variance (one variance per axis)
    pub fn power(&self) -> f64 {
        2.0 * self.variance
    }

    pub fn is_silent(&self) -> bool {
        self.distr.is_none()
    }

    /// Draw one independent sample
    ///
    /// The silent channel returns 0.0 without consuming randomness.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match &self.distr {
            Some(distr) => distr.sample(rng),
            None => 0.0,
        }
    }
}
