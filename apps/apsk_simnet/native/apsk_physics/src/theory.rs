//! Numerical reference error rates
//!
//! The alternating dual-ring layout has no closed-form SER, so the exact
//! detection probabilities are integrated numerically: for each sent
//! point the 2-D Gaussian noise density is summed over a square grid of
//! ±[`GRID_SPAN_SIGMA`] standard deviations and every cell is credited to
//! the point the detector would pick. Rows are renormalised to absorb the
//! truncated tails.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::constellation::Constellation;
use crate::error::{ConfigurationError, Result};

/// Half-width of the integration grid in noise standard deviations
pub const GRID_SPAN_SIGMA: f64 = 6.0;

/// Grid cells per axis
pub const DEFAULT_GRID_POINTS: usize = 801;

/// P(detected j | sent i), row-major
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionMatrix {
    order: usize,
    probabilities: Vec<f64>,
}

impl TransitionMatrix {
    pub fn order(&self) -> usize {
        self.order
    }

    pub fn probability(&self, sent: usize, detected: usize) -> f64 {
        self.probabilities[sent * self.order + detected]
    }

    pub fn row(&self, sent: usize) -> &[f64] {
        &self.probabilities[sent * self.order..(sent + 1) * self.order]
    }
}

/// Expected error rates for uniformly drawn symbols
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErrorRates {
    pub ser: f64,
    pub ber: f64,
}

pub fn transition_probabilities(
    constellation: &Constellation,
    variance: f64,
) -> Result<TransitionMatrix> {
    transition_probabilities_with_grid(constellation, variance, DEFAULT_GRID_POINTS)
}

/// Integrate detection probabilities on a `grid_points` × `grid_points` grid
///
/// # Errors
/// `InvalidVariance` unless `variance` is positive and finite.
pub fn transition_probabilities_with_grid(
    constellation: &Constellation,
    variance: f64,
    grid_points: usize,
) -> Result<TransitionMatrix> {
    if !(variance.is_finite() && variance > 0.0) {
        return Err(ConfigurationError::InvalidVariance(variance));
    }
    let grid_points = grid_points.max(2);
    let sigma = variance.sqrt();
    let span = GRID_SPAN_SIGMA * sigma;
    let step = 2.0 * span / grid_points as f64;

    // Cell midpoints and their 1-D Gaussian masses; the 2-D density is separable
    let offsets: Vec<f64> = (0..grid_points)
        .map(|k| -span + (k as f64 + 0.5) * step)
        .collect();
    let weights: Vec<f64> = offsets
        .iter()
        .map(|x| (-x * x / (2.0 * variance)).exp())
        .collect();

    let order = constellation.order();
    let mut probabilities = vec![0.0; order * order];

    for (sent, point) in constellation.points().iter().enumerate() {
        let row = &mut probabilities[sent * order..(sent + 1) * order];
        for (&dx, &wx) in offsets.iter().zip(&weights) {
            for (&dy, &wy) in offsets.iter().zip(&weights) {
                let detected = constellation.detect(point.vector + Complex64::new(dx, dy));
                row[detected] += wx * wy;
            }
        }
        let total: f64 = row.iter().sum();
        for p in row.iter_mut() {
            *p /= total;
        }
    }

    Ok(TransitionMatrix {
        order,
        probabilities,
    })
}

/// SER and BER implied by a transition matrix
pub fn error_rates(constellation: &Constellation, matrix: &TransitionMatrix) -> ErrorRates {
    let order = constellation.order();
    let bits = f64::from(constellation.bits_per_symbol());
    let points = constellation.points();

    let mut correct = 0.0;
    let mut bit_errors = 0.0;
    for sent in 0..order {
        correct += matrix.probability(sent, sent);
        for (detected, &p) in matrix.row(sent).iter().enumerate() {
            let distance = points[sent].label.hamming_distance(&points[detected].label);
            bit_errors += p * f64::from(distance);
        }
    }

    ErrorRates {
        ser: 1.0 - correct / order as f64,
        ber: bit_errors / (order as f64 * bits),
    }
}
