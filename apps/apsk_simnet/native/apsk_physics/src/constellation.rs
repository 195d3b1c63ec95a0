//! Dual-ring APSK constellation
//!
//! An M-M APSK places M symbols on each of two concentric rings, 2M points
//! in total. Consecutive indices alternate between rings and advance by a
//! fixed angle:
//!
//! Index i → angle i × 360°/(2M)
//! Even i  → inner ring
//! Odd i   → outer ring
//!
//! Natural binary labelling (not Gray coded), e.g. 4 points (M = 2):
//! Index 0 → 00, inner,   0°
//! Index 1 → 01, outer,  90°
//! Index 2 → 10, inner, 180°
//! Index 3 → 11, outer, 270°
//!
//! The alternating placement decides which labels are geometric neighbours
//! and therefore shapes the BER curve. It must not be regrouped into
//! contiguous inner/outer blocks.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{ConfigurationError, Result};

/// Largest supported label width (2^16 points)
pub const MAX_BITS_PER_SYMBOL: u32 = 16;

/// k-bit symbol label
///
/// Renders as the zero-padded binary string of its value, most
/// significant bit first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Label {
    value: u32,
    width: u32,
}

impl Label {
    pub fn new(value: u32, width: u32) -> Self {
        debug_assert!(width <= 32);
        debug_assert!(width == 32 || value < (1u32 << width));
        Self { value, width }
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    /// Bit at `position`, counted from the most significant bit
    pub fn bit(&self, position: u32) -> bool {
        debug_assert!(position < self.width);
        (self.value >> (self.width - 1 - position)) & 1 == 1
    }

    /// Number of bit positions that differ
    pub fn hamming_distance(&self, other: &Label) -> u32 {
        debug_assert_eq!(self.width, other.width);
        (self.value ^ other.value).count_ones()
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.width == 0 {
            return Ok(());
        }
        write!(f, "{:0width$b}", self.value, width = self.width as usize)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseLabelError {
    #[error("label is empty")]
    Empty,
    #[error("label is longer than 32 bits")]
    TooLong,
    #[error("invalid bit character {0:?}")]
    InvalidBit(char),
}

impl FromStr for Label {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ParseLabelError::Empty);
        }
        if s.len() > 32 {
            return Err(ParseLabelError::TooLong);
        }
        let mut value = 0u32;
        for c in s.chars() {
            let bit = match c {
                '0' => 0,
                '1' => 1,
                other => return Err(ParseLabelError::InvalidBit(other)),
            };
            value = (value << 1) | bit;
        }
        Ok(Self::new(value, s.len() as u32))
    }
}

/// Which ring a point sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ring {
    Inner,
    Outer,
}

/// One fixed constellation point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConstellationPoint {
    pub index: usize,
    pub vector: Complex64,
    pub label: Label,
}

impl ConstellationPoint {
    pub fn ring(&self) -> Ring {
        if self.index % 2 == 0 {
            Ring::Inner
        } else {
            Ring::Outer
        }
    }
}

/// Exact bit pattern of a vector, used as a lookup key
type VectorKey = (u64, u64);

fn vector_key(v: Complex64) -> VectorKey {
    // Adding 0.0 folds -0.0 into +0.0
    ((v.re + 0.0).to_bits(), (v.im + 0.0).to_bits())
}

fn validate_radius(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidRadius { name, value })
    }
}

/// Immutable M-M APSK constellation with its index/label/vector tables
#[derive(Debug, Clone)]
pub struct Constellation {
    ring_symbols: usize,
    bits_per_symbol: u32,
    inner_radius: f64,
    outer_radius: f64,
    points: Vec<ConstellationPoint>,
    label_to_index: HashMap<Label, usize>,
    vector_to_index: HashMap<VectorKey, usize>,
}

impl Constellation {
    /// Build the constellation for `ring_symbols` points per ring
    ///
    /// # Errors
    /// `ConfigurationError` if 2M is not a power of two (or is too large)
    /// or if either radius is not a positive finite number.
    pub fn new(ring_symbols: usize, inner_radius: f64, outer_radius: f64) -> Result<Self> {
        if ring_symbols == 0 {
            return Err(ConfigurationError::EmptyRing);
        }
        let order = ring_symbols
            .checked_mul(2)
            .ok_or(ConfigurationError::TooManyPoints {
                order: usize::MAX,
                max_bits: MAX_BITS_PER_SYMBOL,
            })?;
        if !order.is_power_of_two() {
            return Err(ConfigurationError::NotPowerOfTwo {
                ring_symbols,
                order,
            });
        }
        let bits_per_symbol = order.trailing_zeros();
        if bits_per_symbol > MAX_BITS_PER_SYMBOL {
            return Err(ConfigurationError::TooManyPoints {
                order,
                max_bits: MAX_BITS_PER_SYMBOL,
            });
        }
        validate_radius("inner", inner_radius)?;
        validate_radius("outer", outer_radius)?;

        let angle_step = 360.0 / order as f64;
        let mut points = Vec::with_capacity(order);
        let mut label_to_index = HashMap::with_capacity(order);
        let mut vector_to_index = HashMap::with_capacity(order);

        for index in 0..order {
            let radius = if index % 2 == 0 {
                inner_radius
            } else {
                outer_radius
            };
            let angle = (index as f64 * angle_step).to_radians();
            let vector = Complex64::from_polar(radius, angle);
            let label = Label::new(index as u32, bits_per_symbol);

            if let Some(first) = label_to_index.insert(label, index) {
                return Err(ConfigurationError::DuplicateLabel {
                    label: label.to_string(),
                    first,
                    second: index,
                });
            }
            if let Some(first) = vector_to_index.insert(vector_key(vector), index) {
                return Err(ConfigurationError::DuplicateVector {
                    first,
                    second: index,
                });
            }

            points.push(ConstellationPoint {
                index,
                vector,
                label,
            });
        }

        Ok(Self {
            ring_symbols,
            bits_per_symbol,
            inner_radius,
            outer_radius,
            points,
            label_to_index,
            vector_to_index,
        })
    }

    /// Experiment convention: inner radius 1, outer radius 1/b
    pub fn from_ratio(ring_symbols: usize, b: f64) -> Result<Self> {
        if !(b.is_finite() && b > 0.0) {
            return Err(ConfigurationError::InvalidRatio(b));
        }
        Self::new(ring_symbols, 1.0, 1.0 / b)
    }

    /// Symbols per ring (M)
    pub fn ring_symbols(&self) -> usize {
        self.ring_symbols
    }

    /// Total number of points (2M)
    pub fn order(&self) -> usize {
        self.points.len()
    }

    /// Bits per symbol, log2(2M)
    pub fn bits_per_symbol(&self) -> u32 {
        self.bits_per_symbol
    }

    pub fn inner_radius(&self) -> f64 {
        self.inner_radius
    }

    pub fn outer_radius(&self) -> f64 {
        self.outer_radius
    }

    /// Ring ratio b = inner / outer
    pub fn ratio(&self) -> f64 {
        self.inner_radius / self.outer_radius
    }

    /// Angular spacing between consecutive indices
    pub fn angle_step_degrees(&self) -> f64 {
        360.0 / self.order() as f64
    }

    /// (inner² + outer²) / 2
    pub fn average_symbol_power(&self) -> f64 {
        (self.inner_radius.powi(2) + self.outer_radius.powi(2)) / 2.0
    }

    /// 2M × average symbol power
    pub fn total_power(&self) -> f64 {
        self.order() as f64 * self.average_symbol_power()
    }

    pub fn points(&self) -> &[ConstellationPoint] {
        &self.points
    }

    pub fn point(&self, index: usize) -> Option<&ConstellationPoint> {
        self.points.get(index)
    }

    pub fn label(&self, index: usize) -> Option<Label> {
        self.points.get(index).map(|p| p.label)
    }

    pub fn index_for_label(&self, label: &Label) -> Option<usize> {
        self.label_to_index.get(label).copied()
    }

    /// Exact vector lookup; validation only, detection uses [`Self::detect`]
    pub fn index_for_vector(&self, vector: Complex64) -> Option<usize> {
        self.vector_to_index.get(&vector_key(vector)).copied()
    }

    /// Maximum-likelihood detection: index of the nearest point
    ///
    /// Linear scan over squared Euclidean distance. Exact ties go to the
    /// lowest index. This is the simulator's inner loop; a coarse
    /// angular partition would be the next step if M grows large.
    pub fn detect(&self, received: Complex64) -> usize {
        let mut best_index = 0;
        let mut best_distance = f64::INFINITY;
        for point in &self.points {
            let distance = (received - point.vector).norm_sqr();
            if distance < best_distance {
                best_distance = distance;
                best_index = point.index;
            }
        }
        best_index
    }
}
