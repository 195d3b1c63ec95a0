//! Records exchanged with Elixir
//!
//! Mirrors of the core parameter/result records with BEAM-friendly integer
//! widths. Conversions into core types fail on values that do not fit.

use rustler::NifStruct;

use apsk_physics as sim;

/// Experiment parameters from Elixir
#[derive(NifStruct, Debug, Clone)]
#[module = "ApskSimnet.Physics.Types.ExperimentParams"]
pub struct ExperimentParams {
    pub desired_snr_db: f64,
    pub b: f64,
    pub symbol_count: u64,
    pub seed: u64,
    pub parallel: bool,
}

impl ExperimentParams {
    pub fn to_core(&self) -> Result<sim::ExperimentParams, String> {
        Ok(sim::ExperimentParams {
            desired_snr_db: self.desired_snr_db,
            b: self.b,
            symbol_count: to_usize(self.symbol_count, "symbol_count")?,
        })
    }
}

#[derive(NifStruct, Debug, Clone)]
#[module = "ApskSimnet.Physics.Types.ExperimentResult"]
pub struct ExperimentResult {
    pub snr: f64,
    pub ser: f64,
    pub ber: f64,
    pub variance: f64,
    pub symbol_count: u64,
    pub symbol_errors: u64,
    pub bit_errors: u64,
}

impl From<sim::ExperimentResult> for ExperimentResult {
    fn from(r: sim::ExperimentResult) -> Self {
        Self {
            snr: r.snr,
            ser: r.ser,
            ber: r.ber,
            variance: r.variance,
            symbol_count: r.symbol_count,
            symbol_errors: r.symbol_errors,
            bit_errors: r.bit_errors,
        }
    }
}

#[derive(NifStruct, Debug, Clone)]
#[module = "ApskSimnet.Physics.Types.SweepParams"]
pub struct SweepParams {
    pub ring_symbols: u64,
    pub b: f64,
    pub snr_start_db: f64,
    pub snr_step_db: f64,
    pub steps: u64,
    pub symbol_count: u64,
    pub seed: u64,
    pub parallel: bool,
}

impl SweepParams {
    pub fn to_core(&self) -> Result<sim::SweepParams, String> {
        Ok(sim::SweepParams {
            ring_symbols: to_usize(self.ring_symbols, "ring_symbols")?,
            b: self.b,
            snr_start_db: self.snr_start_db,
            snr_step_db: self.snr_step_db,
            steps: to_usize(self.steps, "steps")?,
            symbol_count: to_usize(self.symbol_count, "symbol_count")?,
            seed: self.seed,
            parallel: self.parallel,
        })
    }
}

#[derive(NifStruct, Debug, Clone)]
#[module = "ApskSimnet.Physics.Types.SweepPoint"]
pub struct SweepPoint {
    pub desired_snr_db: f64,
    pub result: ExperimentResult,
}

impl From<sim::SweepPoint> for SweepPoint {
    fn from(p: sim::SweepPoint) -> Self {
        Self {
            desired_snr_db: p.desired_snr_db,
            result: p.result.into(),
        }
    }
}

/// Constellation summary for plotting and telemetry
#[derive(NifStruct, Debug, Clone)]
#[module = "ApskSimnet.Physics.Types.ConstellationInfo"]
pub struct ConstellationInfo {
    pub ring_symbols: u64,
    pub order: u64,
    pub bits_per_symbol: u32,
    pub inner_radius: f64,
    pub outer_radius: f64,
    pub b: f64,
    pub average_symbol_power: f64,
    pub total_power: f64,
}

impl From<&sim::Constellation> for ConstellationInfo {
    fn from(c: &sim::Constellation) -> Self {
        Self {
            ring_symbols: c.ring_symbols() as u64,
            order: c.order() as u64,
            bits_per_symbol: c.bits_per_symbol(),
            inner_radius: c.inner_radius(),
            outer_radius: c.outer_radius(),
            b: c.ratio(),
            average_symbol_power: c.average_symbol_power(),
            total_power: c.total_power(),
        }
    }
}

/// (index, re, im, label)
pub type PointTuple = (u64, f64, f64, String);

pub fn point_tuple(p: &sim::ConstellationPoint) -> PointTuple {
    (p.index as u64, p.vector.re, p.vector.im, p.label.to_string())
}

fn to_usize(value: u64, field: &str) -> Result<usize, String> {
    usize::try_from(value).map_err(|_| format!("{} out of range: {}", field, value))
}
