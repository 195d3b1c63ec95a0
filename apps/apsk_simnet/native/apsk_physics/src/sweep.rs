//! SNR sweeps for one or more ring ratios
//!
//! A [`Sweep`] fixes b, builds the constellation once and runs one
//! experiment per SNR step. A [`SweepPlan`] repeats that for several
//! (b, starting SNR) pairs. Every parameter is validated when the sweep is
//! built, so a bad SNR at the end of a range fails before any sampling.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::constellation::Constellation;
use crate::error::{ConfigurationError, Result};
use crate::experiment::{noise_variance_for_snr, Experiment, ExperimentParams, ExperimentResult};

/// SNR steps per sweep
pub const DEFAULT_STEPS: usize = 10;

/// SNR increment between steps, dB
pub const DEFAULT_SNR_STEP_DB: f64 = 0.25;

/// Parameters for one b
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepParams {
    pub ring_symbols: usize,
    pub b: f64,
    pub snr_start_db: f64,
    pub snr_step_db: f64,
    pub steps: usize,
    pub symbol_count: usize,
    pub seed: u64,
    pub parallel: bool,
}

impl Default for SweepParams {
    fn default() -> Self {
        Self {
            ring_symbols: 4,
            b: 0.5,
            snr_start_db: 0.0,
            snr_step_db: DEFAULT_SNR_STEP_DB,
            steps: DEFAULT_STEPS,
            symbol_count: 10_000,
            seed: 0,
            parallel: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    pub desired_snr_db: f64,
    pub result: ExperimentResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepResult {
    pub ring_symbols: usize,
    pub b: f64,
    pub points: Vec<SweepPoint>,
    /// Stopped early; `points` holds the completed prefix
    pub cancelled: bool,
}

/// A validated sweep over SNR for a fixed b
#[derive(Debug, Clone)]
pub struct Sweep {
    params: SweepParams,
    constellation: Constellation,
}

impl Sweep {
    /// # Errors
    /// `ConfigurationError` for an invalid constellation, step layout or
    /// symbol count, or for any SNR step whose variance is unusable.
    pub fn new(params: SweepParams) -> Result<Self> {
        if params.steps == 0 {
            return Err(ConfigurationError::InvalidSweep("steps must be positive".into()));
        }
        if !params.snr_start_db.is_finite() || !params.snr_step_db.is_finite() {
            return Err(ConfigurationError::InvalidSweep(format!(
                "SNR start {} and step {} must be finite",
                params.snr_start_db, params.snr_step_db
            )));
        }
        if params.symbol_count == 0 {
            return Err(ConfigurationError::ZeroSymbolCount);
        }
        let constellation = Constellation::from_ratio(params.ring_symbols, params.b)?;
        let sweep = Self {
            params,
            constellation,
        };
        for snr in sweep.snr_points() {
            noise_variance_for_snr(snr, params.b, sweep.constellation.bits_per_symbol())?;
        }
        Ok(sweep)
    }

    pub fn params(&self) -> &SweepParams {
        &self.params
    }

    pub fn constellation(&self) -> &Constellation {
        &self.constellation
    }

    /// Requested SNR of each step, dB
    pub fn snr_points(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.params.steps)
            .map(move |i| self.params.snr_start_db + self.params.snr_step_db * i as f64)
    }

    pub fn run(&self) -> Result<SweepResult> {
        self.run_until(|| false)
    }

    /// Run steps until `should_stop` returns true
    ///
    /// The predicate is polled before each experiment, never during one.
    pub fn run_until<F: FnMut() -> bool>(&self, mut should_stop: F) -> Result<SweepResult> {
        let mut seeds = ChaCha8Rng::seed_from_u64(self.params.seed);
        let mut points = Vec::with_capacity(self.params.steps);
        let mut cancelled = false;

        for desired_snr_db in self.snr_points() {
            if should_stop() {
                cancelled = true;
                break;
            }
            let experiment = Experiment::new(
                &self.constellation,
                ExperimentParams {
                    desired_snr_db,
                    b: self.params.b,
                    symbol_count: self.params.symbol_count,
                },
            )?;
            let seed: u64 = seeds.gen();
            let result = if self.params.parallel {
                experiment.run_parallel(seed)
            } else {
                experiment.run_seeded(seed)
            };
            points.push(SweepPoint {
                desired_snr_db,
                result,
            });
        }

        info!(
            b = self.params.b,
            ring_symbols = self.params.ring_symbols,
            completed = points.len(),
            cancelled,
            "sweep finished"
        );

        Ok(SweepResult {
            ring_symbols: self.params.ring_symbols,
            b: self.params.b,
            points,
            cancelled,
        })
    }
}

/// One (b, starting SNR) pair of a plan
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatioSweep {
    pub b: f64,
    pub snr_start_db: f64,
}

/// Sweeps across several ring ratios sharing M, N and step layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepPlan {
    pub ring_symbols: usize,
    pub symbol_count: usize,
    pub seed: u64,
    pub steps: usize,
    pub snr_step_db: f64,
    pub parallel: bool,
    pub pairs: Vec<RatioSweep>,
}

impl Default for SweepPlan {
    fn default() -> Self {
        let base = SweepParams::default();
        Self {
            ring_symbols: base.ring_symbols,
            symbol_count: base.symbol_count,
            seed: base.seed,
            steps: base.steps,
            snr_step_db: base.snr_step_db,
            parallel: base.parallel,
            pairs: [0.3, 0.4, 0.5, 0.6, 0.7]
                .iter()
                .map(|&b| RatioSweep { b, snr_start_db: 0.0 })
                .collect(),
        }
    }
}

impl SweepPlan {
    /// Build and validate every sweep of the plan
    ///
    /// Each pair gets its own seed drawn from the plan seed.
    pub fn sweeps(&self) -> Result<Vec<Sweep>> {
        if self.pairs.is_empty() {
            return Err(ConfigurationError::InvalidSweep("plan has no (b, SNR) pairs".into()));
        }
        let mut seeds = ChaCha8Rng::seed_from_u64(self.seed);
        self.pairs
            .iter()
            .map(|pair| {
                Sweep::new(SweepParams {
                    ring_symbols: self.ring_symbols,
                    b: pair.b,
                    snr_start_db: pair.snr_start_db,
                    snr_step_db: self.snr_step_db,
                    steps: self.steps,
                    symbol_count: self.symbol_count,
                    seed: seeds.gen(),
                    parallel: self.parallel,
                })
            })
            .collect()
    }

    pub fn run(&self) -> Result<Vec<SweepResult>> {
        self.sweeps()?.iter().map(Sweep::run).collect()
    }
}
