//! SER/BER experiment at one SNR point
//!
//! The noise variance for a requested SNR comes from a closed form that
//! assumes an inner radius of 1 and an outer radius of 1/b:
//!
//! variance = (1 + (1/b)²) / (4 · k · 10^(SNR/10))
//!
//! The achieved SNR is then recomputed from the real constellation and
//! noise powers and reported next to SER and BER.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::constellation::Constellation;
use crate::error::{ConfigurationError, Result};
use crate::noise::NoiseSource;
use crate::symbol::TransmissionEvent;
use crate::utils::{db_to_power_ratio, power_ratio_to_db};

/// Events per parallel work item; each item owns one RNG stream
pub const PARALLEL_CHUNK: usize = 4096;

/// Relative tolerance when matching a constellation's ratio against b
const RATIO_TOLERANCE: f64 = 1e-9;

/// Experiment inputs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentParams {
    pub desired_snr_db: f64,
    /// Inner / outer ring ratio
    pub b: f64,
    pub symbol_count: usize,
}

impl Default for ExperimentParams {
    fn default() -> Self {
        Self {
            desired_snr_db: 0.0,
            b: 0.5,
            symbol_count: 10_000,
        }
    }
}

/// Experiment outputs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExperimentResult {
    /// Achieved SNR in dB
    pub snr: f64,
    pub ser: f64,
    pub ber: f64,
    /// Per-axis noise variance used
    pub variance: f64,
    pub symbol_count: u64,
    pub symbol_errors: u64,
    pub bit_errors: u64,
}

/// Order-independent error tally
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct ErrorCounts {
    symbols: u64,
    symbol_errors: u64,
    bit_errors: u64,
}

impl ErrorCounts {
    fn record(&mut self, event: &TransmissionEvent, constellation: &Constellation) {
        self.symbols += 1;
        if event.symbol_error() {
            self.symbol_errors += 1;
            self.bit_errors += u64::from(event.bit_errors(constellation));
        }
    }

    fn merge(self, other: Self) -> Self {
        Self {
            symbols: self.symbols + other.symbols,
            symbol_errors: self.symbol_errors + other.symbol_errors,
            bit_errors: self.bit_errors + other.bit_errors,
        }
    }
}

/// Noise variance that yields `desired_snr_db` for ring ratio `b`
///
/// # Errors
/// `InvalidRatio` for a non-positive or non-finite `b`, `InvalidVariance`
/// when the SNR is extreme enough to make the variance zero or infinite.
pub fn noise_variance_for_snr(desired_snr_db: f64, b: f64, bits_per_symbol: u32) -> Result<f64> {
    if !(b.is_finite() && b > 0.0) {
        return Err(ConfigurationError::InvalidRatio(b));
    }
    let outer = 1.0 / b;
    let variance =
        (1.0 + outer.powi(2)) / (4.0 * f64::from(bits_per_symbol) * db_to_power_ratio(desired_snr_db));
    if !(variance.is_finite() && variance > 0.0) {
        return Err(ConfigurationError::InvalidVariance(variance));
    }
    Ok(variance)
}

/// One validated experiment, ready to run
#[derive(Debug, Clone)]
pub struct Experiment<'a> {
    constellation: &'a Constellation,
    noise: NoiseSource,
    symbol_count: usize,
    achieved_snr_db: f64,
}

impl<'a> Experiment<'a> {
    /// Validate inputs and derive the noise for `params.desired_snr_db`
    ///
    /// # Errors
    /// `ConfigurationError` for a zero symbol count, an invalid `b`, a
    /// constellation whose ratio differs from `b`, or an SNR whose
    /// variance is not a positive finite number.
    pub fn new(constellation: &'a Constellation, params: ExperimentParams) -> Result<Self> {
        if params.symbol_count == 0 {
            return Err(ConfigurationError::ZeroSymbolCount);
        }
        let variance = noise_variance_for_snr(
            params.desired_snr_db,
            params.b,
            constellation.bits_per_symbol(),
        )?;
        let ratio = constellation.ratio();
        if (ratio - params.b).abs() > RATIO_TOLERANCE * params.b {
            return Err(ConfigurationError::RatioMismatch {
                constellation: ratio,
                requested: params.b,
            });
        }
        debug!(
            desired_snr_db = params.desired_snr_db,
            b = params.b,
            variance,
            "derived noise variance"
        );
        let noise = NoiseSource::new(variance)?;
        Self::with_noise(constellation, noise, params.symbol_count)
    }

    /// Experiment over an explicit noise source
    pub fn with_noise(
        constellation: &'a Constellation,
        noise: NoiseSource,
        symbol_count: usize,
    ) -> Result<Self> {
        if symbol_count == 0 {
            return Err(ConfigurationError::ZeroSymbolCount);
        }
        let achieved_snr_db = power_ratio_to_db(
            constellation.average_symbol_power()
                / (f64::from(constellation.bits_per_symbol()) * noise.power()),
        );
        Ok(Self {
            constellation,
            noise,
            symbol_count,
            achieved_snr_db,
        })
    }

    pub fn constellation(&self) -> &Constellation {
        self.constellation
    }

    pub fn noise(&self) -> &NoiseSource {
        &self.noise
    }

    pub fn variance(&self) -> f64 {
        self.noise.variance()
    }

    pub fn symbol_count(&self) -> usize {
        self.symbol_count
    }

    /// +inf for a silent channel
    pub fn achieved_snr_db(&self) -> f64 {
        self.achieved_snr_db
    }

    /// Run all events sequentially on `rng`
    pub fn run<R: Rng + ?Sized>(&self, rng: &mut R) -> ExperimentResult {
        let counts = self.count_events(rng, self.symbol_count);
        self.finish(counts)
    }

    /// Sequential run on a fresh `ChaCha8Rng`
    pub fn run_seeded(&self, seed: u64) -> ExperimentResult {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        self.run(&mut rng)
    }

    /// Run on the rayon pool
    ///
    /// Work is cut into fixed chunks of [`PARALLEL_CHUNK`] events and
    /// chunk c draws from stream c of `ChaCha8Rng::seed_from_u64(seed)`.
    /// The result depends only on `seed`, never on thread count.
    pub fn run_parallel(&self, seed: u64) -> ExperimentResult {
        let chunks = self.symbol_count.div_ceil(PARALLEL_CHUNK);
        let counts = (0..chunks)
            .into_par_iter()
            .map(|chunk| {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                rng.set_stream(chunk as u64);
                let start = chunk * PARALLEL_CHUNK;
                let len = PARALLEL_CHUNK.min(self.symbol_count - start);
                self.count_events(&mut rng, len)
            })
            .reduce(ErrorCounts::default, ErrorCounts::merge);
        self.finish(counts)
    }

    fn count_events<R: Rng + ?Sized>(&self, rng: &mut R, events: usize) -> ErrorCounts {
        let mut counts = ErrorCounts::default();
        for _ in 0..events {
            let event = TransmissionEvent::generate(self.constellation, &self.noise, rng);
            counts.record(&event, self.constellation);
        }
        counts
    }

    fn finish(&self, counts: ErrorCounts) -> ExperimentResult {
        let n = counts.symbols as f64;
        let bits = n * f64::from(self.constellation.bits_per_symbol());
        let result = ExperimentResult {
            snr: self.achieved_snr_db,
            ser: counts.symbol_errors as f64 / n,
            ber: counts.bit_errors as f64 / bits,
            variance: self.noise.variance(),
            symbol_count: counts.symbols,
            symbol_errors: counts.symbol_errors,
            bit_errors: counts.bit_errors,
        };
        info!(
            ber = result.ber,
            ser = result.ser,
            snr = result.snr,
            symbols = result.symbol_count,
            "experiment complete"
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(desired_snr_db: f64, b: f64, symbol_count: usize) -> ExperimentParams {
        ExperimentParams {
            desired_snr_db,
            b,
            symbol_count,
        }
    }

    #[test]
    fn test_variance_formula() {
        // (1 + 4) / (4 × 2 × 1)
        let v = noise_variance_for_snr(0.0, 0.5, 2).unwrap();
        assert!((v - 0.625).abs() < 1e-15, "variance {}", v);

        // (1 + 1) / (4 × 3 × 10)
        let v = noise_variance_for_snr(10.0, 1.0, 3).unwrap();
        assert!((v - 2.0 / 120.0).abs() < 1e-15, "variance {}", v);
    }

    #[test]
    fn test_concrete_variance() {
        let c = Constellation::from_ratio(2, 0.5).unwrap();
        let exp = Experiment::new(&c, params(0.0, 0.5, 100_000)).unwrap();
        assert!((exp.variance() - 0.625).abs() < 1e-15);
        assert!((exp.noise().power() - 1.25).abs() < 1e-15);
    }

    #[test]
    fn test_achieved_snr_matches_target_for_unit_inner_radius() {
        for m in [1, 2, 4, 8] {
            for b in [0.2, 0.5, 0.8] {
                for snr in [-5.0, 0.0, 3.5, 12.0] {
                    let c = Constellation::from_ratio(m, b).unwrap();
                    let exp = Experiment::new(&c, params(snr, b, 10)).unwrap();
                    assert!(
                        (exp.achieved_snr_db() - snr).abs() < 1e-9,
                        "M={} b={} snr={} achieved={}",
                        m,
                        b,
                        snr,
                        exp.achieved_snr_db()
                    );
                }
            }
        }
    }

    #[test]
    fn test_achieved_snr_reflects_real_radii() {
        // Same ratio, doubled radii: 4x the signal power, +6.02 dB
        let c = Constellation::new(2, 2.0, 4.0).unwrap();
        let exp = Experiment::new(&c, params(0.0, 0.5, 10)).unwrap();
        assert!((exp.achieved_snr_db() - 10.0 * 4.0_f64.log10()).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_invalid_inputs() {
        let c = Constellation::from_ratio(2, 0.5).unwrap();
        assert_eq!(
            Experiment::new(&c, params(0.0, 0.5, 0)).unwrap_err(),
            ConfigurationError::ZeroSymbolCount
        );
        assert!(matches!(
            Experiment::new(&c, params(0.0, 0.0, 10)),
            Err(ConfigurationError::InvalidRatio(_))
        ));
        assert!(matches!(
            Experiment::new(&c, params(0.0, -0.5, 10)),
            Err(ConfigurationError::InvalidRatio(_))
        ));
        assert!(matches!(
            Experiment::new(&c, params(0.0, 0.25, 10)),
            Err(ConfigurationError::RatioMismatch { .. })
        ));
        assert!(matches!(
            Experiment::new(&c, params(5000.0, 0.5, 10)),
            Err(ConfigurationError::InvalidVariance(_))
        ));
        assert!(matches!(
            Experiment::new(&c, params(-5000.0, 0.5, 10)),
            Err(ConfigurationError::InvalidVariance(_))
        ));
        assert!(matches!(
            Experiment::new(&c, params(f64::NAN, 0.5, 10)),
            Err(ConfigurationError::InvalidVariance(_))
        ));
    }

    #[test]
    fn test_zero_noise_scenario() {
        let c = Constellation::new(2, 1.0, 2.0).unwrap();
        let exp = Experiment::with_noise(&c, NoiseSource::noiseless(), 1000).unwrap();
        assert!(exp.achieved_snr_db().is_infinite());

        let result = exp.run_seeded(1);
        assert_eq!(result.ser, 0.0);
        assert_eq!(result.ber, 0.0);
        assert_eq!(result.symbol_count, 1000);

        let result = exp.run_parallel(1);
        assert_eq!(result.ser, 0.0);
        assert_eq!(result.ber, 0.0);
    }

    #[test]
    fn test_rates_are_consistent_with_counts() {
        let c = Constellation::from_ratio(4, 0.5).unwrap();
        let exp = Experiment::new(&c, params(2.0, 0.5, 5000)).unwrap();
        let r = exp.run_seeded(3);
        assert_eq!(r.symbol_count, 5000);
        assert!((r.ser - r.symbol_errors as f64 / 5000.0).abs() < 1e-15);
        assert!((r.ber - r.bit_errors as f64 / 15000.0).abs() < 1e-15);
        // Each symbol error costs at least one and at most k bits
        assert!(r.bit_errors >= r.symbol_errors);
        assert!(r.bit_errors <= 3 * r.symbol_errors);
        assert!(r.ser > 0.0 && r.ser < 1.0);
    }

    #[test]
    fn test_seeded_run_is_reproducible() {
        let c = Constellation::from_ratio(4, 0.6).unwrap();
        let exp = Experiment::new(&c, params(4.0, 0.6, 3000)).unwrap();
        assert_eq!(exp.run_seeded(17), exp.run_seeded(17));
    }

    #[test]
    fn test_parallel_independent_of_thread_count() {
        let c = Constellation::from_ratio(8, 0.5).unwrap();
        let exp = Experiment::new(&c, params(3.0, 0.5, 3 * PARALLEL_CHUNK + 123)).unwrap();

        let run_on = |threads: usize| {
            rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .unwrap()
                .install(|| exp.run_parallel(5))
        };

        let single = run_on(1);
        let multi = run_on(4);
        assert_eq!(single, multi);
        assert_eq!(single.symbol_count, (3 * PARALLEL_CHUNK + 123) as u64);
    }

    #[test]
    fn test_error_counts_merge() {
        let a = ErrorCounts {
            symbols: 10,
            symbol_errors: 2,
            bit_errors: 3,
        };
        let b = ErrorCounts {
            symbols: 5,
            symbol_errors: 1,
            bit_errors: 1,
        };
        assert_eq!(a.merge(b), b.merge(a));
        assert_eq!(a.merge(ErrorCounts::default()), a);
    }
}
