//! Monte-Carlo behaviour of the full simulator
//!
//! These tests check the statistical properties of experiments against
//! each other and against the numerical reference, using fixed seeds.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::*;

/// Half-width of a binomial confidence interval, in standard errors
const Z: f64 = 5.0;

fn binomial_tolerance(p: f64, n: usize) -> f64 {
    Z * (p * (1.0 - p) / n as f64).sqrt()
}

fn experiment_with_variance(
    constellation: &Constellation,
    variance: f64,
    n: usize,
    seed: u64,
) -> ExperimentResult {
    let noise = NoiseSource::new(variance).unwrap();
    Experiment::with_noise(constellation, noise, n)
        .unwrap()
        .run_parallel(seed)
}

#[test]
fn test_zero_noise_four_points() {
    let c = Constellation::new(2, 1.0, 2.0).unwrap();
    assert_eq!(c.bits_per_symbol(), 2);
    let exp = Experiment::with_noise(&c, NoiseSource::noiseless(), 1000).unwrap();
    for seed in 0..5 {
        let r = exp.run_seeded(seed);
        assert_eq!(r.ser, 0.0);
        assert_eq!(r.ber, 0.0);
    }
}

#[test]
fn test_concrete_scenario_matches_reference() {
    let c = Constellation::from_ratio(2, 0.5).unwrap();
    let exp = Experiment::new(
        &c,
        ExperimentParams {
            desired_snr_db: 0.0,
            b: 0.5,
            symbol_count: 100_000,
        },
    )
    .unwrap();
    assert!((exp.variance() - 0.625).abs() < 1e-15);

    let reference = theory::error_rates(&c, &theory::transition_probabilities(&c, 0.625).unwrap());
    let result = exp.run_parallel(2024);

    let tol = binomial_tolerance(reference.ser, 100_000);
    assert!(
        (result.ser - reference.ser).abs() < tol,
        "SER {} vs reference {} (±{})",
        result.ser,
        reference.ser,
        tol
    );
    // Bit errors per symbol are correlated, so allow a looser band
    let tol = 2.0 * binomial_tolerance(reference.ber, 100_000);
    assert!(
        (result.ber - reference.ber).abs() < tol,
        "BER {} vs reference {} (±{})",
        result.ber,
        reference.ber,
        tol
    );
}

#[test]
fn test_sequential_run_matches_reference() {
    let c = Constellation::from_ratio(4, 0.6).unwrap();
    let exp = Experiment::new(
        &c,
        ExperimentParams {
            desired_snr_db: 3.0,
            b: 0.6,
            symbol_count: 40_000,
        },
    )
    .unwrap();
    let reference = theory::error_rates(
        &c,
        &theory::transition_probabilities_with_grid(&c, exp.variance(), 401).unwrap(),
    );
    let result = exp.run_seeded(77);
    let tol = binomial_tolerance(reference.ser, 40_000);
    assert!(
        (result.ser - reference.ser).abs() < tol,
        "SER {} vs reference {} (±{})",
        result.ser,
        reference.ser,
        tol
    );
}

#[test]
fn test_error_rates_grow_with_noise() {
    let c = Constellation::from_ratio(4, 0.5).unwrap();
    let variances = [0.02, 0.08, 0.3, 1.2, 5.0];
    let results: Vec<ExperimentResult> = variances
        .iter()
        .map(|&v| experiment_with_variance(&c, v, 50_000, 31))
        .collect();

    for pair in results.windows(2) {
        assert!(
            pair[1].ser > pair[0].ser,
            "SER fell from {} to {} as noise grew",
            pair[0].ser,
            pair[1].ser
        );
        assert!(
            pair[1].ber > pair[0].ber,
            "BER fell from {} to {} as noise grew",
            pair[0].ber,
            pair[1].ber
        );
    }
}

#[test]
fn test_error_rates_fall_with_snr() {
    let sweep = Sweep::new(SweepParams {
        ring_symbols: 4,
        b: 0.5,
        snr_start_db: 0.0,
        snr_step_db: 3.0,
        steps: 4,
        symbol_count: 50_000,
        seed: 12,
        parallel: true,
    })
    .unwrap();
    let result = sweep.run().unwrap();
    for pair in result.points.windows(2) {
        assert!(pair[1].result.ser < pair[0].result.ser);
        assert!(pair[1].result.ber < pair[0].result.ber);
    }
}

#[test]
fn test_high_noise_limit() {
    // Once noise swamps the constellation the received vector no longer
    // depends on the sent symbol: P(correct) → 1/(2M) and each bit is a
    // coin flip
    for m in [2usize, 4, 8] {
        let c = Constellation::from_ratio(m, 0.5).unwrap();
        let n = 40_000;
        let r = experiment_with_variance(&c, 1e6, n, 8);
        let expected = (2 * m - 1) as f64 / (2 * m) as f64;
        let tol = binomial_tolerance(expected, n);
        assert!(
            (r.ser - expected).abs() < tol,
            "M={}: SER {} vs {} (±{})",
            m,
            r.ser,
            expected,
            tol
        );
        assert!((r.ber - 0.5).abs() < 0.02, "M={}: BER {}", m, r.ber);
    }
}

#[test]
fn test_parallel_and_sequential_agree_statistically() {
    let c = Constellation::from_ratio(8, 0.5).unwrap();
    let exp = Experiment::new(
        &c,
        ExperimentParams {
            desired_snr_db: 5.0,
            b: 0.5,
            symbol_count: 60_000,
        },
    )
    .unwrap();
    let seq = exp.run_seeded(1);
    let par = exp.run_parallel(1);
    let p = (seq.ser + par.ser) / 2.0;
    // Difference of two independent estimates
    let tol = Z * (2.0 * p * (1.0 - p) / 60_000.0).sqrt();
    assert!(
        (seq.ser - par.ser).abs() < tol,
        "sequential {} vs parallel {} (±{})",
        seq.ser,
        par.ser,
        tol
    );
}

#[test]
fn test_detected_labels_follow_geometry() {
    // With alternating rings the closest points to index i are i ± 1
    let c = Constellation::from_ratio(4, 0.7).unwrap();
    let noise = NoiseSource::new(0.03).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let mut neighbour_errors = 0usize;
    let mut errors = 0usize;
    for _ in 0..40_000 {
        let event = TransmissionEvent::generate(&c, &noise, &mut rng);
        if event.symbol_error() {
            errors += 1;
            let order = c.order();
            let diff = (event.detected_index() + order - event.original_index()) % order;
            if diff == 1 || diff == order - 1 {
                neighbour_errors += 1;
            }
        }
    }
    assert!(errors > 0);
    assert!(
        neighbour_errors as f64 / errors as f64 > 0.9,
        "{} of {} errors went to angular neighbours",
        neighbour_errors,
        errors
    );
}
