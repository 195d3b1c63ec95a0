//! One transmitted symbol through the AWGN channel
//!
//! A random constellation index is sent, two independent noise draws are
//! added (real, then imaginary) and the receiver picks the nearest point.

use num_complex::Complex64;
use rand::Rng;

use crate::constellation::Constellation;
use crate::noise::NoiseSource;

/// A single transmit/detect outcome, immutable once detected
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransmissionEvent {
    original_index: usize,
    original_vector: Complex64,
    received_vector: Complex64,
    detected_index: usize,
}

impl TransmissionEvent {
    /// Send a uniformly drawn symbol through `noise` and detect it
    pub fn generate<R: Rng + ?Sized>(
        constellation: &Constellation,
        noise: &NoiseSource,
        rng: &mut R,
    ) -> Self {
        let original_index = rng.gen_range(0..constellation.order());
        let original_vector = constellation.points()[original_index].vector;
        let re = noise.sample(rng);
        let im = noise.sample(rng);
        Self::observe(constellation, original_index, original_vector + Complex64::new(re, im))
    }

    /// Detect a caller-supplied received vector for a known sent index
    ///
    /// # Panics
    /// If `original_index` is not a point of `constellation`.
    pub fn observe(constellation: &Constellation, original_index: usize, received: Complex64) -> Self {
        let original_vector = constellation.points()[original_index].vector;
        Self {
            original_index,
            original_vector,
            received_vector: received,
            detected_index: constellation.detect(received),
        }
    }

    pub fn original_index(&self) -> usize {
        self.original_index
    }

    pub fn original_vector(&self) -> Complex64 {
        self.original_vector
    }

    pub fn received_vector(&self) -> Complex64 {
        self.received_vector
    }

    pub fn detected_index(&self) -> usize {
        self.detected_index
    }

    pub fn symbol_error(&self) -> bool {
        self.detected_index != self.original_index
    }

    /// Hamming distance between sent and detected labels
    pub fn bit_errors(&self, constellation: &Constellation) -> u32 {
        if !self.symbol_error() {
            return 0;
        }
        let points = constellation.points();
        points[self.original_index]
            .label
            .hamming_distance(&points[self.detected_index].label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_noiseless_events_are_correct() {
        let c = Constellation::new(4, 1.0, 2.0).unwrap();
        let noise = NoiseSource::noiseless();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..500 {
            let event = TransmissionEvent::generate(&c, &noise, &mut rng);
            assert_eq!(event.received_vector(), event.original_vector());
            assert_eq!(event.detected_index(), event.original_index());
            assert!(!event.symbol_error());
            assert_eq!(event.bit_errors(&c), 0);
        }
    }

    #[test]
    fn test_indices_are_uniform() {
        let c = Constellation::new(4, 1.0, 2.0).unwrap();
        let noise = NoiseSource::noiseless();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let n = 80000;
        let mut counts = vec![0usize; c.order()];
        for _ in 0..n {
            counts[TransmissionEvent::generate(&c, &noise, &mut rng).original_index()] += 1;
        }
        let expected = n as f64 / c.order() as f64;
        for (i, &count) in counts.iter().enumerate() {
            assert!(
                (count as f64 - expected).abs() / expected < 0.05,
                "index {} drawn {} times, expected ~{}",
                i,
                count,
                expected
            );
        }
    }

    #[test]
    fn test_bit_errors_are_hamming_distance() {
        // 4 points: 00 at 0°, 01 at 90°, 10 at 180°, 11 at 270°
        let c = Constellation::new(2, 1.0, 2.0).unwrap();

        // Sent 00, received next to 11
        let event = TransmissionEvent::observe(&c, 0, Complex64::new(0.0, -2.1));
        assert_eq!(event.detected_index(), 3);
        assert!(event.symbol_error());
        assert_eq!(event.bit_errors(&c), 2);

        // Sent 00, received next to 01
        let event = TransmissionEvent::observe(&c, 0, Complex64::new(0.1, 1.9));
        assert_eq!(event.detected_index(), 1);
        assert_eq!(event.bit_errors(&c), 1);

        // Sent 01, received next to 10
        let event = TransmissionEvent::observe(&c, 1, Complex64::new(-1.0, 0.0));
        assert_eq!(event.detected_index(), 2);
        assert_eq!(event.bit_errors(&c), 2);
    }

    #[test]
    fn test_generate_is_reproducible() {
        let c = Constellation::new(8, 1.0, 1.5).unwrap();
        let noise = NoiseSource::new(0.3).unwrap();
        let mut rng1 = ChaCha8Rng::seed_from_u64(99);
        let mut rng2 = ChaCha8Rng::seed_from_u64(99);
        for _ in 0..200 {
            assert_eq!(
                TransmissionEvent::generate(&c, &noise, &mut rng1),
                TransmissionEvent::generate(&c, &noise, &mut rng2)
            );
        }
    }
}
