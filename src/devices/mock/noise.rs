//! Seeded randomness for sensor models

use rand::prelude::*;
use rand::rngs::SmallRng;
use rand_distr::StandardNormal;

/// Reproducible noise source shared by the simulated sensors
#[derive(Clone)]
pub struct SensorNoise {
    rng: SmallRng,
}

impl SensorNoise {
    /// Seed 0 draws from OS entropy; any other seed replays the same sequence.
    pub fn new(seed: u64) -> Self {
        let rng = match seed {
            0 => SmallRng::from_entropy(),
            s => SmallRng::seed_from_u64(s),
        };
        Self { rng }
    }

    /// Zero-mean Gaussian sample
    #[inline]
    pub fn gaussian(&mut self, stddev: f64) -> f64 {
        if !(stddev > 0.0) {
            return 0.0;
        }
        let n: f64 = self.rng.sample(StandardNormal);
        n * stddev
    }

    /// Bernoulli trial; NaN counts as never
    #[inline]
    pub fn happens(&mut self, probability: f64) -> bool {
        if !(probability > 0.0) {
            return false;
        }
        if probability >= 1.0 {
            return true;
        }
        self.rng.gen_bool(probability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = SensorNoise::new(7);
        let mut b = SensorNoise::new(7);
        for _ in 0..50 {
            assert_eq!(a.gaussian(2.0), b.gaussian(2.0));
        }
    }

    #[test]
    fn test_degenerate_probabilities() {
        let mut noise = SensorNoise::new(7);
        for _ in 0..100 {
            assert!(!noise.happens(0.0));
            assert!(!noise.happens(f64::NAN));
            assert!(noise.happens(1.0));
            assert_eq!(noise.gaussian(0.0), 0.0);
        }
    }

    #[test]
    fn test_dropout_rate_is_roughly_honoured() {
        let mut noise = SensorNoise::new(7);
        let hits = (0..10_000).filter(|_| noise.happens(0.25)).count();
        let ratio = hits as f64 / 10_000.0;
        assert_abs_diff_eq!(ratio, 0.25, epsilon = 0.03);
    }
}
