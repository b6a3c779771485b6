//! Generic particle filter core.
//!
//! Owns the importance weights and the resampling machinery; what a
//! particle *is* stays opaque. Prediction and weighting take the model
//! as a closure so the same filter drives plain pose particles in tests
//! and ancestry-tree handles in the full estimator.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SlamError};

/// Weight sums below this trigger a uniform reset instead of a divide.
const WEIGHT_SUM_FLOOR: f64 = 1e-10;

/// Configuration for the particle filter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ParticleFilterConfig {
    /// Number of particles.
    pub num_particles: usize,

    /// Fraction of the uniform weight below which a particle is
    /// eliminated instead of re-weighted. Typical: 0.01
    pub elimination_factor: f64,
}

impl Default for ParticleFilterConfig {
    fn default() -> Self {
        Self {
            num_particles: 100,
            elimination_factor: 0.01,
        }
    }
}

impl ParticleFilterConfig {
    /// Check parameter constraints.
    pub fn validate(&self) -> Result<()> {
        if self.num_particles == 0 {
            return Err(SlamError::Config("particle count must be at least 1".into()));
        }
        if !(self.elimination_factor.is_finite() && (0.0..1.0).contains(&self.elimination_factor)) {
            return Err(SlamError::Config(format!(
                "elimination factor must be in [0, 1), got {}",
                self.elimination_factor
            )));
        }
        Ok(())
    }
}

/// Importance weights plus predict/weight/resample over opaque particles.
#[derive(Debug, Clone)]
pub struct ParticleFilter {
    weights: Vec<f64>,
    uniform: f64,
    threshold: f64,
}

impl ParticleFilter {
    /// Create a filter with uniform weights.
    pub fn new(config: ParticleFilterConfig) -> Result<Self> {
        config.validate()?;
        let uniform = 1.0 / config.num_particles as f64;
        Ok(Self {
            weights: vec![uniform; config.num_particles],
            uniform,
            threshold: config.elimination_factor * uniform,
        })
    }

    /// Number of particles.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// True for a zero-particle filter (never constructible).
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// The uniform weight `1/n`.
    pub fn uniform_weight(&self) -> f64 {
        self.uniform
    }

    /// Current normalized weights.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Propagate every particle through the motion update.
    ///
    /// Weights are unchanged: the proposal is the motion model itself.
    pub fn predict<P>(&self, particles: &[P], mut predict_one: impl FnMut(&P) -> P) -> Vec<P> {
        assert_eq!(particles.len(), self.weights.len());
        particles.iter().map(|p| predict_one(p)).collect()
    }

    /// Fold a measurement likelihood into the weights and normalize.
    ///
    /// Particles already below the elimination floor are zeroed without
    /// evaluating the measurement. A catastrophically small weight sum
    /// resets the filter to uniform rather than dividing into noise.
    pub fn weight<P>(&mut self, particles: &[P], mut weight_one: impl FnMut(&P) -> f64) {
        assert_eq!(particles.len(), self.weights.len());

        for (w, p) in self.weights.iter_mut().zip(particles) {
            if *w > self.threshold {
                *w *= weight_one(p);
            } else {
                *w = 0.0;
            }
        }

        let sum: f64 = self.weights.iter().sum();
        if sum < WEIGHT_SUM_FLOOR {
            log::warn!(
                "weight sum collapsed to {:.3e}, resetting to uniform",
                sum
            );
            self.weights.fill(self.uniform);
        } else {
            for w in &mut self.weights {
                *w /= sum;
            }
        }
    }

    /// Effective sample size `1 / Σ wᵢ²`.
    pub fn effective_sample_size(&self) -> f64 {
        let sum_sq: f64 = self.weights.iter().map(|w| w * w).sum();
        1.0 / sum_sq
    }

    /// Systematic (low-variance) resampling.
    ///
    /// One uniform draw in `[0, 1/n)` plus evenly spaced offsets walk
    /// the cumulative weights, so a particle with weight `k/n` appears
    /// about `k` times. Weights reset to uniform afterwards.
    pub fn resample<P: Copy, R: Rng>(&mut self, particles: &[P], rng: &mut R) -> Vec<P> {
        assert_eq!(particles.len(), self.weights.len());
        let n = particles.len();

        let r = rng.random::<f64>() * self.uniform;
        let mut survivors = Vec::with_capacity(n);
        let mut cumulative = self.weights[0];
        let mut i = 0;

        for m in 0..n {
            let target = r + m as f64 * self.uniform;
            while cumulative < target && i < n - 1 {
                i += 1;
                cumulative += self.weights[i];
            }
            survivors.push(particles[i]);
        }

        self.weights.fill(self.uniform);
        survivors
    }

    /// One categorical draw by weight; returns the chosen index.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> usize {
        let total: f64 = self.weights.iter().sum();
        let target = rng.random::<f64>() * total;

        let mut cumulative = 0.0;
        for (i, w) in self.weights.iter().enumerate() {
            cumulative += w;
            if cumulative >= target {
                return i;
            }
        }
        self.weights.len() - 1
    }
}
