//! Odometry-based motion model.
//!
//! Implements the standard odometry motion model from Probabilistic
//! Robotics (Thrun et al.): motion between two odometry poses is
//! decomposed into an initial rotation, a translation, and a final
//! rotation, each perturbed with zero-mean Gaussian noise whose
//! variance grows with the motion itself.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::math::sample_normal;
use crate::core::types::{Control, Pose2D};
use crate::error::{Result, SlamError};

/// Configuration for the odometry motion model.
///
/// The alpha parameters scale noise variance by the squared motion
/// components:
/// - `alpha1`: rotation noise from rotation
/// - `alpha2`: rotation noise from translation
/// - `alpha3`: translation noise from translation
/// - `alpha4`: translation noise from rotation
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MotionModelConfig {
    /// Rotation noise from rotation.
    /// Typical: 0.05-0.2 for differential drive.
    pub alpha1: f32,

    /// Rotation noise from translation.
    pub alpha2: f32,

    /// Translation noise from translation.
    pub alpha3: f32,

    /// Translation noise from rotation.
    pub alpha4: f32,
}

impl Default for MotionModelConfig {
    fn default() -> Self {
        // Conservative defaults for an indoor differential drive robot
        Self {
            alpha1: 0.1,
            alpha2: 0.05,
            alpha3: 0.1,
            alpha4: 0.05,
        }
    }
}

impl MotionModelConfig {
    /// Create a low-noise configuration (high quality encoders).
    pub fn low_noise() -> Self {
        Self {
            alpha1: 0.02,
            alpha2: 0.01,
            alpha3: 0.02,
            alpha4: 0.01,
        }
    }

    /// Create a high-noise configuration (slippery floors, poor encoders).
    pub fn high_noise() -> Self {
        Self {
            alpha1: 0.25,
            alpha2: 0.12,
            alpha3: 0.25,
            alpha4: 0.12,
        }
    }

    /// Check parameter constraints.
    pub fn validate(&self) -> Result<()> {
        let all = [self.alpha1, self.alpha2, self.alpha3, self.alpha4];
        if all.iter().any(|a| !a.is_finite() || *a < 0.0) {
            return Err(SlamError::Config(format!(
                "motion noise coefficients must be non-negative, got {:?}",
                all
            )));
        }
        Ok(())
    }
}

/// Odometry motion model for sampling particle poses.
#[derive(Debug, Clone)]
pub struct MotionModel {
    config: MotionModelConfig,
}

impl MotionModel {
    /// Create a new motion model with the given configuration.
    pub fn new(config: MotionModelConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Get the configuration.
    pub fn config(&self) -> &MotionModelConfig {
        &self.config
    }

    /// Sample a new pose for a particle at `pose` given the odometry pair.
    ///
    /// A still control returns `pose` unchanged. Otherwise the odometry
    /// delta is decomposed into `(rot1, trans, rot2)`, each component is
    /// perturbed, and the noisy motion is applied relative to the
    /// particle's own heading.
    pub fn sample<R: Rng>(&self, control: &Control, pose: &Pose2D, rng: &mut R) -> Pose2D {
        if control.is_still() {
            return *pose;
        }

        let dx = control.current.x - control.last.x;
        let dy = control.current.y - control.last.y;
        let rot1 = dy.atan2(dx) - control.last.theta;
        let trans = (dx * dx + dy * dy).sqrt();
        let rot2 = control.current.theta - control.last.theta - rot1;

        let a = &self.config;
        let rot1_hat = sample_normal(rng, rot1, a.alpha1 * rot1 * rot1 + a.alpha2 * trans * trans);
        let trans_hat = sample_normal(
            rng,
            trans,
            a.alpha3 * trans * trans + a.alpha4 * (rot1 * rot1 + rot2 * rot2),
        );
        let rot2_hat = sample_normal(rng, rot2, a.alpha1 * rot2 * rot2 + a.alpha2 * trans * trans);

        // Advance along the particle's heading turned by rot1, then
        // apply the final rotation in place.
        let heading = pose.theta + rot1_hat;
        let step = Pose2D::from_polar(trans_hat, heading);
        Pose2D::new(pose.x + step.x, pose.y + step.y, heading).offset(&Pose2D::new(0.0, 0.0, rot2_hat))
    }
}
