//! Beam-based sensor model.
//!
//! Scores a laser scan against a particle's map by casting each sampled
//! beam through the grid: the first occupied cell along the beam gives
//! the expected range, and the measured range is scored under a
//! Gaussian centered there. The same ray geometry also emits the
//! free/occupied cell updates the mapping side records.
//!
//! Each particle carries its own map, so there is nothing to precompute
//! per scan; every evaluation is a fresh ray walk against that
//! particle's view of the world.

use serde::{Deserialize, Serialize};

use crate::algorithms::mapping::{trace, CellState};
use crate::core::math::prob_normal;
use crate::core::types::{LaserScan, Point2D, Pose2D};
use crate::error::{Result, SlamError};

/// Floor applied to each beam's likelihood so a single unlucky beam
/// cannot zero out a particle's weight.
const LIKELIHOOD_FLOOR: f64 = 1e-6;

/// Configuration for the beam model.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BeamModelConfig {
    /// Range noise variance (world units squared).
    /// Typical: 0.01-0.05 for a planar laser.
    pub variance: f32,

    /// Maximum sensor range (world units).
    pub max_range: f32,

    /// Number of beams actually evaluated per scan.
    ///
    /// Must divide `scan_size`; the evaluated subset rotates across
    /// steps so every beam is eventually used.
    pub samples: usize,

    /// Number of beams in a full scan.
    pub scan_size: usize,
}

impl Default for BeamModelConfig {
    fn default() -> Self {
        Self {
            variance: 0.01,
            max_range: 8.0,
            samples: 60,
            scan_size: 360,
        }
    }
}

impl BeamModelConfig {
    /// Create a fast configuration (fewer beams per update).
    pub fn fast() -> Self {
        Self {
            samples: 36,
            ..Default::default()
        }
    }

    /// Create a high-quality configuration (denser beam coverage).
    pub fn high_quality() -> Self {
        Self {
            samples: 120,
            variance: 0.005,
            ..Default::default()
        }
    }

    /// Check parameter constraints.
    pub fn validate(&self) -> Result<()> {
        if !(self.variance.is_finite() && self.variance > 0.0) {
            return Err(SlamError::Config(format!(
                "range variance must be positive, got {}",
                self.variance
            )));
        }
        if !(self.max_range.is_finite() && self.max_range > 0.0) {
            return Err(SlamError::Config(format!(
                "max range must be positive, got {}",
                self.max_range
            )));
        }
        if self.samples == 0 || self.scan_size == 0 {
            return Err(SlamError::Config(
                "scan size and sample count must be at least 1".into(),
            ));
        }
        if self.scan_size % self.samples != 0 {
            return Err(SlamError::Config(format!(
                "sample count {} must divide scan size {}",
                self.samples, self.scan_size
            )));
        }
        Ok(())
    }
}

/// Beam model over a cell-lookup view of one particle's map.
#[derive(Debug, Clone)]
pub struct BeamModel {
    config: BeamModelConfig,
    /// Beams between consecutive evaluated beams.
    stride: usize,
    /// Angle between consecutive beams in the scan.
    angle_increment: f32,
    /// First evaluated beam index, rotated by [`BeamModel::advance`].
    start_index: usize,
}

impl BeamModel {
    /// Create a new beam model with the given configuration.
    pub fn new(config: BeamModelConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            stride: config.scan_size / config.samples,
            angle_increment: std::f32::consts::TAU / config.scan_size as f32,
            start_index: 0,
        })
    }

    /// Get the configuration.
    pub fn config(&self) -> &BeamModelConfig {
        &self.config
    }

    /// First beam index the next evaluation will use.
    pub fn start_index(&self) -> usize {
        self.start_index
    }

    /// Likelihood of one measured range along a world-frame direction.
    ///
    /// Casts from `pose` out to `max_range`; the first cell `lookup`
    /// reports occupied defines the expected hit at that cell's center.
    /// A ray that sees no occupancy returns 1.0: an unmapped direction
    /// is no evidence either way.
    pub fn prob_ray<L>(&self, pose: &Pose2D, range: f32, world_angle: f32, lookup: &mut L) -> f64
    where
        L: FnMut(i32, i32) -> bool,
    {
        let origin = pose.position();
        let (sin_a, cos_a) = world_angle.sin_cos();
        let target = Point2D::new(
            origin.x + self.config.max_range * cos_a,
            origin.y + self.config.max_range * sin_a,
        );

        let mut expected = None;
        trace(origin, target, |cx, cy, _| {
            if lookup(cx, cy) {
                let center = Point2D::new(cx as f32 + 0.5, cy as f32 + 0.5);
                expected = Some(origin.distance(&center));
                true
            } else {
                false
            }
        });

        match expected {
            Some(expected_range) => prob_normal(range, expected_range, self.config.variance),
            None => 1.0,
        }
    }

    /// Likelihood of a full scan for a particle at `pose`.
    ///
    /// Multiplies the floored per-beam likelihoods over the currently
    /// sampled beam subset. Beams with no return or readings beyond the
    /// sensor range contribute nothing.
    pub fn prob<L>(&self, pose: &Pose2D, scan: &LaserScan, mut lookup: L) -> f64
    where
        L: FnMut(i32, i32) -> bool,
    {
        assert_eq!(
            scan.len(),
            self.config.scan_size,
            "scan length does not match configured scan size"
        );

        let mut likelihood = 1.0;
        let mut i = self.start_index;
        while i < scan.len() {
            let range = scan.range(i);
            if range > 0.0 && range <= self.config.max_range {
                let angle = pose.theta + i as f32 * self.angle_increment;
                likelihood *= self
                    .prob_ray(pose, range, angle, &mut lookup)
                    .max(LIKELIHOOD_FLOOR);
            }
            i += self.stride;
        }
        likelihood
    }

    /// Emit the cell updates one scan implies for a particle at `pose`.
    ///
    /// For every sampled beam with a return, each cell between the
    /// sensor and the hit is reported free and the terminal cell
    /// occupied.
    pub fn update<W>(&self, pose: &Pose2D, scan: &LaserScan, mut writer: W)
    where
        W: FnMut(CellState, i32, i32),
    {
        assert_eq!(
            scan.len(),
            self.config.scan_size,
            "scan length does not match configured scan size"
        );

        let origin = pose.position();
        let mut i = self.start_index;
        while i < scan.len() {
            let range = scan.range(i);
            if range > 0.0 && range <= self.config.max_range {
                let angle = pose.theta + i as f32 * self.angle_increment;
                let (sin_a, cos_a) = angle.sin_cos();
                let end = Point2D::new(origin.x + range * cos_a, origin.y + range * sin_a);

                trace(origin, end, |cx, cy, remaining| {
                    let state = if remaining == 0 {
                        CellState::Occupied
                    } else {
                        CellState::Free
                    };
                    writer(state, cx, cy);
                    false
                });
            }
            i += self.stride;
        }
    }

    /// Rotate the evaluated beam subset by one.
    ///
    /// Successive steps sweep through all beam offsets, so interleaved
    /// evaluation covers the full scan over `scan_size / samples` steps.
    pub fn advance(&mut self) {
        self.start_index = (self.start_index + 1) % self.stride;
    }
}
