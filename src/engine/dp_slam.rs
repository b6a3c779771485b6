//! The distributed-particle SLAM estimator.
//!
//! Composes the motion model, the beam model, the particle filter, the
//! ancestry tree and the distributed map into one online estimator.
//! Each `update` runs a full predict → weight → resample/trim → map
//! write cycle; the per-particle maps stay consistent because every
//! mutation phase runs serially over the shared tree and cell store.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::algorithms::localization::{
    BeamModel, BeamModelConfig, MotionModel, MotionModelConfig, ParticleFilter,
    ParticleFilterConfig,
};
use crate::algorithms::mapping::{AncestryTree, CellState, DistributedMap, NodeId};
use crate::core::types::{Control, LaserScan, Pose2D};
use crate::error::{Result, SlamError};

/// Configuration for the estimator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DpSlamConfig {
    /// Number of particles.
    pub num_particles: usize,

    /// Resample when the effective sample size drops below this
    /// fraction of the particle count. Typical: 0.5
    pub resample_fraction: f64,

    /// Weight floor fraction below which a particle is eliminated.
    pub elimination_factor: f64,

    /// Random seed (0 for OS entropy).
    pub seed: u64,

    /// Motion model configuration.
    pub motion: MotionModelConfig,

    /// Sensor model configuration.
    pub sensor: BeamModelConfig,
}

impl Default for DpSlamConfig {
    fn default() -> Self {
        Self {
            num_particles: 100,
            resample_fraction: 0.5,
            elimination_factor: 0.01,
            seed: 0,
            motion: MotionModelConfig::default(),
            sensor: BeamModelConfig::default(),
        }
    }
}

impl DpSlamConfig {
    /// Check parameter constraints.
    ///
    /// Model-specific constraints are checked by the model constructors.
    pub fn validate(&self) -> Result<()> {
        if !(self.resample_fraction.is_finite() && (0.0..=1.0).contains(&self.resample_fraction)) {
            return Err(SlamError::Config(format!(
                "resample fraction must be in [0, 1], got {}",
                self.resample_fraction
            )));
        }
        Ok(())
    }
}

/// Estimator diagnostics, refreshed on every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct DpSlamState {
    /// Effective sample size after the last weighting.
    pub neff: f64,
    /// Whether the last update resampled.
    pub resampled: bool,
    /// Number of updates processed.
    pub iterations: u64,
}

/// One particle's view of a rectangular map region.
#[derive(Debug, Clone)]
pub struct MapSnapshot {
    /// Pose of the particle the region was sampled from.
    pub pose: Pose2D,
    /// Inclusive lower cell bounds of the region.
    pub x_min: i32,
    pub y_min: i32,
    /// Region extent in cells.
    pub width: usize,
    pub height: usize,
    cells: Vec<bool>,
}

impl MapSnapshot {
    /// Whether the cell at absolute coordinates `(cx, cy)` is occupied.
    ///
    /// Cells outside the sampled region, and cells the particle never
    /// observed, read as not occupied.
    pub fn is_occupied(&self, cx: i32, cy: i32) -> bool {
        let x = cx - self.x_min;
        let y = cy - self.y_min;
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return false;
        }
        self.cells[y as usize * self.width + x as usize]
    }

    /// Number of occupied cells in the region.
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }
}

/// Online distributed-particle SLAM.
#[derive(Debug)]
pub struct DpSlam {
    config: DpSlamConfig,
    motion: MotionModel,
    sensor: BeamModel,
    filter: ParticleFilter,
    tree: AncestryTree,
    map: DistributedMap,
    particles: Vec<NodeId>,
    rng: StdRng,
    state: DpSlamState,
}

impl DpSlam {
    /// Create an estimator with all particles at the origin.
    pub fn new(config: DpSlamConfig) -> Result<Self> {
        config.validate()?;
        let motion = MotionModel::new(config.motion)?;
        let sensor = BeamModel::new(config.sensor)?;
        let filter = ParticleFilter::new(ParticleFilterConfig {
            num_particles: config.num_particles,
            elimination_factor: config.elimination_factor,
        })?;

        let mut tree = AncestryTree::new();
        let root = tree.root();
        let particles = (0..config.num_particles)
            .map(|_| tree.spawn(root, Pose2D::identity()))
            .collect();

        let rng = if config.seed == 0 {
            StdRng::from_os_rng()
        } else {
            StdRng::seed_from_u64(config.seed)
        };

        Ok(Self {
            config,
            motion,
            sensor,
            filter,
            tree,
            map: DistributedMap::new(),
            particles,
            rng,
            state: DpSlamState::default(),
        })
    }

    /// Get the configuration.
    pub fn config(&self) -> &DpSlamConfig {
        &self.config
    }

    /// Estimator diagnostics.
    pub fn state(&self) -> &DpSlamState {
        &self.state
    }

    /// Current particle ids, one per slot.
    pub fn particles(&self) -> &[NodeId] {
        &self.particles
    }

    /// The shared ancestry tree.
    pub fn tree(&self) -> &AncestryTree {
        &self.tree
    }

    /// The shared cell store.
    pub fn map(&self) -> &DistributedMap {
        &self.map
    }

    /// Normalized particle weights, aligned with [`DpSlam::particles`].
    pub fn weights(&self) -> &[f64] {
        self.filter.weights()
    }

    /// Run one estimation step.
    ///
    /// Prediction replaces every particle with a freshly sampled child,
    /// weighting scores the scan against each particle's map, and the
    /// resampling decision drives the ancestry trim. Finally the scan's
    /// free/occupied cells are written into the map under each
    /// surviving particle's id.
    pub fn update(&mut self, control: &Control, scan: &LaserScan) {
        self.state.iterations += 1;

        // Predict: grow the tree by one generation.
        {
            let motion = &self.motion;
            let tree = &mut self.tree;
            let rng = &mut self.rng;
            self.particles = self.filter.predict(&self.particles, |&parent| {
                let pose = motion.sample(control, &tree.pose(parent), rng);
                tree.spawn(parent, pose)
            });
        }

        // Weight: read-only over the shared map.
        {
            let sensor = &self.sensor;
            let tree = &self.tree;
            let map = &self.map;
            self.filter.weight(&self.particles, |&id| {
                let pose = tree.pose(id);
                sensor.prob(&pose, scan, |cx, cy| {
                    map.lookup(cx, cy, tree, id) == CellState::Occupied
                })
            });
        }

        self.state.neff = self.filter.effective_sample_size();
        let resample_below = self.config.resample_fraction * self.particles.len() as f64;
        self.state.resampled = self.state.neff < resample_below;

        if self.state.resampled {
            log::debug!(
                "resampling: neff {:.1} below {:.1}",
                self.state.neff,
                resample_below
            );
            let mut next = self.filter.resample(&self.particles, &mut self.rng);
            for &id in &self.particles {
                self.tree.set_leaf(id, false);
            }
            for &id in &next {
                self.tree.set_leaf(id, true);
            }

            // Trim every previous particle. A fold can re-key a
            // survivor to its parent's id, so remap the new particle
            // set as we go.
            let previous = std::mem::take(&mut self.particles);
            for &old in &previous {
                if let Some(new_id) = self.tree.trim(old, &mut self.map) {
                    if new_id != old {
                        for p in next.iter_mut() {
                            if *p == old {
                                *p = new_id;
                            }
                        }
                    }
                }
            }
            self.particles = next;
        } else {
            // Everyone survives; trimming still collapses the chains
            // of interior nodes the prediction just created.
            for i in 0..self.particles.len() {
                let old = self.particles[i];
                self.particles[i] = self
                    .tree
                    .trim(old, &mut self.map)
                    .expect("live particle removed by trim");
            }
        }

        // Record the scan into each surviving particle's map view.
        {
            let sensor = &self.sensor;
            let tree = &mut self.tree;
            let map = &mut self.map;
            for &id in &self.particles {
                let pose = tree.pose(id);
                sensor.update(&pose, scan, |state, cx, cy| {
                    if map.update(state, cx, cy, tree, id) {
                        tree.add_cell(id, cx, cy);
                    }
                });
            }
        }

        self.sensor.advance();
    }

    /// Sample one particle by weight and materialize a map region.
    ///
    /// The region covers cells `x_min..x_max` × `y_min..y_max`
    /// (half-open). Occupied cells read `true`; free and unobserved
    /// cells read `false`.
    pub fn sample(&mut self, x_min: i32, x_max: i32, y_min: i32, y_max: i32) -> MapSnapshot {
        assert!(
            x_max >= x_min && y_max >= y_min,
            "region bounds must be ordered"
        );

        let id = self.particles[self.filter.sample(&mut self.rng)];
        let pose = self.tree.pose(id);

        let width = (x_max - x_min) as usize;
        let height = (y_max - y_min) as usize;
        let mut cells = vec![false; width * height];
        for cy in y_min..y_max {
            for cx in x_min..x_max {
                if self.map.lookup(cx, cy, &self.tree, id) == CellState::Occupied {
                    let idx = (cy - y_min) as usize * width + (cx - x_min) as usize;
                    cells[idx] = true;
                }
            }
        }

        MapSnapshot {
            pose,
            x_min,
            y_min,
            width,
            height,
            cells,
        }
    }

    /// Weighted mean pose over all particles.
    ///
    /// Headings are averaged on the circle, not the line.
    pub fn estimate(&self) -> Pose2D {
        let mut sum_x = 0.0f64;
        let mut sum_y = 0.0f64;
        let mut sum_sin = 0.0f64;
        let mut sum_cos = 0.0f64;

        for (&id, &w) in self.particles.iter().zip(self.filter.weights()) {
            let pose = self.tree.pose(id);
            sum_x += w * pose.x as f64;
            sum_y += w * pose.y as f64;
            sum_sin += w * (pose.theta as f64).sin();
            sum_cos += w * (pose.theta as f64).cos();
        }

        Pose2D::new(
            sum_x as f32,
            sum_y as f32,
            sum_sin.atan2(sum_cos) as f32,
        )
    }
}
