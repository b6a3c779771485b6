//! Distributed-particle SLAM for a mobile robot with wheel odometry and
//! a planar laser range finder.
//!
//! The estimator maintains a joint posterior over the robot pose and a
//! binary occupancy grid as a weighted set of particles. Each particle
//! owns a full map *logically*; physically all particle maps share one
//! cell store through an ancestry tree, so memory grows with the number
//! of distinct cell edits across surviving lineages rather than with
//! particles × cells.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    engine/                          │  ← DpSlam driver
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                  algorithms/                        │  ← localization + mapping
//! │   (motion model, beam model, particle filter,       │
//! │    ray tracer, ancestry tree, distributed map)      │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                     core/                           │  ← types, math
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use dp_slam::{Control, DpSlam, DpSlamConfig, LaserScan, Pose2D};
//!
//! let mut slam = DpSlam::new(DpSlamConfig {
//!     num_particles: 20,
//!     seed: 42,
//!     ..Default::default()
//! }).unwrap();
//!
//! // One step: odometry said we moved 0.1 forward, lidar saw nothing.
//! let control = Control::new(Pose2D::new(0.1, 0.0, 0.0), Pose2D::identity());
//! let scan = LaserScan::new(vec![0.0; 360]);
//! slam.update(&control, &scan);
//!
//! let snapshot = slam.sample(-10, 10, -10, 10);
//! assert!(!snapshot.is_occupied(0, 0));
//! ```
//!
//! The estimator is single-threaded and synchronous: all mutation of
//! the tree, the map and the weights happens inside one `update` call.

// ============================================================================
// Layer 1: Core foundation (no internal deps)
// ============================================================================
pub mod core;

// ============================================================================
// Layer 2: Algorithms (depends on core)
// ============================================================================
pub mod algorithms;

// ============================================================================
// Layer 3: Engine (depends on core, algorithms)
// ============================================================================
pub mod engine;

mod error;

// ============================================================================
// Convenience re-exports (flat namespace for common use)
// ============================================================================

pub use error::{Result, SlamError};

// Core types
pub use crate::core::math;
pub use crate::core::types::{Control, LaserScan, Point2D, Pose2D};

// Algorithms - Localization
pub use algorithms::localization::{
    BeamModel, BeamModelConfig, MotionModel, MotionModelConfig, ParticleFilter,
    ParticleFilterConfig,
};

// Algorithms - Mapping
pub use algorithms::mapping::{
    cell_of, trace, AncestryNode, AncestryTree, CellState, DistributedMap, NodeId,
};

// Engine
pub use engine::{DpSlam, DpSlamConfig, DpSlamState, MapSnapshot};
