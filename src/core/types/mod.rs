//! Core value types shared across the estimator.

mod odometry;
mod pose;
mod scan;

pub use odometry::Control;
pub use pose::{Point2D, Pose2D};
pub use scan::LaserScan;
