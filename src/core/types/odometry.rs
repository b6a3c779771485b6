//! Odometry control records.

use serde::{Deserialize, Serialize};

use super::pose::Pose2D;

/// Two consecutive odometry poses, as reported by wheel encoders.
///
/// The motion model derives the rotation-translation-rotation
/// decomposition from the difference between `last` and `current`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Control {
    /// Odometry pose at the current step.
    pub current: Pose2D,
    /// Odometry pose at the previous step.
    pub last: Pose2D,
}

impl Control {
    /// Create a control record from two consecutive odometry poses.
    #[inline]
    pub fn new(current: Pose2D, last: Pose2D) -> Self {
        Self { current, last }
    }

    /// The robot reported no motion at all. Comparison is bit-exact.
    #[inline]
    pub fn is_still(&self) -> bool {
        self.current == self.last
    }
}
