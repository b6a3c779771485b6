//! Pose and point types for 2D SLAM.

use serde::{Deserialize, Serialize};

/// A 2D point in world units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    /// X coordinate
    pub x: f32,
    /// Y coordinate
    pub y: f32,
}

impl Point2D {
    /// Create a new point.
    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Squared distance to another point (avoids sqrt).
    #[inline]
    pub fn distance_squared(&self, other: &Point2D) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Distance to another point.
    #[inline]
    pub fn distance(&self, other: &Point2D) -> f32 {
        self.distance_squared(other).sqrt()
    }
}

impl Default for Point2D {
    fn default() -> Self {
        Self { x: 0.0, y: 0.0 }
    }
}

/// Robot pose in 2D space.
///
/// Position (x, y) in world units and heading (theta) in radians,
/// normalized to [-π, π]. Poses are value objects: every operation
/// returns a fresh pose, and equality is bit-exact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose2D {
    /// X position
    pub x: f32,
    /// Y position
    pub y: f32,
    /// Heading in radians, normalized to [-π, π]
    pub theta: f32,
}

impl Pose2D {
    /// Create a new pose with theta normalized to [-π, π].
    #[inline]
    pub fn new(x: f32, y: f32, theta: f32) -> Self {
        Self {
            x,
            y,
            theta: crate::core::math::normalize_angle(theta),
        }
    }

    /// Identity pose at origin with zero heading.
    #[inline]
    pub fn identity() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            theta: 0.0,
        }
    }

    /// Component-wise vector add, including the angle.
    #[inline]
    pub fn offset(&self, other: &Pose2D) -> Pose2D {
        Pose2D::new(self.x + other.x, self.y + other.y, self.theta + other.theta)
    }

    /// Pose from polar coordinates: `(r cos θ, r sin θ)` with heading θ.
    #[inline]
    pub fn from_polar(r: f32, theta: f32) -> Pose2D {
        let (sin_t, cos_t) = theta.sin_cos();
        Pose2D::new(r * cos_t, r * sin_t, theta)
    }

    /// Euclidean distance over (x, y) only; headings are ignored.
    #[inline]
    pub fn distance(&self, other: &Pose2D) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Position component of the pose.
    #[inline]
    pub fn position(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }
}

impl Default for Pose2D {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    #[test]
    fn test_point2d_distance() {
        let a = Point2D::new(0.0, 0.0);
        let b = Point2D::new(3.0, 4.0);
        assert_relative_eq!(a.distance(&b), 5.0);
        assert_relative_eq!(a.distance_squared(&b), 25.0);
    }

    #[test]
    fn test_offset_adds_components() {
        let a = Pose2D::new(1.0, 2.0, 0.5);
        let b = Pose2D::new(3.0, -1.0, 0.25);
        let c = a.offset(&b);
        assert_relative_eq!(c.x, 4.0);
        assert_relative_eq!(c.y, 1.0);
        assert_relative_eq!(c.theta, 0.75);
    }

    #[test]
    fn test_offset_normalizes_angle() {
        let a = Pose2D::new(0.0, 0.0, PI - 0.1);
        let b = Pose2D::new(0.0, 0.0, 0.2);
        let c = a.offset(&b);
        assert_relative_eq!(c.theta, -PI + 0.1, epsilon = 1e-6);
    }

    #[test]
    fn test_from_polar() {
        let p = Pose2D::from_polar(2.0, FRAC_PI_2);
        assert_relative_eq!(p.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(p.y, 2.0, epsilon = 1e-6);
        assert_relative_eq!(p.theta, FRAC_PI_2);

        let p = Pose2D::from_polar(1.0, FRAC_PI_4);
        assert_relative_eq!(p.x, FRAC_PI_4.cos(), epsilon = 1e-6);
        assert_relative_eq!(p.y, FRAC_PI_4.sin(), epsilon = 1e-6);
    }

    #[test]
    fn test_distance_ignores_heading() {
        let a = Pose2D::new(0.0, 0.0, 0.0);
        let b = Pose2D::new(3.0, 4.0, PI);
        assert_relative_eq!(a.distance(&b), 5.0);
    }

    #[test]
    fn test_equality_is_bit_exact() {
        let a = Pose2D::new(1.0, 2.0, 0.5);
        let b = Pose2D::new(1.0, 2.0, 0.5);
        assert_eq!(a, b);
        assert_ne!(a, Pose2D::new(1.0 + f32::EPSILON, 2.0, 0.5));
    }
}
