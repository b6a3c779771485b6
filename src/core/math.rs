//! Mathematical primitives for 2D SLAM operations.
//!
//! Angle normalization plus the Gaussian sampling and density functions
//! used by the motion and sensor models.

use std::f32::consts::PI;
use std::f64::consts::TAU;

use rand::Rng;

/// Normalize angle to [-π, π].
///
/// # Example
/// ```
/// use dp_slam::core::math::normalize_angle;
/// use std::f32::consts::PI;
///
/// assert!((normalize_angle(3.0 * PI) - PI).abs() < 1e-6);
/// assert!((normalize_angle(-3.0 * PI) - (-PI)).abs() < 1e-6);
/// ```
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    let mut a = angle % (2.0 * PI);
    if a > PI {
        a -= 2.0 * PI;
    } else if a < -PI {
        a += 2.0 * PI;
    }
    a
}

/// Draw one sample from a normal distribution.
///
/// Box–Muller transform over two uniforms. The uniforms are drawn from
/// (0, 1] rather than [0, 1) so the logarithm stays finite.
#[inline]
pub fn sample_normal<R: Rng>(rng: &mut R, mean: f32, variance: f32) -> f32 {
    debug_assert!(variance >= 0.0, "variance must be non-negative");
    let u1 = 1.0 - rng.random::<f64>();
    let u2 = 1.0 - rng.random::<f64>();
    let radius = (-2.0 * u1.ln()).sqrt();
    mean + (radius * (TAU * u2).cos()) as f32 * variance.sqrt()
}

/// Gaussian probability density at `value`.
#[inline]
pub fn prob_normal(value: f32, mean: f32, variance: f32) -> f64 {
    debug_assert!(variance > 0.0, "variance must be positive");
    let d = (value - mean) as f64;
    let var = variance as f64;
    (-0.5 * d * d / var).exp() / (TAU * var).sqrt()
}
