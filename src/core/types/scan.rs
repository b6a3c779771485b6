//! Laser range scan type.

use serde::{Deserialize, Serialize};

/// One full-rotation laser scan in polar form.
///
/// Beam `i` of a scan of length `n` points at angle `i · 2π/n` relative
/// to the robot heading. A range of `0.0` means the beam saw no return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaserScan {
    /// Range measurements in world units (0.0 = no return).
    pub ranges: Vec<f32>,
}

impl LaserScan {
    /// Create a scan from raw range measurements.
    pub fn new(ranges: Vec<f32>) -> Self {
        Self { ranges }
    }

    /// Number of beams.
    #[inline]
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Check if the scan is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Range of beam `i`.
    #[inline]
    pub fn range(&self, i: usize) -> f32 {
        self.ranges[i]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_accessors() {
        let scan = LaserScan::new(vec![1.0, 0.0, 2.5]);
        assert_eq!(scan.len(), 3);
        assert!(!scan.is_empty());
        assert_eq!(scan.range(1), 0.0);
        assert_eq!(scan.range(2), 2.5);
    }
}
