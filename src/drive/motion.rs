// Motion gate: decides whether the base is moving from encoder velocities

use serde::{Deserialize, Serialize};

use crate::config::MOTION_EPSILON;

/// Encoder velocity snapshot for both sides, in encoder units
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VelocityReading {
    pub left: f64,
    pub right: f64,
}

impl VelocityReading {
    pub fn new(left: f64, right: f64) -> Self {
        Self { left, right }
    }

    pub fn zero() -> Self {
        Self::default()
    }
}

/// True when either side spins faster than `MOTION_EPSILON`.
/// The threshold itself counts as stationary.
pub fn is_moving(velocities: &VelocityReading) -> bool {
    velocities.left.abs() > MOTION_EPSILON || velocities.right.abs() > MOTION_EPSILON
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stationary() {
        assert!(!is_moving(&VelocityReading::zero()));
        assert!(!is_moving(&VelocityReading::new(0.01, -0.02)));
    }

    #[test]
    fn test_boundary_is_not_moving() {
        assert!(!is_moving(&VelocityReading::new(0.05, 0.0)));
        assert!(!is_moving(&VelocityReading::new(0.0, -0.05)));
        assert!(!is_moving(&VelocityReading::new(-0.05, 0.05)));
    }

    #[test]
    fn test_either_side_moving() {
        assert!(is_moving(&VelocityReading::new(0.051, 0.0)));
        assert!(is_moving(&VelocityReading::new(0.0, -0.06)));
        assert!(is_moving(&VelocityReading::new(-120.0, 118.0)));
    }
}
