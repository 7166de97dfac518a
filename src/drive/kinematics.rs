// Differential drive mixing: arcade, tank and curvature
//
// All inputs are normalized to [-1, 1]; every output pair is kept in
// [-1, 1] by scaling both sides down together so the ratio between them
// (and therefore the turn) is preserved.

use serde::{Deserialize, Serialize};

/// Normalized command for each side of the drivetrain
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MotorCommandPair {
    pub left: f64,
    pub right: f64,
}

impl MotorCommandPair {
    pub fn new(left: f64, right: f64) -> Self {
        Self { left, right }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    /// Scale both sides down so neither magnitude exceeds 1
    pub fn desaturate(self) -> Self {
        let max_magnitude = self.left.abs().max(self.right.abs());
        if max_magnitude > 1.0 {
            Self::new(self.left / max_magnitude, self.right / max_magnitude)
        } else {
            self
        }
    }
}

/// Input conditioning applied inside the mixers
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DriveOptions {
    /// Inputs with magnitude below this are treated as zero
    pub deadband: f64,
    /// Square input magnitudes (sign kept) for finer low-speed control
    pub square_inputs: bool,
}

/// Zero values inside the deadband and rescale the rest so the output
/// still spans [-1, 1] without a jump at the threshold
pub fn apply_deadband(value: f64, deadband: f64) -> f64 {
    if deadband <= 0.0 {
        return value;
    }
    if value.abs() < deadband {
        return 0.0;
    }
    value.signum() * (value.abs() - deadband) / (1.0 - deadband)
}

fn condition(value: f64, options: &DriveOptions, allow_square: bool) -> f64 {
    let value = apply_deadband(value.clamp(-1.0, 1.0), options.deadband);
    if allow_square && options.square_inputs {
        (value * value).copysign(value)
    } else {
        value
    }
}

/// Each channel drives one side directly
pub fn tank(left: f64, right: f64, options: &DriveOptions) -> MotorCommandPair {
    MotorCommandPair::new(condition(left, options, true), condition(right, options, true))
}

/// Mix one throttle and one turn channel: left = t + u, right = t - u
pub fn arcade(throttle: f64, turn: f64, options: &DriveOptions) -> MotorCommandPair {
    let throttle = condition(throttle, options, true);
    let turn = condition(turn, options, true);
    MotorCommandPair::new(throttle + turn, throttle - turn).desaturate()
}

/// Turn is scaled by throttle magnitude so the turn sets path curvature
/// rather than rate; with `in_place` the turn is applied unscaled, which
/// lets the base pivot at zero throttle
pub fn curvature(
    throttle: f64,
    turn: f64,
    in_place: bool,
    options: &DriveOptions,
) -> MotorCommandPair {
    let throttle = condition(throttle, options, false);
    let turn = condition(turn, options, false);

    let pair = if in_place {
        MotorCommandPair::new(throttle + turn, throttle - turn)
    } else {
        let scaled = throttle.abs() * turn;
        MotorCommandPair::new(throttle + scaled, throttle - scaled)
    };
    pair.desaturate()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    /// Grid over [-1, 1] with a step of 0.1
    fn grid() -> impl Iterator<Item = f64> {
        (-10..=10).map(|i| i as f64 / 10.0)
    }

    #[test]
    fn test_zero_input() {
        let opts = DriveOptions::default();
        assert_eq!(arcade(0.0, 0.0, &opts), MotorCommandPair::zero());
        assert_eq!(tank(0.0, 0.0, &opts), MotorCommandPair::zero());
        assert_eq!(curvature(0.0, 0.0, true, &opts), MotorCommandPair::zero());
        assert_eq!(curvature(0.0, 0.0, false, &opts), MotorCommandPair::zero());
    }

    #[test]
    fn test_arcade_straight() {
        let pair = arcade(0.5, 0.0, &DriveOptions::default());
        assert!(close(pair.left, 0.5));
        assert!(close(pair.right, 0.5));
    }

    #[test]
    fn test_arcade_turn_in_place() {
        let pair = arcade(0.0, 0.4, &DriveOptions::default());
        assert!(close(pair.left, 0.4));
        assert!(close(pair.right, -0.4));
    }

    #[test]
    fn test_arcade_desaturates_proportionally() {
        // 0.8 + 0.6 = 1.4 and 0.8 - 0.6 = 0.2, scaled by 1/1.4
        let pair = arcade(0.8, 0.6, &DriveOptions::default());
        assert!(close(pair.left, 1.0));
        assert!(close(pair.right, 0.2 / 1.4));
        assert!(pair.left > pair.right, "turn direction must survive scaling");
    }

    #[test]
    fn test_arcade_and_curvature_never_saturate() {
        let opts = DriveOptions::default();
        for t in grid() {
            for u in grid() {
                for pair in [
                    arcade(t, u, &opts),
                    curvature(t, u, true, &opts),
                    curvature(t, u, false, &opts),
                ] {
                    assert!(pair.left.abs() <= 1.0, "left {} for t={} u={}", pair.left, t, u);
                    assert!(pair.right.abs() <= 1.0, "right {} for t={} u={}", pair.right, t, u);
                }
            }
        }
    }

    #[test]
    fn test_saturation_is_symmetric() {
        let opts = DriveOptions::default();
        let forward = arcade(0.9, 0.7, &opts);
        let reverse = arcade(-0.9, -0.7, &opts);
        assert!(close(forward.left, -reverse.left));
        assert!(close(forward.right, -reverse.right));
    }

    #[test]
    fn test_tank_passes_channels_through() {
        let pair = tank(0.3, -0.6, &DriveOptions::default());
        assert!(close(pair.left, 0.3));
        assert!(close(pair.right, -0.6));

        // Out of range inputs (e.g. after a gain > 1) are clamped
        let pair = tank(1.7, -2.0, &DriveOptions::default());
        assert_eq!(pair, MotorCommandPair::new(1.0, -1.0));
    }

    #[test]
    fn test_curvature_pivot_in_place() {
        let pair = curvature(0.0, 0.8, true, &DriveOptions::default());
        assert!(close(pair.left, 0.8));
        assert!(close(pair.right, -0.8));
    }

    #[test]
    fn test_curvature_without_in_place_needs_throttle() {
        let opts = DriveOptions::default();
        assert_eq!(curvature(0.0, 0.8, false, &opts), MotorCommandPair::zero());

        // 0.5 + 0.5 * 0.8 = 0.9, 0.5 - 0.4 = 0.1
        let pair = curvature(0.5, 0.8, false, &opts);
        assert!(close(pair.left, 0.9));
        assert!(close(pair.right, 0.1));
    }

    #[test]
    fn test_deadband() {
        assert_eq!(apply_deadband(0.01, 0.02), 0.0);
        assert_eq!(apply_deadband(-0.019, 0.02), 0.0);
        assert!(close(apply_deadband(1.0, 0.02), 1.0));
        assert!(close(apply_deadband(-1.0, 0.02), -1.0));
        assert!(close(apply_deadband(0.51, 0.02), 0.5));
        // Disabled deadband is the identity
        assert_eq!(apply_deadband(0.001, 0.0), 0.001);
    }

    #[test]
    fn test_square_inputs_keeps_sign() {
        let opts = DriveOptions {
            deadband: 0.0,
            square_inputs: true,
        };
        let pair = arcade(-0.5, 0.0, &opts);
        assert!(close(pair.left, -0.25));
        assert!(close(pair.right, -0.25));

        // Curvature ignores squaring
        let pair = curvature(-0.5, 0.0, false, &opts);
        assert!(close(pair.left, -0.5));
    }
}
