// Side motor contract and the two-sided drivetrain
//
// Applies a `MotorCommandPair` to the left and right motors, handling the
// mirrored mounting of one side, and reads back encoder velocities for
// the motion gate.

use tracing::{debug, info};

use crate::drive::{MotorCommandPair, VelocityReading};
use crate::messages::{DriveActuation, MotorFeedback, MotorOutput, MotorState};

/// One side's motor controller: takes a command, reports its encoder.
/// Calls are expected to be cheap and non-blocking.
pub trait SideMotor {
    /// Normalized duty cycle in [-1, 1]
    fn set_command(&mut self, value: f64);

    /// Output in volts
    fn set_voltage(&mut self, volts: f64);

    fn encoder_position(&self) -> f64;

    fn encoder_velocity(&self) -> f64;

    /// Duty cycle the controller is actually applying
    fn applied_output(&self) -> f64;

    /// Last output commanded through `set_command` / `set_voltage`
    fn output(&self) -> MotorOutput;

    /// Called once per cycle before any reads. Simulated motors advance by
    /// `dt`; mirrored motors adopt the latest `feedback`, if any arrived.
    fn sync(&mut self, feedback: Option<&MotorState>, dt: f64);

    /// Snapshot of the encoder and applied output
    fn state(&self) -> MotorState {
        MotorState {
            position: self.encoder_position(),
            velocity: self.encoder_velocity(),
            applied_output: self.applied_output(),
        }
    }
}

/// Left and right motors of a differential base
pub struct Drivetrain<M: SideMotor> {
    left: M,
    right: M,
    left_inverted: bool,
    right_inverted: bool,
}

impl<M: SideMotor> Drivetrain<M> {
    pub fn new(left: M, right: M) -> Self {
        Self {
            left,
            right,
            left_inverted: false,
            right_inverted: false,
        }
    }

    /// Mark sides mounted mirrored; their commands and velocities are negated
    pub fn with_inversion(mut self, left_inverted: bool, right_inverted: bool) -> Self {
        self.left_inverted = left_inverted;
        self.right_inverted = right_inverted;
        self
    }

    /// Send one cycle's commands to the motors
    pub fn apply(&mut self, pair: MotorCommandPair) {
        debug!("Setting drive commands: left={:.3}, right={:.3}", pair.left, pair.right);
        self.left.set_command(orient(pair.left, self.left_inverted));
        self.right.set_command(orient(pair.right, self.right_inverted));
    }

    /// Zero volts on both sides
    pub fn stop(&mut self) {
        info!("Stopping drivetrain");
        self.left.set_voltage(0.0);
        self.right.set_voltage(0.0);
    }

    pub fn sync(&mut self, feedback: Option<&MotorFeedback>, dt: f64) {
        self.left.sync(feedback.map(|f| &f.left), dt);
        self.right.sync(feedback.map(|f| &f.right), dt);
    }

    /// Encoder velocities in the robot frame (inversion undone)
    pub fn velocities(&self) -> VelocityReading {
        VelocityReading::new(
            orient(self.left.encoder_velocity(), self.left_inverted),
            orient(self.right.encoder_velocity(), self.right_inverted),
        )
    }

    /// Outputs as sent to the hardware
    pub fn actuation(&self) -> DriveActuation {
        DriveActuation {
            left: self.left.output(),
            right: self.right.output(),
        }
    }

    pub fn left(&self) -> &M {
        &self.left
    }

    pub fn right(&self) -> &M {
        &self.right
    }
}

impl<M: SideMotor> Drop for Drivetrain<M> {
    fn drop(&mut self) {
        // Leave the motors stopped whatever path dropped us
        self.left.set_voltage(0.0);
        self.right.set_voltage(0.0);
    }
}

fn orient(value: f64, inverted: bool) -> f64 {
    if inverted { -value } else { value }
}
