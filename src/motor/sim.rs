// Simulated side motor
//
// First-order velocity response toward `duty * free_speed`, with position
// integrated from velocity. Velocity is in RPM and position in rotations,
// matching what a brushless controller's built-in encoder reports.

use crate::messages::{MotorOutput, MotorState};

use super::SideMotor;

/// Free speed of the simulated motor at full duty (RPM)
pub const DEFAULT_FREE_SPEED_RPM: f64 = 5676.0;
/// Time for the velocity to cover ~63% of a step (s)
pub const DEFAULT_TIME_CONSTANT: f64 = 0.1;
/// Nominal supply voltage used to convert volts to duty
pub const DEFAULT_BUS_VOLTAGE: f64 = 12.0;

#[derive(Debug, Clone)]
pub struct SimulatedMotor {
    free_speed: f64,
    time_constant: f64,
    bus_voltage: f64,
    output: MotorOutput,
    position: f64,
    velocity: f64,
}

impl SimulatedMotor {
    pub fn new(free_speed: f64, time_constant: f64, bus_voltage: f64) -> Self {
        Self {
            free_speed,
            time_constant,
            bus_voltage,
            output: MotorOutput::default(),
            position: 0.0,
            velocity: 0.0,
        }
    }

    fn duty(&self) -> f64 {
        match self.output {
            MotorOutput::Duty(duty) => duty,
            MotorOutput::Voltage(volts) => (volts / self.bus_voltage).clamp(-1.0, 1.0),
        }
    }
}

impl Default for SimulatedMotor {
    fn default() -> Self {
        Self::new(DEFAULT_FREE_SPEED_RPM, DEFAULT_TIME_CONSTANT, DEFAULT_BUS_VOLTAGE)
    }
}

impl SideMotor for SimulatedMotor {
    fn set_command(&mut self, value: f64) {
        self.output = MotorOutput::Duty(value.clamp(-1.0, 1.0));
    }

    fn set_voltage(&mut self, volts: f64) {
        self.output = MotorOutput::Voltage(volts);
    }

    fn encoder_position(&self) -> f64 {
        self.position
    }

    fn encoder_velocity(&self) -> f64 {
        self.velocity
    }

    fn applied_output(&self) -> f64 {
        self.duty()
    }

    fn output(&self) -> MotorOutput {
        self.output
    }

    fn sync(&mut self, _feedback: Option<&MotorState>, dt: f64) {
        if dt <= 0.0 {
            return;
        }
        let target = self.duty() * self.free_speed;
        let alpha = 1.0 - (-dt / self.time_constant).exp();
        self.velocity += (target - self.velocity) * alpha;
        // RPM -> rotations per second
        self.position += self.velocity / 60.0 * dt;
    }
}
