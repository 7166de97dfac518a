// Side motor mirrored from the hardware bridge
//
// Commands are recorded and published by the runtime as `DriveActuation`;
// encoder state is whatever the bridge last reported on the feedback topic.

use crate::messages::{MotorOutput, MotorState};

use super::SideMotor;

#[derive(Debug, Clone, Default)]
pub struct RemoteMotor {
    output: MotorOutput,
    state: MotorState,
}

impl RemoteMotor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SideMotor for RemoteMotor {
    fn set_command(&mut self, value: f64) {
        self.output = MotorOutput::Duty(value.clamp(-1.0, 1.0));
    }

    fn set_voltage(&mut self, volts: f64) {
        self.output = MotorOutput::Voltage(volts);
    }

    fn encoder_position(&self) -> f64 {
        self.state.position
    }

    fn encoder_velocity(&self) -> f64 {
        self.state.velocity
    }

    fn applied_output(&self) -> f64 {
        self.state.applied_output
    }

    fn output(&self) -> MotorOutput {
        self.output
    }

    // Stale feedback is kept as-is; the bridge owns its freshness
    fn sync(&mut self, feedback: Option<&MotorState>, _dt: f64) {
        if let Some(state) = feedback {
            self.state = *state;
        }
    }
}
