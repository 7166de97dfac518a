// Diagnostic motor exerciser
//
// Drives both sides at a fixed low output and publishes encoder position,
// velocity and applied output every cycle, so wiring polarity and encoder
// health can be checked on the dashboard with the wheels off the ground.
// Runs until ended externally; ending always leaves both sides at zero volts.

use std::fmt;

use serde::Serialize;
use tracing::info;

use crate::config::{
    EXERCISE_OUTPUT, KEY_LEFT_POSITION, KEY_LEFT_VELOCITY, KEY_LEFT_VOLTAGE, KEY_RIGHT_POSITION,
    KEY_RIGHT_VELOCITY, KEY_RIGHT_VOLTAGE,
};
use crate::dashboard::TelemetrySink;
use crate::motor::SideMotor;
use crate::routine::Routine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExerciserState {
    Idle,
    Running,
    Terminated,
}

/// Final encoder readings of one side
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SideReport {
    pub id: u8,
    pub side: &'static str,
    pub position: f64,
    pub velocity: f64,
}

impl fmt::Display for SideReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Motor ID {} {} Motor Encoder Position: {:.3} Encoder Velocity: {:.3}",
            self.id, self.side, self.position, self.velocity
        )
    }
}

/// Summary emitted when the exerciser ends
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticReport {
    pub left: SideReport,
    pub right: SideReport,
    pub interrupted: bool,
}

impl fmt::Display for DiagnosticReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.left)?;
        write!(f, "{}", self.right)
    }
}

pub struct DiagnosticExerciser<M: SideMotor, T: TelemetrySink> {
    left: M,
    right: M,
    left_id: u8,
    right_id: u8,
    output: f64,
    telemetry: T,
    state: ExerciserState,
    report: Option<DiagnosticReport>,
}

impl<M: SideMotor, T: TelemetrySink> DiagnosticExerciser<M, T> {
    pub fn new(left: M, left_id: u8, right: M, right_id: u8, telemetry: T) -> Self {
        Self {
            left,
            right,
            left_id,
            right_id,
            output: EXERCISE_OUTPUT,
            telemetry,
            state: ExerciserState::Idle,
            report: None,
        }
    }

    /// Override the normalized output applied while running
    pub fn with_output(mut self, output: f64) -> Self {
        self.output = output.clamp(-1.0, 1.0);
        self
    }

    /// Apply the fixed output to both sides. Only valid from `Idle`.
    pub fn start(&mut self) {
        if self.state != ExerciserState::Idle {
            return;
        }
        info!(
            "Exercising motors {} (left) and {} (right) at {:.2}",
            self.left_id, self.right_id, self.output
        );
        self.left.set_command(self.output);
        self.right.set_command(self.output);
        self.state = ExerciserState::Running;
    }

    /// Publish this cycle's encoder readings (overwrites the previous ones)
    pub fn sample(&mut self) {
        if self.state != ExerciserState::Running {
            return;
        }
        let left = self.left.state();
        let right = self.right.state();
        self.telemetry.put_number(KEY_LEFT_POSITION, left.position);
        self.telemetry.put_number(KEY_RIGHT_POSITION, right.position);
        self.telemetry.put_number(KEY_LEFT_VOLTAGE, left.applied_output);
        self.telemetry.put_number(KEY_RIGHT_VOLTAGE, right.applied_output);
        self.telemetry.put_number(KEY_LEFT_VELOCITY, left.velocity);
        self.telemetry.put_number(KEY_RIGHT_VELOCITY, right.velocity);
    }

    /// Report final readings (if it was running) and zero both sides.
    /// The zero-volt stop happens in every state.
    pub fn stop(&mut self, interrupted: bool) -> Option<&DiagnosticReport> {
        if self.state == ExerciserState::Running {
            let report = DiagnosticReport {
                left: SideReport {
                    id: self.left_id,
                    side: "Left",
                    position: self.left.encoder_position(),
                    velocity: self.left.encoder_velocity(),
                },
                right: SideReport {
                    id: self.right_id,
                    side: "Right",
                    position: self.right.encoder_position(),
                    velocity: self.right.encoder_velocity(),
                },
                interrupted,
            };
            info!("{}", report.left);
            info!("{}", report.right);
            self.report = Some(report);
        }

        self.left.set_voltage(0.0);
        self.right.set_voltage(0.0);
        if self.state != ExerciserState::Terminated {
            info!("Diagnostic ended (interrupted={}), motors at 0V", interrupted);
        }
        self.state = ExerciserState::Terminated;
        self.report.as_ref()
    }

    pub fn state(&self) -> ExerciserState {
        self.state
    }

    pub fn report(&self) -> Option<&DiagnosticReport> {
        self.report.as_ref()
    }

    pub fn telemetry(&self) -> &T {
        &self.telemetry
    }

    pub fn left(&self) -> &M {
        &self.left
    }

    pub fn right(&self) -> &M {
        &self.right
    }

    pub fn motors_mut(&mut self) -> (&mut M, &mut M) {
        (&mut self.left, &mut self.right)
    }
}

impl<M: SideMotor, T: TelemetrySink> Routine for DiagnosticExerciser<M, T> {
    fn initialize(&mut self) {
        self.start();
    }

    fn execute(&mut self) {
        self.sample();
    }

    fn end(&mut self, interrupted: bool) {
        self.stop(interrupted);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::{Dashboard, TuningSource};
    use crate::messages::MotorOutput;
    use crate::motor::SimulatedMotor;
    use crate::routine::RoutineRunner;

    fn exerciser() -> DiagnosticExerciser<SimulatedMotor, Dashboard> {
        DiagnosticExerciser::new(SimulatedMotor::default(), 1, SimulatedMotor::default(), 3, Dashboard::new())
    }

    fn advance(ex: &mut DiagnosticExerciser<SimulatedMotor, Dashboard>) {
        let (left, right) = ex.motors_mut();
        left.sync(None, 0.02);
        right.sync(None, 0.02);
    }

    #[test]
    fn test_start_applies_fixed_output() {
        let mut ex = exerciser();
        assert_eq!(ex.state(), ExerciserState::Idle);
        ex.start();
        assert_eq!(ex.state(), ExerciserState::Running);
        assert_eq!(ex.left().output(), MotorOutput::Duty(EXERCISE_OUTPUT));
        assert_eq!(ex.right().output(), MotorOutput::Duty(EXERCISE_OUTPUT));
    }

    #[test]
    fn test_sample_publishes_six_values() {
        let mut ex = exerciser();
        ex.start();
        for _ in 0..10 {
            advance(&mut ex);
            ex.sample();
        }
        let dash = ex.telemetry();
        assert_eq!(dash.numbers().len(), 6);
        assert_eq!(dash.get_number(KEY_LEFT_VOLTAGE, -1.0), EXERCISE_OUTPUT);
        assert_eq!(dash.get_number(KEY_RIGHT_VELOCITY, -1.0), ex.right().encoder_velocity());
        assert_eq!(dash.get_number(KEY_LEFT_POSITION, -1.0), ex.left().encoder_position());
        assert!(dash.get_number(KEY_LEFT_VELOCITY, 0.0) > 0.0);
    }

    #[test]
    fn test_idle_does_not_sample() {
        let mut ex = exerciser();
        ex.sample();
        assert!(ex.telemetry().numbers().is_empty());
    }

    #[test]
    fn test_stop_reports_and_zeroes() {
        for interrupted in [false, true] {
            let mut ex = exerciser();
            ex.start();
            for _ in 0..25 {
                advance(&mut ex);
                ex.sample();
            }
            let position = ex.left().encoder_position();

            let report = ex.stop(interrupted).cloned().unwrap();
            assert_eq!(report.interrupted, interrupted);
            assert_eq!(report.left.id, 1);
            assert_eq!(report.right.id, 3);
            assert_eq!(report.left.position, position);
            assert!(report.to_string().contains("Motor ID 3 Right"));

            assert_eq!(ex.state(), ExerciserState::Terminated);
            assert_eq!(ex.left().output(), MotorOutput::Voltage(0.0));
            assert_eq!(ex.right().output(), MotorOutput::Voltage(0.0));
        }
    }

    #[test]
    fn test_terminated_is_final() {
        let mut ex = exerciser();
        ex.start();
        ex.stop(false);
        ex.start();
        assert_eq!(ex.state(), ExerciserState::Terminated);
        assert!(ex.left().output().is_zero());
    }

    #[test]
    fn test_stop_from_idle_still_zeroes() {
        let mut ex = exerciser();
        assert!(ex.stop(true).is_none());
        assert_eq!(ex.left().output(), MotorOutput::Voltage(0.0));
    }

    #[test]
    fn test_runner_cancel_stops_motors() {
        let mut runner = RoutineRunner::new(exerciser());
        for _ in 0..5 {
            let (left, right) = runner.routine_mut().motors_mut();
            left.sync(None, 0.02);
            right.sync(None, 0.02);
            assert!(runner.tick());
        }
        assert_eq!(runner.routine().state(), ExerciserState::Running);

        runner.cancel();
        let ex = runner.routine();
        assert_eq!(ex.state(), ExerciserState::Terminated);
        assert!(ex.report().is_some_and(|r| r.interrupted));
        assert_eq!(ex.left().output(), MotorOutput::Voltage(0.0));
        assert_eq!(ex.right().output(), MotorOutput::Voltage(0.0));
    }

    #[test]
    fn test_never_finishes_by_itself() {
        let mut runner = RoutineRunner::new(exerciser());
        for _ in 0..500 {
            assert!(runner.tick());
        }
    }
}
