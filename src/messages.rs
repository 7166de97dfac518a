// Define message types for the runtime

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::drive::DriveMode;

// Operator sticks from teleop -> runtime, each axis normalized to [-1, 1]
// Missing axes deserialize as centered
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisInput {
    pub left_y: f64,
    pub right_y: f64,
    pub right_x: f64,
}

impl AxisInput {
    /// Clamp every axis into [-1, 1]; NaN reads as centered
    pub fn sanitized(self) -> Self {
        let clean = |v: f64| if v.is_nan() { 0.0 } else { v.clamp(-1.0, 1.0) };
        Self {
            left_y: clean(self.left_y),
            right_y: clean(self.right_y),
            right_x: clean(self.right_x),
        }
    }
}

// Dashboard write from an operator tool -> runtime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TuningUpdate {
    Number { key: String, value: f64 },
    Mode { mode: DriveMode },
}

// Encoder state of one side, reported by the hardware bridge
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MotorState {
    pub position: f64,
    pub velocity: f64,
    pub applied_output: f64,
}

// Hardware bridge -> runtime
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MotorFeedback {
    pub left: MotorState,
    pub right: MotorState,
}

/// Output last commanded to one side
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MotorOutput {
    /// Normalized duty cycle in [-1, 1]
    Duty(f64),
    /// Volts
    Voltage(f64),
}

impl Default for MotorOutput {
    fn default() -> Self {
        MotorOutput::Duty(0.0)
    }
}

impl MotorOutput {
    pub fn is_zero(&self) -> bool {
        match *self {
            MotorOutput::Duty(v) | MotorOutput::Voltage(v) => v == 0.0,
        }
    }
}

// Actuation output from runtime -> hardware bridge
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DriveActuation {
    pub left: MotorOutput,
    pub right: MotorOutput,
}

/// Health status published by runtime
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeHealth {
    Ok,
    CmdStale,
}

// Dashboard contents published every cycle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetryFrame {
    pub mode: DriveMode,
    pub numbers: BTreeMap<String, f64>,
}
