// Loop timing, topics, dashboard keys and drive defaults
use std::time::Duration;

// Runtime loop frequency
pub const LOOP_HZ: u64 = 50;

// Command timeout for watchdog
pub const CMD_TIMEOUT: Duration = Duration::from_millis(250);

// Zenoh topics
pub const TOPIC_CMD_AXES: &str = "diffdrive/cmd/axes"; // operator sticks
pub const TOPIC_TUNING: &str = "diffdrive/tuning"; // dashboard writes
pub const TOPIC_FEEDBACK: &str = "diffdrive/state/motors"; // encoder feedback from hw bridge
pub const TOPIC_RT_DRIVE: &str = "diffdrive/rt/drive"; // actuation
pub const TOPIC_HEALTH: &str = "diffdrive/state/health"; // health status
pub const TOPIC_TELEMETRY: &str = "diffdrive/state/telemetry"; // dashboard numbers

// Dashboard keys read by the drive arbiter
pub const KEY_THROTTLE_CONSTANT: &str = "Throttle Constant";
pub const KEY_TURN_CONSTANT: &str = "Turn Constant";
pub const KEY_THROTTLE_FILTER: &str = "Throttle Filter";
pub const KEY_TURN_FILTER: &str = "Turn Filter";

// Dashboard keys written by the diagnostic exerciser
pub const KEY_LEFT_POSITION: &str = "Left Motor Position";
pub const KEY_RIGHT_POSITION: &str = "Right Motor Position";
pub const KEY_LEFT_VOLTAGE: &str = "Left Motor Voltage";
pub const KEY_RIGHT_VOLTAGE: &str = "Right Motor Voltage";
pub const KEY_LEFT_VELOCITY: &str = "Left Motor Velocity";
pub const KEY_RIGHT_VELOCITY: &str = "Right Motor Velocity";

// Encoder velocity above which the base counts as moving (encoder units)
pub const MOTION_EPSILON: f64 = 0.05;

// Startup gains and rate limits (units/s)
pub const DEFAULT_THROTTLE_CONSTANT: f64 = 1.0;
pub const DEFAULT_TURN_CONSTANT: f64 = 1.0;
pub const DEFAULT_THROTTLE_LIMIT: f64 = 1.0;
pub const DEFAULT_TURN_LIMIT: f64 = 1.0;

// Fixed normalized output applied by the diagnostic exerciser
pub const EXERCISE_OUTPUT: f64 = 0.1;

// Motor controller ids, used only for diagnostic reports
pub const LEFT_MOTOR_ID: u8 = 1;
pub const RIGHT_MOTOR_ID: u8 = 3;

// Right side is mounted mirrored
pub const LEFT_INVERTED: bool = false;
pub const RIGHT_INVERTED: bool = true;
