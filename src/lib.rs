// Motion-control core for a differential-drive base, hosted over zenoh
//
// - drive: rate limiting, kinematics, motion gate, mode arbitration
// - motor: side motor contract, drivetrain, simulated and remote motors
// - diagnostic: fixed-output motor exerciser with telemetry
// - runtime: fixed-rate loops wiring it all to zenoh topics

pub mod config;
pub mod dashboard;
pub mod diagnostic;
pub mod drive;
pub mod error;
pub mod messages;
pub mod motor;
pub mod routine;
pub mod runtime;
