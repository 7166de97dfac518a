// Drive control core
//
// Provides:
// - Slew-rate limiting of the throttle and turn channels
// - Arcade / tank / curvature mixing
// - Motion gate over encoder velocities
// - Per-cycle drive mode arbitration

pub mod arbiter;
pub mod kinematics;
pub mod motion;
pub mod rate_limiter;

pub use arbiter::{
    drive_cycle, ArbiterState, CycleInput, DriveMode, GainSet, LimitChange, LimitSet, TuningSnapshot,
};
pub use kinematics::{DriveOptions, MotorCommandPair};
pub use motion::{is_moving, VelocityReading};
pub use rate_limiter::RateLimiter;
