// Drive mode arbitration
//
// One control cycle is a pure transformation of `ArbiterState`: read the
// tuning snapshot, reconfigure filters if it is safe, shape the sticks and
// mix them with exactly one kinematics mode.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::kinematics::{self, DriveOptions, MotorCommandPair};
use super::motion::{is_moving, VelocityReading};
use super::rate_limiter::RateLimiter;
use crate::config::{
    DEFAULT_THROTTLE_CONSTANT, DEFAULT_THROTTLE_LIMIT, DEFAULT_TURN_CONSTANT, DEFAULT_TURN_LIMIT,
};
use crate::error::DriveError;
use crate::messages::AxisInput;

/// Kinematic interpretation of the sticks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriveMode {
    Arcade,
    Tank,
    #[default]
    Curvature,
}

/// Multipliers applied to raw stick values before shaping
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GainSet {
    pub throttle: f64,
    pub turn: f64,
}

impl Default for GainSet {
    fn default() -> Self {
        Self {
            throttle: DEFAULT_THROTTLE_CONSTANT,
            turn: DEFAULT_TURN_CONSTANT,
        }
    }
}

/// Rate limits (units/s) for the throttle and turn filters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LimitSet {
    pub throttle: f64,
    pub turn: f64,
}

impl Default for LimitSet {
    fn default() -> Self {
        Self {
            throttle: DEFAULT_THROTTLE_LIMIT,
            turn: DEFAULT_TURN_LIMIT,
        }
    }
}

/// Dashboard values read once at the top of a cycle.
/// Limits here are candidates and may be invalid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TuningSnapshot {
    pub mode: DriveMode,
    pub gains: GainSet,
    pub limits: LimitSet,
}

/// Everything one control cycle consumes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleInput {
    pub axes: AxisInput,
    pub tuning: TuningSnapshot,
    pub velocities: VelocityReading,
    /// Measured time since the previous cycle, in seconds
    pub dt: f64,
}

/// Outcome of offering a new limit to a filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitChange {
    Unchanged,
    Applied,
    /// Base is moving; retried on a later cycle
    Deferred,
    /// Invalid limit; the previous one stays in effect
    Rejected,
}

/// A rate limiter plus the last limit it refused, so a bad value is
/// reported once rather than every cycle
#[derive(Debug, Clone, Copy, PartialEq)]
struct FilterSlot {
    limiter: RateLimiter,
    rejected: Option<f64>,
}

impl FilterSlot {
    fn new(limit: f64) -> Result<Self, DriveError> {
        Ok(Self {
            limiter: RateLimiter::new(limit)?,
            rejected: None,
        })
    }

    fn reconfigure(&mut self, name: &str, candidate: f64, moving: bool) -> LimitChange {
        if candidate == self.limiter.limit() {
            self.rejected = None;
            return LimitChange::Unchanged;
        }
        if moving {
            debug!("{} filter change to {} deferred while moving", name, candidate);
            return LimitChange::Deferred;
        }
        match RateLimiter::new(candidate) {
            Ok(limiter) => {
                info!("{} filter limit {} -> {}", name, self.limiter.limit(), candidate);
                self.limiter = limiter;
                self.rejected = None;
                LimitChange::Applied
            }
            Err(e) => {
                // Bitwise so a repeated NaN counts as the same value
                if !self.rejected.is_some_and(|r| r.to_bits() == candidate.to_bits()) {
                    warn!("{} filter: {}; keeping {}", name, e, self.limiter.limit());
                    self.rejected = Some(candidate);
                }
                LimitChange::Rejected
            }
        }
    }
}

/// Mode, gains and filter state carried from one cycle to the next
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArbiterState {
    mode: DriveMode,
    gains: GainSet,
    throttle: FilterSlot,
    turn: FilterSlot,
    options: DriveOptions,
    last_output: MotorCommandPair,
}

impl ArbiterState {
    /// Start in the default mode with the configured gains and limits
    pub fn new(gains: GainSet, limits: LimitSet, options: DriveOptions) -> Result<Self, DriveError> {
        Ok(Self {
            mode: DriveMode::default(),
            gains,
            throttle: FilterSlot::new(limits.throttle)?,
            turn: FilterSlot::new(limits.turn)?,
            options,
            last_output: MotorCommandPair::zero(),
        })
    }

    pub fn mode(&self) -> DriveMode {
        self.mode
    }

    pub fn gains(&self) -> GainSet {
        self.gains
    }

    pub fn limits(&self) -> LimitSet {
        LimitSet {
            throttle: self.throttle.limiter.limit(),
            turn: self.turn.limiter.limit(),
        }
    }

    pub fn options(&self) -> DriveOptions {
        self.options
    }

    /// Filtered (throttle, turn) after the most recent cycle
    pub fn shaped(&self) -> (f64, f64) {
        (self.throttle.limiter.last_output(), self.turn.limiter.last_output())
    }

    pub fn last_output(&self) -> MotorCommandPair {
        self.last_output
    }

    /// Run one control cycle and return the motor commands with the next state
    pub fn step(mut self, input: &CycleInput) -> (MotorCommandPair, ArbiterState) {
        let tuning = &input.tuning;
        let moving = is_moving(&input.velocities);

        if tuning.mode != self.mode {
            info!("Drive mode {:?} -> {:?}", self.mode, tuning.mode);
            self.mode = tuning.mode;
        }

        // Gains scale the input, never the filter state, so they apply at once
        self.gains = tuning.gains;

        self.throttle.reconfigure("Throttle", tuning.limits.throttle, moving);
        self.turn.reconfigure("Turn", tuning.limits.turn, moving);

        let axes = &input.axes;
        let output = match self.mode {
            DriveMode::Tank => {
                // Right stick Y rides the turn filter as the right-side throttle
                let left = self.throttle.limiter.calculate(axes.left_y * self.gains.throttle, input.dt);
                let right = self.turn.limiter.calculate(axes.right_y * self.gains.throttle, input.dt);
                kinematics::tank(left, right, &self.options)
            }
            DriveMode::Arcade => {
                let (throttle, turn) = self.shape(axes, input.dt);
                kinematics::arcade(throttle, turn, &self.options)
            }
            DriveMode::Curvature => {
                let (throttle, turn) = self.shape(axes, input.dt);
                kinematics::curvature(throttle, turn, !moving, &self.options)
            }
        };

        self.last_output = output;
        (output, self)
    }

    fn shape(&mut self, axes: &AxisInput, dt: f64) -> (f64, f64) {
        let throttle = self.throttle.limiter.calculate(axes.left_y * self.gains.throttle, dt);
        let turn = self.turn.limiter.calculate(axes.right_x * self.gains.turn, dt);
        (throttle, turn)
    }
}

impl Default for ArbiterState {
    fn default() -> Self {
        Self::new(GainSet::default(), LimitSet::default(), DriveOptions::default())
            .expect("default rate limits are positive")
    }
}

/// Free-function form of `ArbiterState::step`
pub fn drive_cycle(state: ArbiterState, input: &CycleInput) -> (MotorCommandPair, ArbiterState) {
    state.step(input)
}
