// Slew-rate limiter for a single scalar channel
//
// Output moves toward the input by at most `limit * dt` per call, in
// either direction. State starts at zero.

use crate::error::DriveError;

/// Bounds how fast a signal may change per unit time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimiter {
    limit: f64,
    last_output: f64,
}

impl RateLimiter {
    /// Create a limiter allowing at most `limit` units of change per second
    pub fn new(limit: f64) -> Result<Self, DriveError> {
        if !limit.is_finite() || limit <= 0.0 {
            return Err(DriveError::InvalidRateLimit { limit });
        }
        Ok(Self {
            limit,
            last_output: 0.0,
        })
    }

    /// Step the filter by `dt` seconds toward `input` and return the new output
    pub fn calculate(&mut self, input: f64, dt: f64) -> f64 {
        let max_step = self.limit * dt.max(0.0);
        let delta = (input - self.last_output).clamp(-max_step, max_step);
        self.last_output += delta;
        self.last_output
    }

    /// Force the output to `value`, e.g. after an external stop
    pub fn reset(&mut self, value: f64) {
        self.last_output = value;
    }

    pub fn limit(&self) -> f64 {
        self.limit
    }

    pub fn last_output(&self) -> f64 {
        self.last_output
    }
}
