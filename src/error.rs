// Error types for the drive core and the zenoh host

/// Errors raised while configuring the drive core
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DriveError {
    #[error("Rate limit must be positive and finite, got {limit}")]
    InvalidRateLimit { limit: f64 },
}

/// Errors raised by the runtime host
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("Zenoh error: {0}")]
    Zenoh(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RuntimeError {
    /// Zenoh hands out boxed errors, which cannot be used as a `#[source]`
    pub fn zenoh(err: impl std::fmt::Display) -> Self {
        RuntimeError::Zenoh(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
