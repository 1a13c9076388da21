//! Error types for the environmental grid cache.

use thiserror::Error;

/// Errors that can occur while building the cache.
///
/// The taxonomy is two-sided: transport problems (the request never produced
/// a usable body) and invalid-grid problems (the body arrived but cannot be
/// materialized). Both collapse to the single boolean failure signal that
/// [`crate::EnvGridCache::initialize`] reports to its caller; point
/// resolution itself never raises errors.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Network or protocol failure talking to the upstream grid service.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Upstream answered with a non-success HTTP status.
    #[error("upstream returned status {0}")]
    UpstreamStatus(reqwest::StatusCode),

    /// Upstream answered 200 but the payload carried an explicit error field.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Well-formed payload with missing or unusable mandatory data.
    #[error("invalid grid: {0}")]
    InvalidGrid(String),

    /// The response stream ended before the top-level grid object closed.
    #[error("response truncated before the grid object closed")]
    Truncated,

    /// Malformed JSON in the payload or one of its top-level values.
    #[error("malformed payload: {0}")]
    Payload(#[from] serde_json::Error),

    /// Invalid cache configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl CacheError {
    /// Create an InvalidGrid error.
    pub fn invalid_grid(msg: impl Into<String>) -> Self {
        Self::InvalidGrid(msg.into())
    }

    /// Whether this failure happened at the transport layer (as opposed to a
    /// payload that arrived but could not be used).
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::UpstreamStatus(_))
    }
}

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
