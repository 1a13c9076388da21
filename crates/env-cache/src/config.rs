//! Configuration for the environmental grid cache.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default bounding-box padding in degrees.
pub const DEFAULT_PADDING_DEG: f64 = 5.0;

/// Default sampling interval for debug logging of resolved records.
pub const DEFAULT_DEBUG_SAMPLE_INTERVAL: u64 = 500;

/// Configuration for one cache instance.
///
/// The padding constant and the debug sample interval are tuning parameters,
/// not contracts; both are exposed here rather than hard-coded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Upstream grid-service endpoint URL.
    pub endpoint: String,

    /// Degrees of padding applied around the voyage endpoints.
    pub padding_deg: f64,

    /// How the response body is turned into a grid.
    pub strategy: IngestStrategy,

    /// Log one resolved record every N queries (0 disables sampling).
    pub debug_sample_interval: u64,

    /// Overall HTTP request timeout.
    pub request_timeout: Duration,

    /// TCP connect timeout.
    pub connect_timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8000/get-data-grid/".to_string(),
            padding_deg: DEFAULT_PADDING_DEG,
            strategy: IngestStrategy::Buffered,
            debug_sample_interval: DEFAULT_DEBUG_SAMPLE_INTERVAL,
            request_timeout: Duration::from_secs(120),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl CacheConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("ENV_GRID_ENDPOINT") {
            if !val.is_empty() {
                config.endpoint = val;
            }
        }

        if let Ok(val) = std::env::var("ENV_GRID_PADDING_DEG") {
            if let Ok(padding) = val.parse() {
                config.padding_deg = padding;
            }
        }

        if let Ok(val) = std::env::var("ENV_GRID_INGEST_STRATEGY") {
            config.strategy = IngestStrategy::from_str(&val);
        }

        if let Ok(val) = std::env::var("ENV_GRID_DEBUG_SAMPLE") {
            if let Ok(interval) = val.parse() {
                config.debug_sample_interval = interval;
            }
        }

        if let Ok(val) = std::env::var("ENV_GRID_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse() {
                config.request_timeout = Duration::from_secs(secs);
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.endpoint.is_empty() {
            return Err("endpoint must not be empty".to_string());
        }

        if !self.padding_deg.is_finite() || self.padding_deg < 0.0 {
            return Err("padding_deg must be finite and >= 0".to_string());
        }

        if self.request_timeout.is_zero() {
            return Err("request_timeout must be > 0".to_string());
        }

        Ok(())
    }
}

/// How the upstream response body is materialized into a grid.
///
/// The two strategies are functionally equivalent; the choice trades peak
/// memory against implementation complexity. Both live behind the single
/// [`crate::fetch::GridFetcher`] seam so the point resolver never knows
/// which one ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IngestStrategy {
    /// Read the whole body into memory, then parse it once. Peak memory is
    /// O(payload) plus parse overhead.
    Buffered,
    /// Assemble the top-level object key by key from the byte stream. Peak
    /// memory is O(largest single channel).
    Streaming,
}

impl Default for IngestStrategy {
    fn default() -> Self {
        Self::Buffered
    }
}

impl IngestStrategy {
    /// Parse from string (case-insensitive). Unknown values fall back to
    /// buffered.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "streaming" | "stream" | "incremental" => Self::Streaming,
            _ => Self::Buffered,
        }
    }

    /// Name as used in configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buffered => "buffered",
            Self::Streaming => "streaming",
        }
    }
}

impl std::fmt::Display for IngestStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
