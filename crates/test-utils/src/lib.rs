//! Shared test utilities for the voyage-env-cache workspace.
//!
//! Provides deterministic pseudo-random generation (no external rand
//! dependency) and JSON payload builders shaped like the upstream grid
//! service's responses.

pub mod payload;
pub mod rng;

// Re-export commonly used items at the crate root
pub use payload::*;
pub use rng::XorShift64;
