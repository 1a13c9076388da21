//! In-memory environmental grid cache for voyage routing.
//!
//! Fetches a two-dimensional grid of physical measurements (bathymetric
//! depth, wind, ocean current, wave height, precipitation, sea-ice
//! concentration) for a padded geographic bounding region, holds it entirely
//! in memory, and answers point queries in constant time for a path-search
//! consumer that probes thousands of coordinates per route.
//!
//! # Architecture
//!
//! ```text
//! EnvGridCache::new(start, end, date, config)
//!      │
//!      ├─► bounds::voyage_bounds      padded, lat-clamped bounding box
//!      │
//! initialize().await
//!      │
//!      ├─► fetch::GridFetcher        one POST {bbox, date} to upstream
//!      │         │
//!      │         ├─► Buffered: whole body, one parse
//!      │         └─► Streaming: assemble::ObjectAssembler, key by key
//!      │
//!      └─► Grid::from_payload        validate axes, keep sparse channels
//!               │
//! resolve(lat, lon)                  synchronous, lock-free, never fails
//!      │
//!      ├─► nearest index per axis (binary search, ties to lower)
//!      ├─► sparse cell lookup per channel
//!      ├─► wind vector reconciliation (asc/dsc passes)
//!      └─► sentinel normalization → MeasurementRecord
//! ```
//!
//! The grid is immutable once resident, so `resolve` is safe under
//! concurrent readers without locking. A failed or cancelled ingestion
//! leaves the cache uninitialized; queries then degrade to the all-default
//! record instead of erroring.
//!
//! # Example
//!
//! ```ignore
//! use env_cache::{CacheConfig, EnvGridCache, LatLon};
//!
//! let config = CacheConfig::from_env();
//! let mut cache = EnvGridCache::new(
//!     LatLon::new(48.5, -5.1),
//!     LatLon::new(43.4, -9.9),
//!     chrono::NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
//!     config,
//! )?;
//!
//! if cache.initialize().await {
//!     let record = cache.resolve(45.2, -7.3);
//!     // feed record into the path search
//! }
//! ```

pub mod assemble;
pub mod bounds;
pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod resolve;
pub mod testdata;
pub mod types;

// Re-export commonly used types at crate root
pub use bounds::voyage_bounds;
pub use cache::EnvGridCache;
pub use config::{CacheConfig, IngestStrategy, DEFAULT_PADDING_DEG};
pub use error::{CacheError, Result};
pub use fetch::{GridFetcher, GridRequest, HttpGridFetcher};
pub use resolve::{nearest_index, reconcile_wind, resolve_point};
pub use types::{
    BoundingBox, Channel, Grid, GridPayload, LatLon, MeasurementRecord, ResolveStats, SENTINEL,
};
