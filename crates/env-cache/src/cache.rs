//! The per-voyage cache facade.

use chrono::NaiveDate;
use tracing::{debug, error, info};

use crate::bounds::voyage_bounds;
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::fetch::{GridFetcher, GridRequest, HttpGridFetcher};
use crate::resolve::resolve_point;
use crate::types::{BoundingBox, Grid, LatLon, MeasurementRecord, ResolveStats};

/// In-memory environmental grid cache for one voyage.
///
/// Constructed from two endpoint coordinates and a reference date; holds the
/// padded bounding box from the start, fetches the grid once on
/// [`initialize`](Self::initialize), and then answers
/// [`resolve`](Self::resolve) queries from memory in constant time.
///
/// Exactly two states: uninitialized (grid absent, every resolve returns the
/// all-default record) and ready (grid present and immutable). The
/// transition happens once; a new voyage gets a new cache instance rather
/// than sharing or reinitializing this one, so concurrent voyages can never
/// overwrite each other's grids.
pub struct EnvGridCache {
    config: CacheConfig,
    fetcher: Box<dyn GridFetcher>,
    request: GridRequest,
    grid: Option<Grid>,
    stats: ResolveStats,
}

impl EnvGridCache {
    /// Create a cache for the voyage between `start` and `end` on `date`,
    /// talking HTTP to the configured upstream endpoint.
    pub fn new(start: LatLon, end: LatLon, date: NaiveDate, config: CacheConfig) -> Result<Self> {
        config.validate().map_err(CacheError::Config)?;
        let fetcher = Box::new(HttpGridFetcher::new(&config)?);
        Ok(Self::with_fetcher(start, end, date, config, fetcher))
    }

    /// Create a cache with an explicit fetcher implementation.
    ///
    /// This is the seam tests (and any non-HTTP transport) plug into.
    pub fn with_fetcher(
        start: LatLon,
        end: LatLon,
        date: NaiveDate,
        config: CacheConfig,
        fetcher: Box<dyn GridFetcher>,
    ) -> Self {
        let bbox = voyage_bounds(start, end, config.padding_deg);
        Self {
            request: GridRequest::new(bbox, date),
            config,
            fetcher,
            grid: None,
            stats: ResolveStats::default(),
        }
    }

    /// The padded fetch region for this voyage.
    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::new(
            self.request.min_lat,
            self.request.max_lat,
            self.request.min_lon,
            self.request.max_lon,
        )
    }

    /// Whether a grid is resident.
    pub fn is_ready(&self) -> bool {
        self.grid.is_some()
    }

    /// Diagnostic counters for this cache instance.
    pub fn stats(&self) -> &ResolveStats {
        &self.stats
    }

    /// Fetch and materialize the grid. One attempt, no retry; the caller
    /// owns backoff decisions.
    ///
    /// Returns `true` on success. On failure the grid stays absent and
    /// every later [`resolve`](Self::resolve) degrades to the all-default
    /// record. The grid field is only assigned after full validation, so a
    /// cancelled or failed ingestion can never leave a half-filled grid
    /// visible to queries.
    pub async fn initialize(&mut self) -> bool {
        match self.try_initialize().await {
            Ok(()) => true,
            Err(err) => {
                error!(error = %err, transport = err.is_transport(), "grid ingestion failed");
                false
            }
        }
    }

    async fn try_initialize(&mut self) -> Result<()> {
        let payload = self.fetcher.fetch(&self.request).await?;
        let grid = Grid::from_payload(payload)?;
        let (rows, cols) = grid.shape();
        info!(rows, cols, "grid ingested");
        self.grid = Some(grid);
        Ok(())
    }

    /// Resolve a query coordinate to a normalized measurement record.
    ///
    /// Synchronous, never fails, and safe to call from multiple readers once
    /// the cache is ready: the grid is immutable after ingestion, so reads
    /// take no locks.
    pub fn resolve(&self, lat: f64, lon: f64) -> MeasurementRecord {
        let record = match &self.grid {
            Some(grid) => resolve_point(grid, lat, lon),
            None => {
                self.stats.record_uninitialized();
                MeasurementRecord::default()
            }
        };

        let count = self.stats.record_resolve();
        let interval = self.config.debug_sample_interval;
        if interval > 0 && count % interval == 0 {
            debug!(lat, lon, ?record, count, "resolved sample");
        }

        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::GridFetcher;
    use crate::testdata;
    use crate::types::GridPayload;
    use async_trait::async_trait;

    struct FixedFetcher(GridPayload);

    #[async_trait]
    impl GridFetcher for FixedFetcher {
        async fn fetch(&self, _request: &GridRequest) -> Result<GridPayload> {
            Ok(self.0.clone())
        }
    }

    struct FailingFetcher;

    #[async_trait]
    impl GridFetcher for FailingFetcher {
        async fn fetch(&self, _request: &GridRequest) -> Result<GridPayload> {
            Err(CacheError::Truncated)
        }
    }

    fn cache_with(payload: GridPayload) -> EnvGridCache {
        EnvGridCache::with_fetcher(
            LatLon::new(10.0, 10.0),
            LatLon::new(20.0, 20.0),
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            CacheConfig::default(),
            Box::new(FixedFetcher(payload)),
        )
    }

    #[tokio::test]
    async fn test_initialize_and_resolve() {
        let mut cache = cache_with(testdata::full_payload());
        assert!(!cache.is_ready());
        assert!(cache.initialize().await);
        assert!(cache.is_ready());

        let record = cache.resolve(10.0, 20.0);
        assert!(record.depth.is_some());
        assert_eq!(cache.stats().resolves(), 1);
        assert_eq!(cache.stats().uninitialized_hits(), 0);
    }

    #[tokio::test]
    async fn test_resolve_before_initialize_is_all_defaults() {
        let cache = cache_with(testdata::full_payload());
        assert_eq!(cache.resolve(10.0, 20.0), MeasurementRecord::default());
        assert_eq!(cache.stats().uninitialized_hits(), 1);
    }

    #[tokio::test]
    async fn test_failed_ingestion_degrades_gracefully() {
        let mut cache = EnvGridCache::with_fetcher(
            LatLon::new(0.0, 0.0),
            LatLon::new(1.0, 1.0),
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            CacheConfig::default(),
            Box::new(FailingFetcher),
        );
        assert!(!cache.initialize().await);
        assert!(!cache.is_ready());
        assert_eq!(cache.resolve(0.5, 0.5), MeasurementRecord::default());
    }

    #[tokio::test]
    async fn test_upstream_error_field_fails_initialize() {
        let payload = GridPayload {
            error: Some("no coverage".to_string()),
            ..Default::default()
        };
        let mut cache = cache_with(payload);
        assert!(!cache.initialize().await);
        assert_eq!(cache.resolve(12.0, 12.0), MeasurementRecord::default());
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = CacheConfig::default();
        config.endpoint.clear();
        let result = EnvGridCache::new(
            LatLon::new(0.0, 0.0),
            LatLon::new(1.0, 1.0),
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            config,
        );
        assert!(matches!(result, Err(CacheError::Config(_))));
    }

    #[test]
    fn test_bounds_are_padded() {
        let cache = cache_with(testdata::full_payload());
        let bbox = cache.bounds();
        assert_eq!(bbox.min_lat, 5.0);
        assert_eq!(bbox.max_lat, 25.0);
        assert_eq!(bbox.min_lon, 5.0);
        assert_eq!(bbox.max_lon, 25.0);
    }
}
