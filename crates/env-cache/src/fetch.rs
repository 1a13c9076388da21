//! Upstream grid fetching.
//!
//! One POST to the grid service per voyage, carrying the padded bounding box
//! and the reference date. The service resolves the date to its own sampling
//! window (weekly fields snap to the preceding Sunday upstream); those
//! semantics are opaque here.

use async_trait::async_trait;
use chrono::NaiveDate;
use futures::StreamExt;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use crate::assemble::ObjectAssembler;
use crate::config::{CacheConfig, IngestStrategy};
use crate::error::{CacheError, Result};
use crate::types::{BoundingBox, GridPayload};

/// The request body sent to the upstream grid service.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct GridRequest {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
    /// ISO-8601 reference date for the voyage.
    pub date: NaiveDate,
}

impl GridRequest {
    pub fn new(bbox: BoundingBox, date: NaiveDate) -> Self {
        Self {
            min_lat: bbox.min_lat,
            min_lon: bbox.min_lon,
            max_lat: bbox.max_lat,
            max_lon: bbox.max_lon,
            date,
        }
    }
}

/// Seam between the cache and its transport.
///
/// One attempt per call; retry and backoff belong to the caller. The mock
/// implementations in tests plug in here.
#[async_trait]
pub trait GridFetcher: Send + Sync {
    /// Fetch and materialize the raw payload for one bounding box + date.
    async fn fetch(&self, request: &GridRequest) -> Result<GridPayload>;
}

/// HTTP fetcher against the configured upstream endpoint.
pub struct HttpGridFetcher {
    client: Client,
    endpoint: String,
    strategy: IngestStrategy,
}

impl HttpGridFetcher {
    /// Build a fetcher from the cache configuration.
    pub fn new(config: &CacheConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .tcp_nodelay(true)
            .build()
            .map_err(CacheError::Transport)?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            strategy: config.strategy,
        })
    }

    /// Override the ingestion strategy (primarily for tests comparing both).
    pub fn with_strategy(mut self, strategy: IngestStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    async fn send(&self, request: &GridRequest) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CacheError::UpstreamStatus(status));
        }
        Ok(response)
    }

    /// Buffer-whole-body strategy: one allocation of the full payload, one
    /// parse.
    async fn fetch_buffered(&self, request: &GridRequest) -> Result<GridPayload> {
        let response = self.send(request).await?;
        let body: bytes::Bytes = response.bytes().await?;
        debug!(bytes = body.len(), "buffered grid payload");
        Ok(serde_json::from_slice(&body)?)
    }

    /// Incremental-assembly strategy: feed body chunks to the top-level
    /// object assembler, never holding the whole raw payload.
    async fn fetch_streaming(&self, request: &GridRequest) -> Result<GridPayload> {
        let response = self.send(request).await?;
        let mut stream = response.bytes_stream();
        let mut assembler = ObjectAssembler::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(CacheError::Transport)?;
            assembler.push(&chunk)?;
        }

        debug!(bytes = assembler.bytes_seen(), "assembled grid payload");
        assembler.finish()
    }
}

#[async_trait]
impl GridFetcher for HttpGridFetcher {
    async fn fetch(&self, request: &GridRequest) -> Result<GridPayload> {
        match self.strategy {
            IngestStrategy::Buffered => self.fetch_buffered(request).await,
            IngestStrategy::Streaming => self.fetch_streaming(request).await,
        }
    }
}
