//! Core types for the environmental grid cache.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{CacheError, Result};

/// Reserved value marking an absent measurement cell in raw channel data.
///
/// Upstream pads masked cells with this value; it never appears in a
/// [`MeasurementRecord`].
pub const SENTINEL: f64 = -9999.0;

/// Whether a raw cell value carries a real measurement.
pub fn is_present(value: f64) -> bool {
    value > SENTINEL
}

/// A geographic coordinate in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// A padded geographic bounding box for one voyage.
///
/// Latitudes are clamped to [-90, 90]. Longitudes are deliberately left
/// unclamped: the upstream service interprets `min_lon > max_lon` as a
/// dateline crossing, so wrap handling belongs to it, not to the cache.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// Create a new bounding box from its corner ordinates.
    pub fn new(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> Self {
        Self {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        }
    }

    /// Height of the box in degrees of latitude.
    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// Width of the box in degrees of longitude.
    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }
}

/// The ten measurement channels carried by an upstream grid payload.
///
/// Variant names serde-rename to the exact wire keys (e.g.
/// `wind_speed_mps_asc`). Ascending/descending refer to the two independent
/// satellite overpasses that each sample wind at a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Depth,
    WindSpeedMpsAsc,
    WindCardinalAsc,
    WindSpeedMpsDsc,
    WindCardinalDsc,
    CurrentSpeedMps,
    CurrentCardinal,
    WavesHeight,
    Precipitation,
    IceConc,
}

impl Channel {
    /// All channels, in wire order.
    pub const ALL: [Channel; 10] = [
        Channel::Depth,
        Channel::WindSpeedMpsAsc,
        Channel::WindCardinalAsc,
        Channel::WindSpeedMpsDsc,
        Channel::WindCardinalDsc,
        Channel::CurrentSpeedMps,
        Channel::CurrentCardinal,
        Channel::WavesHeight,
        Channel::Precipitation,
        Channel::IceConc,
    ];

    /// The JSON key this channel uses on the wire.
    pub fn key(&self) -> &'static str {
        match self {
            Channel::Depth => "depth",
            Channel::WindSpeedMpsAsc => "wind_speed_mps_asc",
            Channel::WindCardinalAsc => "wind_cardinal_asc",
            Channel::WindSpeedMpsDsc => "wind_speed_mps_dsc",
            Channel::WindCardinalDsc => "wind_cardinal_dsc",
            Channel::CurrentSpeedMps => "current_speed_mps",
            Channel::CurrentCardinal => "current_cardinal",
            Channel::WavesHeight => "waves_height",
            Channel::Precipitation => "precipitation",
            Channel::IceConc => "ice_conc",
        }
    }

    /// Parse a wire key back into a channel.
    pub fn from_key(key: &str) -> Option<Channel> {
        Channel::ALL.iter().copied().find(|c| c.key() == key)
    }
}

/// Raw rows for one channel: any row or cell may be absent.
///
/// Rows may also be shorter than the longitude axis; lookups bounds-check
/// rather than assume rectangularity.
pub type ChannelRows = Vec<Option<Vec<Option<f64>>>>;

/// The wire shape of an upstream grid response, before validation.
///
/// Every field is optional because sparse upstream data is expected: a
/// channel whose source file failed to load upstream is simply omitted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GridPayload {
    /// Explicit upstream failure message; presence means ingestion failed.
    pub error: Option<String>,
    /// Strictly ascending latitude axis.
    pub lats: Option<Vec<f64>>,
    /// Strictly ascending longitude axis.
    pub lons: Option<Vec<f64>>,
    pub depth: Option<ChannelRows>,
    pub wind_speed_mps_asc: Option<ChannelRows>,
    pub wind_cardinal_asc: Option<ChannelRows>,
    pub wind_speed_mps_dsc: Option<ChannelRows>,
    pub wind_cardinal_dsc: Option<ChannelRows>,
    pub current_speed_mps: Option<ChannelRows>,
    pub current_cardinal: Option<ChannelRows>,
    pub waves_height: Option<ChannelRows>,
    pub precipitation: Option<ChannelRows>,
    pub ice_conc: Option<ChannelRows>,
}

impl GridPayload {
    /// Mutable slot for one channel's rows.
    pub fn channel_slot(&mut self, channel: Channel) -> &mut Option<ChannelRows> {
        match channel {
            Channel::Depth => &mut self.depth,
            Channel::WindSpeedMpsAsc => &mut self.wind_speed_mps_asc,
            Channel::WindCardinalAsc => &mut self.wind_cardinal_asc,
            Channel::WindSpeedMpsDsc => &mut self.wind_speed_mps_dsc,
            Channel::WindCardinalDsc => &mut self.wind_cardinal_dsc,
            Channel::CurrentSpeedMps => &mut self.current_speed_mps,
            Channel::CurrentCardinal => &mut self.current_cardinal,
            Channel::WavesHeight => &mut self.waves_height,
            Channel::Precipitation => &mut self.precipitation,
            Channel::IceConc => &mut self.ice_conc,
        }
    }

    /// Apply one raw top-level `"key": value` pair from the wire.
    ///
    /// Used by the incremental assembler, which hands over each completed
    /// top-level value as an undecoded JSON slice. Unknown keys are ignored.
    pub fn apply_raw(&mut self, key: &str, raw: &[u8]) -> serde_json::Result<()> {
        match key {
            "error" => self.error = serde_json::from_slice(raw)?,
            "lats" => self.lats = serde_json::from_slice(raw)?,
            "lons" => self.lons = serde_json::from_slice(raw)?,
            _ => {
                if let Some(channel) = Channel::from_key(key) {
                    *self.channel_slot(channel) = serde_json::from_slice(raw)?;
                }
            }
        }
        Ok(())
    }
}

/// An immutable, validated grid snapshot.
///
/// Built once by ingestion and never mutated afterwards, which is what makes
/// lock-free concurrent reads safe. Replaced wholesale by constructing a new
/// cache for a new voyage.
#[derive(Debug, Clone)]
pub struct Grid {
    lats: Vec<f64>,
    lons: Vec<f64>,
    channels: HashMap<Channel, ChannelRows>,
}

impl Grid {
    /// Validate and materialize a wire payload.
    ///
    /// Fails if the payload carries an explicit error, if either axis is
    /// missing or empty, or if an axis is not strictly ascending. Channel
    /// arrays are kept as-is; sparse or ragged channel data is legal and
    /// handled at lookup time.
    pub fn from_payload(mut payload: GridPayload) -> Result<Self> {
        if let Some(message) = payload.error {
            return Err(CacheError::Upstream(message));
        }

        let lats = payload
            .lats
            .take()
            .filter(|axis| !axis.is_empty())
            .ok_or_else(|| CacheError::invalid_grid("lats axis missing or empty"))?;
        let lons = payload
            .lons
            .take()
            .filter(|axis| !axis.is_empty())
            .ok_or_else(|| CacheError::invalid_grid("lons axis missing or empty"))?;

        ensure_ascending(&lats, "lats")?;
        ensure_ascending(&lons, "lons")?;

        let mut channels = HashMap::new();
        for channel in Channel::ALL {
            if let Some(rows) = payload.channel_slot(channel).take() {
                if rows.len() != lats.len() {
                    warn!(
                        channel = channel.key(),
                        rows = rows.len(),
                        lats = lats.len(),
                        "channel row count does not match latitude axis"
                    );
                }
                channels.insert(channel, rows);
            }
        }

        Ok(Self {
            lats,
            lons,
            channels,
        })
    }

    /// The latitude axis (strictly ascending).
    pub fn lats(&self) -> &[f64] {
        &self.lats
    }

    /// The longitude axis (strictly ascending).
    pub fn lons(&self) -> &[f64] {
        &self.lons
    }

    /// Grid dimensions as (lat points, lon points).
    pub fn shape(&self) -> (usize, usize) {
        (self.lats.len(), self.lons.len())
    }

    /// Whether this channel arrived at all.
    pub fn has_channel(&self, channel: Channel) -> bool {
        self.channels.contains_key(&channel)
    }

    /// Sparse cell lookup.
    ///
    /// Returns the stored value only if the channel, its row, and the cell
    /// all exist; `None` otherwise. A returned value may still be the
    /// sentinel if upstream padded the cell, so callers gate on
    /// [`is_present`] before using it.
    pub fn cell(&self, channel: Channel, lat_idx: usize, lon_idx: usize) -> Option<f64> {
        self.channels
            .get(&channel)?
            .get(lat_idx)?
            .as_ref()?
            .get(lon_idx)
            .copied()
            .flatten()
    }
}

fn ensure_ascending(axis: &[f64], name: &str) -> Result<()> {
    if axis.windows(2).all(|pair| pair[0] < pair[1]) {
        Ok(())
    } else {
        Err(CacheError::InvalidGrid(format!(
            "{name} axis is not strictly ascending"
        )))
    }
}

/// Per-point query result with every channel normalized.
///
/// Ephemeral: constructed fresh on every [`crate::EnvGridCache::resolve`]
/// call. Missing data maps to documented defaults, never to the sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MeasurementRecord {
    /// Bathymetric depth in meters, `None` when the cell is missing.
    pub depth: Option<f64>,
    /// Reconciled wind speed from both satellite passes.
    pub wind_speed_mps: f64,
    /// Reconciled wind direction in degrees, in [0, 360).
    pub wind_direction_deg: f64,
    pub current_speed_mps: f64,
    /// Current direction in degrees, in [0, 360).
    pub current_direction_deg: f64,
    pub waves_height_m: f64,
    pub weekly_precip_mean: f64,
    pub ice_conc: f64,
}

impl Default for MeasurementRecord {
    fn default() -> Self {
        Self {
            depth: None,
            wind_speed_mps: 0.0,
            wind_direction_deg: 0.0,
            current_speed_mps: 0.0,
            current_direction_deg: 0.0,
            waves_height_m: 0.0,
            weekly_precip_mean: 0.0,
            ice_conc: 0.0,
        }
    }
}

/// Diagnostic counters for point resolution.
///
/// Purely observational; sampled debug logging and these counters may be
/// dropped entirely without affecting correctness. Atomics so `resolve`
/// stays `&self` and safe under concurrent readers.
#[derive(Debug, Default)]
pub struct ResolveStats {
    resolves: AtomicU64,
    uninitialized_hits: AtomicU64,
}

impl ResolveStats {
    /// Count one resolve call; returns the running total.
    pub fn record_resolve(&self) -> u64 {
        self.resolves.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Count one resolve that ran against an uninitialized grid.
    pub fn record_uninitialized(&self) {
        self.uninitialized_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Total resolve calls so far.
    pub fn resolves(&self) -> u64 {
        self.resolves.load(Ordering::Relaxed)
    }

    /// Resolve calls answered with the all-default record because the grid
    /// never initialized.
    pub fn uninitialized_hits(&self) -> u64 {
        self.uninitialized_hits.load(Ordering::Relaxed)
    }
}
