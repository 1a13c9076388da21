//! Voyage bounding-box derivation.

use crate::types::{BoundingBox, LatLon};

/// Derive the padded fetch region for a voyage between two endpoints.
///
/// Padding gives the downstream path search room to route around the direct
/// great-circle line. Latitudes are clamped to the valid range; longitudes
/// are left unclamped so the upstream service can interpret dateline
/// crossings (`min_lon > max_lon`) itself.
pub fn voyage_bounds(a: LatLon, b: LatLon, padding_deg: f64) -> BoundingBox {
    BoundingBox {
        min_lat: (a.lat.min(b.lat) - padding_deg).clamp(-90.0, 90.0),
        max_lat: (a.lat.max(b.lat) + padding_deg).clamp(-90.0, 90.0),
        min_lon: a.lon.min(b.lon) - padding_deg,
        max_lon: a.lon.max(b.lon) + padding_deg,
    }
}
