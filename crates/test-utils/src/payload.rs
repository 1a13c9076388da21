//! JSON payload builders shaped like upstream grid responses.

use serde_json::{json, Value};

/// All channel keys the upstream service emits, in wire order.
pub const CHANNEL_KEYS: [&str; 10] = [
    "depth",
    "wind_speed_mps_asc",
    "wind_cardinal_asc",
    "wind_speed_mps_dsc",
    "wind_cardinal_dsc",
    "current_speed_mps",
    "current_cardinal",
    "waves_height",
    "precipitation",
    "ice_conc",
];

/// Build a rows-by-cols JSON matrix from a cell function.
pub fn json_matrix(rows: usize, cols: usize, f: impl Fn(usize, usize) -> f64) -> Value {
    Value::Array(
        (0..rows)
            .map(|i| Value::Array((0..cols).map(|j| json!(f(i, j))).collect()))
            .collect(),
    )
}

/// A payload with axes and every channel fully populated.
///
/// Each channel's cell value is `base + i * 10 + j` where `base` is 100
/// times the channel's position in [`CHANNEL_KEYS`], so every (channel,
/// cell) pair is distinct and verifiable after ingestion.
pub fn full_payload_json(lats: &[f64], lons: &[f64]) -> Value {
    let mut object = json!({
        "lats": lats,
        "lons": lons,
    });
    let map = object.as_object_mut().unwrap();
    for (idx, key) in CHANNEL_KEYS.iter().enumerate() {
        let base = (idx * 100) as f64;
        map.insert(
            key.to_string(),
            json_matrix(lats.len(), lons.len(), |i, j| {
                base + (i * 10 + j) as f64
            }),
        );
    }
    object
}

/// An upstream failure payload.
pub fn error_payload_json(message: &str) -> Value {
    json!({ "error": message })
}
