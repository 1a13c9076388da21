//! Test payload builders.
//!
//! Small fully-populated payloads with known per-channel values, used by the
//! unit tests here and by the integration suites. Kept in the library so
//! both can share them.

use crate::types::{Channel, ChannelRows, GridPayload};

/// Build a fully-present channel matrix from a cell function.
pub fn matrix(rows: usize, cols: usize, f: impl Fn(usize, usize) -> f64) -> ChannelRows {
    (0..rows)
        .map(|i| Some((0..cols).map(|j| Some(f(i, j))).collect()))
        .collect()
}

/// A payload carrying only the axes.
pub fn axes_payload(lats: Vec<f64>, lons: Vec<f64>) -> GridPayload {
    GridPayload {
        lats: Some(lats),
        lons: Some(lons),
        ..Default::default()
    }
}

/// The constant used for every wind-speed cell in [`full_payload`].
pub const TEST_WIND_SPEED: f64 = 5.0;
/// The cardinal used for every wind pass in [`full_payload`] (due east).
pub const TEST_WIND_CARDINAL: f64 = 2.0;

/// A 3x3 payload covering the default test voyage (10,10)-(20,20), with
/// every channel, row, and cell present.
///
/// Depth encodes its cell as `-(100 + 10*i + j)` so reads are verifiable.
pub fn full_payload() -> GridPayload {
    full_payload_with_axes(vec![8.0, 10.0, 12.0], vec![18.0, 20.0, 22.0])
}

/// Like [`full_payload`] but over explicit axes.
pub fn full_payload_with_axes(lats: Vec<f64>, lons: Vec<f64>) -> GridPayload {
    let rows = lats.len();
    let cols = lons.len();
    let mut payload = axes_payload(lats, lons);

    for channel in Channel::ALL {
        let filled = match channel {
            Channel::Depth => matrix(rows, cols, |i, j| -(100.0 + 10.0 * i as f64 + j as f64)),
            Channel::WindSpeedMpsAsc | Channel::WindSpeedMpsDsc => {
                matrix(rows, cols, |_, _| TEST_WIND_SPEED)
            }
            Channel::WindCardinalAsc | Channel::WindCardinalDsc => {
                matrix(rows, cols, |_, _| TEST_WIND_CARDINAL)
            }
            Channel::CurrentSpeedMps => matrix(rows, cols, |_, _| 1.5),
            Channel::CurrentCardinal => matrix(rows, cols, |_, _| 4.0),
            Channel::WavesHeight => matrix(rows, cols, |_, _| 2.5),
            Channel::Precipitation => matrix(rows, cols, |_, _| 12.0),
            Channel::IceConc => matrix(rows, cols, |_, _| 0.25),
        };
        *payload.channel_slot(channel) = Some(filled);
    }

    payload
}
