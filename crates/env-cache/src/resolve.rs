//! Point resolution over a materialized grid.
//!
//! Resolution never fails: missing channels, rows, or cells map to the
//! documented defaults so a path search probing thousands of speculative
//! coordinates never halts on absent environmental data.

use crate::types::{is_present, Channel, Grid, MeasurementRecord, SENTINEL};

/// Degrees per cardinal step (8 compass octants).
const CARDINAL_STEP_DEG: f64 = 45.0;

/// Nearest index on a strictly ascending axis.
///
/// Binary search converges to the insertion point; on a miss the answer is
/// that index unless the previous element is at least as close, so ties
/// resolve toward the lower index. Out-of-range queries clamp to the end
/// indices. `None` only for an empty axis.
pub fn nearest_index(axis: &[f64], value: f64) -> Option<usize> {
    if axis.is_empty() {
        return None;
    }

    let low = axis.partition_point(|&x| x < value);
    if low == axis.len() {
        return Some(axis.len() - 1);
    }
    if low > 0 && (value - axis[low - 1]).abs() <= (axis[low] - value).abs() {
        Some(low - 1)
    } else {
        Some(low)
    }
}

/// Convert one wind pass (speed, cardinal) to a 2D vector.
///
/// Cardinal 0 is due north, which is bearing 90 in math convention, so the
/// angle is `(90 - cardinal * 45)` degrees.
fn cardinal_to_vector(speed: f64, cardinal: f64) -> (f64, f64) {
    let angle = (90.0 - cardinal * CARDINAL_STEP_DEG).to_radians();
    (speed * angle.cos(), speed * angle.sin())
}

/// Recover a cardinal in [0, 8) from a vector direction.
fn vector_to_cardinal(x: f64, y: f64) -> f64 {
    let angle_deg = y.atan2(x).to_degrees();
    let cardinal = ((90.0 - angle_deg) / CARDINAL_STEP_DEG).rem_euclid(8.0);
    // round() is the one rounding rule used for cardinals everywhere; 7.6
    // rounds up to 8, which wraps to 0.
    cardinal.round().rem_euclid(8.0)
}

/// Reconcile the ascending and descending wind passes into one
/// (speed, cardinal) pair.
///
/// True vector average: two opposing equal-speed passes collapse toward zero
/// net wind, which naive angle averaging would not do. A sentinel speed in
/// either pass, or two exactly-zero speeds, short-circuits to calm (0, 0).
pub fn reconcile_wind(
    asc_speed: f64,
    asc_cardinal: f64,
    dsc_speed: f64,
    dsc_cardinal: f64,
) -> (f64, f64) {
    if !is_present(asc_speed) || !is_present(dsc_speed) {
        return (0.0, 0.0);
    }
    if asc_speed == 0.0 && dsc_speed == 0.0 {
        return (0.0, 0.0);
    }

    // A present speed with a padded cardinal still contributes; the cardinal
    // falls back to 0 like every other non-depth field.
    let asc_cardinal = if is_present(asc_cardinal) { asc_cardinal } else { 0.0 };
    let dsc_cardinal = if is_present(dsc_cardinal) { dsc_cardinal } else { 0.0 };

    let (ax, ay) = cardinal_to_vector(asc_speed, asc_cardinal);
    let (dx, dy) = cardinal_to_vector(dsc_speed, dsc_cardinal);
    let x = (ax + dx) / 2.0;
    let y = (ay + dy) / 2.0;

    let speed = x.hypot(y);
    if speed == 0.0 {
        return (0.0, 0.0);
    }
    (speed, vector_to_cardinal(x, y))
}

/// Resolve a query coordinate against the grid.
///
/// Locates the nearest cell on each axis independently, then normalizes
/// every channel: raw values above the sentinel pass through (after wind
/// reconciliation and cardinal rounding), everything else becomes the
/// default (`None` for depth, 0 for the rest).
pub fn resolve_point(grid: &Grid, lat: f64, lon: f64) -> MeasurementRecord {
    let (Some(lat_idx), Some(lon_idx)) =
        (nearest_index(grid.lats(), lat), nearest_index(grid.lons(), lon))
    else {
        return MeasurementRecord::default();
    };

    let sample = |channel: Channel| grid.cell(channel, lat_idx, lon_idx).unwrap_or(SENTINEL);
    let normalized = |raw: f64| if is_present(raw) { raw } else { 0.0 };

    let depth_raw = sample(Channel::Depth);

    let (wind_speed, wind_cardinal) = reconcile_wind(
        sample(Channel::WindSpeedMpsAsc),
        sample(Channel::WindCardinalAsc),
        sample(Channel::WindSpeedMpsDsc),
        sample(Channel::WindCardinalDsc),
    );

    let current_cardinal = normalized(sample(Channel::CurrentCardinal))
        .round()
        .rem_euclid(8.0);

    MeasurementRecord {
        depth: is_present(depth_raw).then_some(depth_raw),
        wind_speed_mps: wind_speed,
        wind_direction_deg: wind_cardinal * CARDINAL_STEP_DEG,
        current_speed_mps: normalized(sample(Channel::CurrentSpeedMps)),
        current_direction_deg: current_cardinal * CARDINAL_STEP_DEG,
        waves_height_m: normalized(sample(Channel::WavesHeight)),
        weekly_precip_mean: normalized(sample(Channel::Precipitation)),
        ice_conc: normalized(sample(Channel::IceConc)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::XorShift64;

    const EPS: f64 = 1e-9;

    fn brute_force_nearest(axis: &[f64], value: f64) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (i, &x) in axis.iter().enumerate() {
            let better = match best {
                None => true,
                // Strict comparison keeps ties on the lower index.
                Some(b) => (x - value).abs() < (axis[b] - value).abs(),
            };
            if better {
                best = Some(i);
            }
        }
        best
    }

    #[test]
    fn test_nearest_index_empty_axis() {
        assert_eq!(nearest_index(&[], 1.0), None);
    }

    #[test]
    fn test_nearest_index_single_element() {
        let axis = [5.0];
        assert_eq!(nearest_index(&axis, -100.0), Some(0));
        assert_eq!(nearest_index(&axis, 5.0), Some(0));
        assert_eq!(nearest_index(&axis, 100.0), Some(0));
    }

    #[test]
    fn test_nearest_index_exact_match() {
        let axis = [1.0, 3.0, 7.0, 20.0];
        for (i, &x) in axis.iter().enumerate() {
            assert_eq!(nearest_index(&axis, x), Some(i));
        }
    }

    #[test]
    fn test_nearest_index_between_points() {
        let axis = [1.0, 3.0, 7.0, 20.0];
        assert_eq!(nearest_index(&axis, 1.5), Some(0));
        assert_eq!(nearest_index(&axis, 2.9), Some(1));
        assert_eq!(nearest_index(&axis, 6.0), Some(2));
        assert_eq!(nearest_index(&axis, 12.0), Some(2));
        assert_eq!(nearest_index(&axis, 14.0), Some(3));
    }

    #[test]
    fn test_nearest_index_out_of_range_clamps() {
        let axis = [1.0, 3.0, 7.0];
        assert_eq!(nearest_index(&axis, -50.0), Some(0));
        assert_eq!(nearest_index(&axis, 50.0), Some(2));
    }

    #[test]
    fn test_nearest_index_tie_resolves_lower() {
        let axis = [0.0, 2.0];
        assert_eq!(nearest_index(&axis, 1.0), Some(0));
    }

    #[test]
    fn test_nearest_index_matches_brute_force() {
        let mut rng = XorShift64::new(0x5eed_cafe);
        for _ in 0..200 {
            let len = (rng.next_u64() % 12) as usize;
            // Non-uniform strictly ascending axis.
            let mut axis = Vec::with_capacity(len);
            let mut x = rng.next_f64() * 20.0 - 90.0;
            for _ in 0..len {
                x += 0.01 + rng.next_f64() * 5.0;
                axis.push(x);
            }
            for _ in 0..50 {
                // Query well outside the range too.
                let q = rng.next_f64() * 260.0 - 130.0;
                assert_eq!(
                    nearest_index(&axis, q),
                    brute_force_nearest(&axis, q),
                    "axis={axis:?} q={q}"
                );
            }
        }
    }

    #[test]
    fn test_opposing_passes_cancel() {
        for cardinal in 0..8 {
            let opposite = ((cardinal + 4) % 8) as f64;
            let (speed, _) = reconcile_wind(12.0, cardinal as f64, 12.0, opposite);
            assert!(speed.abs() < EPS, "cardinal {cardinal}: speed {speed}");
        }
    }

    #[test]
    fn test_identical_passes_preserved() {
        for cardinal in 0..8 {
            let (speed, reconciled) =
                reconcile_wind(7.5, cardinal as f64, 7.5, cardinal as f64);
            assert!((speed - 7.5).abs() < EPS);
            assert_eq!(reconciled, cardinal as f64);
        }
    }

    #[test]
    fn test_cardinal_vector_round_trip() {
        for cardinal in 0..8 {
            let (x, y) = cardinal_to_vector(3.0, cardinal as f64);
            assert_eq!(vector_to_cardinal(x, y), cardinal as f64);
        }
    }

    #[test]
    fn test_sentinel_pass_means_calm() {
        assert_eq!(reconcile_wind(SENTINEL, 2.0, 10.0, 2.0), (0.0, 0.0));
        assert_eq!(reconcile_wind(10.0, 2.0, SENTINEL, 2.0), (0.0, 0.0));
    }

    #[test]
    fn test_both_zero_speeds_mean_calm() {
        assert_eq!(reconcile_wind(0.0, 3.0, 0.0, 5.0), (0.0, 0.0));
    }

    #[test]
    fn test_one_zero_pass_halves_the_other() {
        let (speed, cardinal) = reconcile_wind(10.0, 2.0, 0.0, 6.0);
        assert!((speed - 5.0).abs() < EPS);
        assert_eq!(cardinal, 2.0);
    }

    #[test]
    fn test_adjacent_cardinals_average_between() {
        // Cardinals 1 and 3 at equal speed average to cardinal 2.
        let (speed, cardinal) = reconcile_wind(10.0, 1.0, 10.0, 3.0);
        assert!(speed > 0.0 && speed < 10.0);
        assert_eq!(cardinal, 2.0);
    }
}
