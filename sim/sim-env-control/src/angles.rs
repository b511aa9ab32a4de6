//! Angle helpers for cyclic DOFs.

use std::f64::consts::{PI, TAU};

use sim_env_types::Limits;

/// Wrap an angle into `(-π, π]`.
#[must_use]
pub fn normalize_orientation(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped > PI {
        wrapped - TAU
    } else {
        wrapped
    }
}

/// Signed rotation of smallest magnitude taking `from` to `to`.
///
/// Both angles are expected in `(-π, π]`; the result then lies in
/// `[-π, π]`.
#[must_use]
pub fn shortest_so2_direction(from: f64, to: f64) -> f64 {
    let delta = to - from;
    if delta.abs() <= PI {
        delta
    } else if delta > 0.0 {
        delta - TAU
    } else {
        delta + TAU
    }
}

/// Position error of a cyclic DOF whose positions wrap over `range`.
///
/// Picks whichever of the direct error, the error going past `range.max`,
/// and the error going past `range.min` has the smallest magnitude. An
/// unlimited range is treated as `(-π, π)`.
#[must_use]
pub fn cyclic_position_error(range: Limits, position: f64, target: f64) -> f64 {
    let (low, high) = if range.is_unlimited() {
        (-PI, PI)
    } else {
        range.as_pair()
    };
    let direct = target - position;
    let overflow = high - position + target - low;
    let underflow = low - position + target - high;

    [overflow, underflow]
        .into_iter()
        .fold(direct, |best, e| if best.abs() < e.abs() { best } else { e })
}
