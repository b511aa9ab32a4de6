//! Scaling command vectors into per-DOF limits.

use nalgebra::DVector;
use sim_env::ControlError;
use sim_env_types::Limits;

/// Outcome of [`scale_to_limits`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalingResult {
    /// The vector already lies within the limits.
    NotScaled,
    /// The vector was shortened to fit the limits.
    Scaled,
    /// No non-negative scale fits the limits; the vector is unchanged.
    Failure,
}

impl ScalingResult {
    /// Whether the limits could be met.
    #[must_use]
    pub fn is_feasible(self) -> bool {
        !matches!(self, Self::Failure)
    }
}

/// Clamp `value` into `[low, high]`.
///
/// Unlike [`f64::clamp`] this never panics; when `low > high` the result is
/// `high`.
#[must_use]
pub fn clamp(value: f64, low: f64, high: f64) -> f64 {
    value.max(low).min(high)
}

/// Scale `vector` uniformly so that every entry fits its limits.
///
/// The scale is the smallest ratio `clamp(v_i) / v_i` over the non-zero
/// entries. The direction of the vector is preserved.
///
/// ```text
/// c = min_i ( v_i == 0 ? 1 : clamp(v_i) / v_i )
///
/// c < 0      → Failure    (a limit excludes the direction entirely)
/// 0 <= c < 1 → Scaled     (v ← c·v)
/// c >= 1     → NotScaled
/// ```
///
/// # Errors
///
/// Returns [`ControlError::DimensionMismatch`] if `limits` does not have one
/// entry per vector entry.
pub fn scale_to_limits(
    vector: &mut DVector<f64>,
    limits: &[Limits],
) -> Result<ScalingResult, ControlError> {
    ControlError::check_len("limits", vector.len(), limits.len())?;

    let c = vector
        .iter()
        .zip(limits)
        .map(|(&v, l)| if v == 0.0 { 1.0 } else { l.clamp(v) / v })
        .fold(f64::MAX, f64::min);

    if c < 0.0 {
        Ok(ScalingResult::Failure)
    } else if c < 1.0 {
        *vector *= c;
        Ok(ScalingResult::Scaled)
    } else {
        Ok(ScalingResult::NotScaled)
    }
}
