//! Degree-of-freedom limits and descriptors.
//!
//! Every object exposes its configuration as a flat vector of DOFs: first
//! the base DOFs (free pose axes of a non-static object), then one DOF per
//! joint in joint-index order.
//!
//! Unconstrained axes report the sentinel pair `(f64::MIN, f64::MAX)`. The
//! sentinel is finite, so arithmetic on it never produces `NaN`, but it is
//! not a physical bound and callers must check [`Limits::is_unlimited`]
//! before treating it as one.

use std::f64::consts::{PI, TAU};

use crate::Pose;
use nalgebra::Point3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Closed `[min, max]` interval for one DOF quantity.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Limits {
    /// Lower bound.
    pub min: f64,
    /// Upper bound.
    pub max: f64,
}

impl Default for Limits {
    fn default() -> Self {
        Self::UNLIMITED
    }
}

impl Limits {
    /// Sentinel for an unconstrained axis.
    pub const UNLIMITED: Self = Self {
        min: f64::MIN,
        max: f64::MAX,
    };

    /// Create limits from a lower and an upper bound.
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Create limits `[-bound, bound]`.
    #[must_use]
    pub fn symmetric(bound: f64) -> Self {
        let bound = bound.abs();
        Self {
            min: -bound,
            max: bound,
        }
    }

    /// Unconstrained limits.
    #[must_use]
    pub const fn unlimited() -> Self {
        Self::UNLIMITED
    }

    /// Whether both bounds are the unconstrained sentinel.
    #[must_use]
    pub fn is_unlimited(&self) -> bool {
        self.min == f64::MIN && self.max == f64::MAX
    }

    /// Whether the interval is well formed: finite bounds with `min <= max`.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }

    /// Check whether a value lies within the limits.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Clamp a value into the limits.
    #[must_use]
    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }

    /// Width of the interval.
    #[must_use]
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Pair form `(min, max)`.
    #[must_use]
    pub const fn as_pair(&self) -> (f64, f64) {
        (self.min, self.max)
    }
}

impl From<(f64, f64)> for Limits {
    fn from((min, max): (f64, f64)) -> Self {
        Self { min, max }
    }
}

/// Position, velocity and acceleration limits of one DOF.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DofLimits {
    /// Position limits (rad or m).
    #[cfg_attr(feature = "serde", serde(default))]
    pub position: Limits,
    /// Velocity limits.
    #[cfg_attr(feature = "serde", serde(default))]
    pub velocity: Limits,
    /// Acceleration limits.
    #[cfg_attr(feature = "serde", serde(default))]
    pub acceleration: Limits,
}

impl DofLimits {
    /// Limits with every quantity unconstrained.
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            position: Limits::UNLIMITED,
            velocity: Limits::UNLIMITED,
            acceleration: Limits::UNLIMITED,
        }
    }

    /// Set the position limits.
    #[must_use]
    pub fn with_position(mut self, min: f64, max: f64) -> Self {
        self.position = Limits::new(min, max);
        self
    }

    /// Set symmetric velocity limits.
    #[must_use]
    pub fn with_velocity(mut self, bound: f64) -> Self {
        self.velocity = Limits::symmetric(bound);
        self
    }

    /// Set symmetric acceleration limits.
    #[must_use]
    pub fn with_acceleration(mut self, bound: f64) -> Self {
        self.acceleration = Limits::symmetric(bound);
        self
    }

    /// Check that every interval is either the sentinel or well formed.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        [self.position, self.velocity, self.acceleration]
            .iter()
            .all(|l| l.is_unlimited() || l.is_valid())
    }
}

/// A free axis of an object's base pose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BaseAxis {
    /// Translation along world X.
    X,
    /// Translation along world Y.
    Y,
    /// Translation along world Z.
    Z,
    /// Rotation about X (roll).
    Roll,
    /// Rotation about Y (pitch).
    Pitch,
    /// Rotation about Z (yaw).
    Yaw,
}

impl BaseAxis {
    /// All six axes in canonical order.
    pub const ALL: [Self; 6] = [
        Self::X,
        Self::Y,
        Self::Z,
        Self::Roll,
        Self::Pitch,
        Self::Yaw,
    ];

    /// The planar subset `x, y, yaw`.
    pub const PLANAR: [Self; 3] = [Self::X, Self::Y, Self::Yaw];

    /// Whether the axis is rotational.
    #[must_use]
    pub const fn is_rotational(self) -> bool {
        matches!(self, Self::Roll | Self::Pitch | Self::Yaw)
    }

    /// Slot of this axis in [`BaseCoordinates`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Coordinates `(x, y, z, roll, pitch, yaw)` of a base pose.
///
/// The base DOFs of an object live here, and the pose is built from them.
/// Angles are not wrapped: a pitch of `2.0` or a yaw of `4.0` reads back as
/// written even though the pose alone would decompose differently.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BaseCoordinates([f64; 6]);

impl BaseCoordinates {
    /// Coordinates of a pose, angles as decomposed by [`Pose::rpy`].
    #[must_use]
    pub fn from_pose(pose: &Pose) -> Self {
        let (roll, pitch, yaw) = pose.rpy();
        let p = pose.position;
        Self([p.x, p.y, p.z, roll, pitch, yaw])
    }

    /// Coordinates of a pose, with the angles chosen closest to `near`.
    ///
    /// A rotation has two roll-pitch-yaw decompositions,
    /// `(r, p, y)` and `(r + π, π - p, y + π)`, each defined up to whole
    /// turns. The one returned has every angle within π of its counterpart
    /// in `near` and the smaller total distance to it.
    #[must_use]
    pub fn from_pose_near(pose: &Pose, near: &Self) -> Self {
        let (roll, pitch, yaw) = pose.rpy();
        let reference = [near.0[3], near.0[4], near.0[5]];
        let align = |angles: [f64; 3]| {
            let mut out = angles;
            for (angle, r) in out.iter_mut().zip(reference) {
                *angle = r + wrap(*angle - r);
            }
            out
        };
        let distance = |angles: &[f64; 3]| {
            angles
                .iter()
                .zip(reference)
                .map(|(a, r)| (a - r).abs())
                .sum::<f64>()
        };

        let direct = align([roll, pitch, yaw]);
        let flipped = align([roll + PI, PI - pitch, yaw + PI]);
        let [roll, pitch, yaw] = if distance(&flipped) < distance(&direct) {
            flipped
        } else {
            direct
        };
        let p = pose.position;
        Self([p.x, p.y, p.z, roll, pitch, yaw])
    }

    /// Coordinate of one axis.
    #[must_use]
    pub fn get(&self, axis: BaseAxis) -> f64 {
        self.0[axis.index()]
    }

    /// Overwrite the coordinate of one axis.
    pub fn set(&mut self, axis: BaseAxis, value: f64) {
        self.0[axis.index()] = value;
    }

    /// The pose these coordinates describe.
    #[must_use]
    pub fn to_pose(&self) -> Pose {
        let [x, y, z, roll, pitch, yaw] = self.0;
        Pose::from_xyz_rpy(x, y, z, roll, pitch, yaw)
    }

    /// Origin of the pose these coordinates describe.
    #[must_use]
    pub fn position(&self) -> Point3<f64> {
        Point3::new(self.0[0], self.0[1], self.0[2])
    }
}

/// Angle in `[-π, π]`.
fn wrap(angle: f64) -> f64 {
    angle - TAU * (angle / TAU).round()
}

impl std::fmt::Display for BaseAxis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Z => "z",
            Self::Roll => "roll",
            Self::Pitch => "pitch",
            Self::Yaw => "yaw",
        };
        f.write_str(s)
    }
}

/// Static description of one DOF of an object.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DofInformation {
    /// Index of the DOF within its object.
    pub dof_index: usize,
    /// Position limits.
    pub position_limits: Limits,
    /// Velocity limits.
    pub velocity_limits: Limits,
    /// Acceleration limits.
    pub acceleration_limits: Limits,
    /// Rotational DOF without position limits; positions wrap around.
    pub cyclic: bool,
}

impl DofInformation {
    /// Build the descriptor of DOF `dof_index` from its limits.
    ///
    /// A DOF is cyclic when it is rotational and its position is unlimited.
    #[must_use]
    pub fn new(dof_index: usize, limits: DofLimits, rotational: bool) -> Self {
        Self {
            dof_index,
            position_limits: limits.position,
            velocity_limits: limits.velocity,
            acceleration_limits: limits.acceleration,
            cyclic: rotational && limits.position.is_unlimited(),
        }
    }

    /// The limits triple of this DOF.
    #[must_use]
    pub const fn limits(&self) -> DofLimits {
        DofLimits {
            position: self.position_limits,
            velocity: self.velocity_limits,
            acceleration: self.acceleration_limits,
        }
    }
}
