//! Joint kinds.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Kind of a single-DOF joint between two links.
///
/// Serialized as `"revolute"` or `"prismatic"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum JointType {
    /// Rotates the child link about the joint axis (radians).
    Revolute,
    /// Slides the child link along the joint axis (meters).
    Prismatic,
}

impl JointType {
    /// Whether the joint position is an angle.
    #[must_use]
    pub const fn is_rotational(self) -> bool {
        matches!(self, Self::Revolute)
    }

    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Revolute => "revolute",
            Self::Prismatic => "prismatic",
        }
    }
}

impl std::fmt::Display for JointType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
