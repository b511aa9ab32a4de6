//! World-frame transforms of entities.
//!
//! Every transform a world reports (object, link, joint) is a [`Pose`] in
//! the world frame. Kinematic chains are built by composing a parent pose
//! with the local offset of the child:
//!
//! ```text
//! child_in_world = parent_in_world ∘ joint_origin ∘ joint_motion(q)
//! ```

use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Position plus orientation.
///
/// ```
/// use sim_env_types::Pose;
/// use nalgebra::Point3;
///
/// let base = Pose::from_position(Point3::new(1.0, 2.0, 3.0));
/// assert_eq!(base.transform_point(&Point3::new(1.0, 0.0, 0.0)), Point3::new(2.0, 2.0, 3.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pose {
    /// Origin of the frame.
    pub position: Point3<f64>,
    /// Orientation of the frame.
    pub rotation: UnitQuaternion<f64>,
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

impl Pose {
    /// The world frame itself.
    #[must_use]
    pub fn identity() -> Self {
        Self::from_rotation(UnitQuaternion::identity())
    }

    /// A translated frame without rotation.
    #[must_use]
    pub fn from_position(position: Point3<f64>) -> Self {
        Self {
            position,
            rotation: UnitQuaternion::identity(),
        }
    }

    /// A rotated frame at the origin.
    #[must_use]
    pub fn from_rotation(rotation: UnitQuaternion<f64>) -> Self {
        Self {
            position: Point3::origin(),
            rotation,
        }
    }

    /// Translation `(x, y, z)` with roll, pitch and yaw (radians).
    #[must_use]
    pub fn from_xyz_rpy(x: f64, y: f64, z: f64, roll: f64, pitch: f64, yaw: f64) -> Self {
        Self {
            position: Point3::new(x, y, z),
            rotation: UnitQuaternion::from_euler_angles(roll, pitch, yaw),
        }
    }

    /// Orientation as `(roll, pitch, yaw)`.
    #[must_use]
    pub fn rpy(&self) -> (f64, f64, f64) {
        self.rotation.euler_angles()
    }

    /// Map a point given in this frame into the parent frame.
    #[must_use]
    pub fn transform_point(&self, local: &Point3<f64>) -> Point3<f64> {
        self.position + self.rotation * local.coords
    }

    /// Rotate a direction given in this frame into the parent frame.
    #[must_use]
    pub fn transform_vector(&self, local: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * local
    }

    /// Map a point given in the parent frame into this frame.
    #[must_use]
    pub fn inverse_transform_point(&self, point: &Point3<f64>) -> Point3<f64> {
        Point3::from(self.rotation.inverse_transform_vector(&(point - self.position)))
    }

    /// Frame `other`, given relative to `self`, expressed in the parent
    /// frame of `self`.
    #[must_use]
    pub fn compose(&self, other: &Self) -> Self {
        (Isometry3::from(*self) * Isometry3::from(*other)).into()
    }

    /// Whether every component is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.position.iter().chain(self.rotation.coords.iter()).all(|c| c.is_finite())
    }
}

impl From<Pose> for Isometry3<f64> {
    fn from(pose: Pose) -> Self {
        Self::from_parts(Translation3::from(pose.position), pose.rotation)
    }
}

impl From<Isometry3<f64>> for Pose {
    fn from(iso: Isometry3<f64>) -> Self {
        Self {
            position: iso.translation.vector.into(),
            rotation: iso.rotation,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_chain_of_offsets() {
        // Base turned a quarter turn, child one unit along the base's x axis.
        let base = Pose::from_xyz_rpy(1.0, 0.0, 0.0, 0.0, 0.0, FRAC_PI_2);
        let child = base.compose(&Pose::from_position(Point3::new(1.0, 0.0, 0.0)));
        assert_relative_eq!(child.position, Point3::new(1.0, 1.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(child.rpy().2, FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn test_point_round_trip() {
        let pose = Pose::from_xyz_rpy(0.0, 1.0, -0.5, 0.3, -0.2, FRAC_PI_2);
        let p = Point3::new(0.5, 0.5, 2.0);
        let back = pose.inverse_transform_point(&pose.transform_point(&p));
        assert_relative_eq!(back, p, epsilon = 1e-12);
    }

    #[test]
    fn test_rotation_only_moves_directions() {
        let pose = Pose::from_rotation(UnitQuaternion::from_euler_angles(0.0, 0.0, FRAC_PI_2));
        let v = pose.transform_vector(&Vector3::x());
        assert_relative_eq!(v, Vector3::y(), epsilon = 1e-12);
        assert_eq!(pose.position, Point3::origin());
    }

    #[test]
    fn test_isometry_conversion() {
        let pose = Pose::from_xyz_rpy(0.3, 0.2, 0.1, 0.0, 0.4, 0.0);
        let iso: Isometry3<f64> = pose.into();
        assert_relative_eq!(Pose::from(iso).position, pose.position);
        assert!(pose.is_finite());
        assert!(!Pose::from_position(Point3::new(f64::NAN, 0.0, 0.0)).is_finite());
    }
}
