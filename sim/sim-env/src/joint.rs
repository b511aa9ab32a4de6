//! Joint records.

use nalgebra::{Point3, Unit, UnitQuaternion, Vector3};
use sim_env_types::{
    DofInformation, DofLimits, EntityType, JointId, JointType, LinkId, ObjectId, Pose, WorldId,
};

use crate::entity::{Named, Posed};

/// A single-DOF connection between two links of the same object.
///
/// The joint frame sits at `origin` in the parent link frame; the child link
/// is displaced from it by the joint motion along (prismatic) or about
/// (revolute) `axis`.
#[derive(Debug, Clone)]
pub struct Joint {
    id: JointId,
    name: String,
    world: WorldId,
    object: ObjectId,
    joint_type: JointType,
    joint_index: usize,
    dof_index: usize,
    parent_link: LinkId,
    child_link: LinkId,
    axis: Unit<Vector3<f64>>,
    origin: Pose,
    limits: DofLimits,
    transform: Pose,
}

impl Joint {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: JointId,
        name: String,
        world: WorldId,
        object: ObjectId,
        joint_type: JointType,
        joint_index: usize,
        dof_index: usize,
        parent_link: LinkId,
        child_link: LinkId,
        axis: Unit<Vector3<f64>>,
        origin: Pose,
        limits: DofLimits,
    ) -> Self {
        Self {
            id,
            name,
            world,
            object,
            joint_type,
            joint_index,
            dof_index,
            parent_link,
            child_link,
            axis,
            origin,
            limits,
            transform: origin,
        }
    }

    /// Joint id.
    #[must_use]
    pub fn id(&self) -> JointId {
        self.id
    }

    /// The object this joint belongs to.
    #[must_use]
    pub fn object(&self) -> ObjectId {
        self.object
    }

    /// Revolute or prismatic.
    #[must_use]
    pub fn joint_type(&self) -> JointType {
        self.joint_type
    }

    /// Position among the object's joints.
    #[must_use]
    pub fn joint_index(&self) -> usize {
        self.joint_index
    }

    /// DOF index within the owning object (`num_base_dofs + joint_index`).
    #[must_use]
    pub fn dof_index(&self) -> usize {
        self.dof_index
    }

    /// Parent link.
    #[must_use]
    pub fn parent_link(&self) -> LinkId {
        self.parent_link
    }

    /// Child link.
    #[must_use]
    pub fn child_link(&self) -> LinkId {
        self.child_link
    }

    /// Motion axis in the joint frame.
    #[must_use]
    pub fn axis(&self) -> Unit<Vector3<f64>> {
        self.axis
    }

    /// Joint frame in the parent link frame.
    #[must_use]
    pub fn origin(&self) -> Pose {
        self.origin
    }

    /// Position, velocity and acceleration limits.
    #[must_use]
    pub fn limits(&self) -> DofLimits {
        self.limits
    }

    /// Descriptor of the joint's DOF.
    #[must_use]
    pub fn dof_information(&self) -> DofInformation {
        DofInformation::new(self.dof_index, self.limits, self.joint_type.is_rotational())
    }

    /// Displacement of the child link relative to the joint frame at
    /// position `q`.
    #[must_use]
    pub fn motion(&self, q: f64) -> Pose {
        match self.joint_type {
            JointType::Revolute => Pose::from_rotation(UnitQuaternion::from_axis_angle(&self.axis, q)),
            JointType::Prismatic => Pose::from_position(Point3::from(self.axis.into_inner() * q)),
        }
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub(crate) fn set_transform(&mut self, transform: Pose) {
        self.transform = transform;
    }
}

impl Named for Joint {
    fn name(&self) -> &str {
        &self.name
    }

    fn entity_type(&self) -> EntityType {
        EntityType::Joint
    }

    fn world_id(&self) -> WorldId {
        self.world
    }
}

impl Posed for Joint {
    fn transform(&self) -> Pose {
        self.transform
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    fn joint(joint_type: JointType) -> Joint {
        Joint::new(
            JointId(1),
            "j".into(),
            WorldId(0),
            ObjectId(0),
            joint_type,
            0,
            3,
            LinkId(0),
            LinkId(1),
            Vector3::z_axis(),
            Pose::identity(),
            DofLimits::unlimited(),
        )
    }

    #[test]
    fn test_revolute_motion() {
        let motion = joint(JointType::Revolute).motion(FRAC_PI_2);
        let p = motion.transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p.y, 1.0, epsilon = 1e-12);
        assert_relative_eq!(p.x, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_prismatic_motion() {
        let motion = joint(JointType::Prismatic).motion(0.4);
        assert_relative_eq!(motion.position.z, 0.4);
        assert_eq!(motion.rotation, UnitQuaternion::identity());
    }

    #[test]
    fn test_revolute_dof_is_cyclic_without_position_limits() {
        let info = joint(JointType::Revolute).dof_information();
        assert_eq!(info.dof_index, 3);
        assert!(info.cyclic);
        assert!(!joint(JointType::Prismatic).dof_information().cyclic);
    }
}
