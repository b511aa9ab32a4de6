//! Forward kinematics over an object's link tree.
//!
//! The base link sits at the object pose. Walking the tree breadth-first
//! from the base, each joint frame is `parent ∘ origin` and each child link
//! is `joint ∘ motion(q)`.

use std::collections::VecDeque;

use hashbrown::HashMap;
use sim_env_types::{JointId, LinkId, ObjectId, Pose};

use crate::entity::{DofAddressable, Posed};
use crate::registry::Registry;

/// World-frame transforms produced by one forward-kinematics pass.
#[derive(Debug, Default)]
pub(crate) struct LinkTransforms {
    pub links: Vec<(LinkId, Pose)>,
    pub joints: Vec<(JointId, Pose)>,
}

/// Compute link and joint transforms of an object from its current DOF
/// positions. Returns `None` for an unknown object.
pub(crate) fn forward_kinematics(registry: &Registry, object: ObjectId) -> Option<LinkTransforms> {
    let record = registry.object(object)?;
    let mut out = LinkTransforms::default();
    let mut frames: HashMap<LinkId, Pose> = HashMap::with_capacity(record.links().len());

    let base = record.base_link();
    frames.insert(base, record.transform());
    out.links.push((base, record.transform()));

    let mut queue = VecDeque::from([base]);
    while let Some(link_id) = queue.pop_front() {
        let Some(link) = registry.link(link_id) else {
            continue;
        };
        let parent_tf = frames.get(&link_id).copied().unwrap_or_default();
        for &joint_id in link.child_joints() {
            let Some(joint) = registry.joint(joint_id) else {
                continue;
            };
            let q = record.dof_position(joint.dof_index()).unwrap_or_default();
            let joint_tf = parent_tf.compose(&joint.origin());
            let child_tf = joint_tf.compose(&joint.motion(q));
            out.joints.push((joint_id, joint_tf));
            if frames.insert(joint.child_link(), child_tf).is_none() {
                out.links.push((joint.child_link(), child_tf));
                queue.push_back(joint.child_link());
            }
        }
    }
    Some(out)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::description::{JointDescription, LinkDescription, ObjectDescription};
    use approx::assert_relative_eq;
    use nalgebra::{Point3, Vector3};
    use sim_env_types::WorldId;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_two_link_arm() {
        let desc: ObjectDescription<()> = ObjectDescription::robot("arm")
            .with_pose(Pose::from_position(Point3::new(0.0, 0.0, 1.0)))
            .with_link(LinkDescription::new("base"))
            .with_link(LinkDescription::new("upper"))
            .with_link(LinkDescription::new("lower"))
            .with_joint(
                JointDescription::revolute("shoulder", "base", "upper").with_position(FRAC_PI_2),
            )
            .with_joint(
                JointDescription::prismatic("slide", "upper", "lower")
                    .with_axis(Vector3::x())
                    .with_origin(Pose::from_position(Point3::new(1.0, 0.0, 0.0)))
                    .with_position(0.5),
            );
        let mut registry = Registry::default();
        let (id, _) = registry.insert(WorldId(0), desc).unwrap();

        let lower = registry.link_by_name("lower").unwrap();
        let p = lower.transform().position;
        // Shoulder rotates the upper frame by 90° about z, so the slide runs
        // along world y.
        assert_relative_eq!(p.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(p.y, 1.5, epsilon = 1e-12);
        assert_relative_eq!(p.z, 1.0, epsilon = 1e-12);

        let slide = registry.joint_by_name("slide").unwrap();
        assert_relative_eq!(slide.transform().position.y, 1.0, epsilon = 1e-12);
        assert_eq!(forward_kinematics(&registry, id).unwrap().links.len(), 3);
    }
}
