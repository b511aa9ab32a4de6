//! Link records.

use sim_env_types::{EntityType, JointId, LinkId, ObjectId, Pose, WorldId};

use crate::entity::{Collidable, Named, Posed, Target};

/// A rigid body of an object's kinematic tree.
#[derive(Debug, Clone)]
pub struct Link {
    id: LinkId,
    name: String,
    world: WorldId,
    object: ObjectId,
    parent_joints: Vec<JointId>,
    child_joints: Vec<JointId>,
    transform: Pose,
}

impl Link {
    pub(crate) fn new(id: LinkId, name: String, world: WorldId, object: ObjectId) -> Self {
        Self {
            id,
            name,
            world,
            object,
            parent_joints: Vec::new(),
            child_joints: Vec::new(),
            transform: Pose::identity(),
        }
    }

    /// Link id.
    #[must_use]
    pub fn id(&self) -> LinkId {
        self.id
    }

    /// The object this link belongs to.
    #[must_use]
    pub fn object(&self) -> ObjectId {
        self.object
    }

    /// Joints whose child is this link. Empty for the base link.
    #[must_use]
    pub fn parent_joints(&self) -> &[JointId] {
        &self.parent_joints
    }

    /// Joints whose parent is this link.
    #[must_use]
    pub fn child_joints(&self) -> &[JointId] {
        &self.child_joints
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub(crate) fn add_parent_joint(&mut self, joint: JointId) {
        self.parent_joints.push(joint);
    }

    pub(crate) fn add_child_joint(&mut self, joint: JointId) {
        self.child_joints.push(joint);
    }

    pub(crate) fn set_transform(&mut self, transform: Pose) {
        self.transform = transform;
    }
}

impl Named for Link {
    fn name(&self) -> &str {
        &self.name
    }

    fn entity_type(&self) -> EntityType {
        EntityType::Link
    }

    fn world_id(&self) -> WorldId {
        self.world
    }
}

impl Posed for Link {
    fn transform(&self) -> Pose {
        self.transform
    }
}

impl Collidable for Link {
    fn collision_target(&self) -> Target {
        Target::Link(self.id)
    }
}
