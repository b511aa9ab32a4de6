//! Entity arenas of a world.
//!
//! The registry owns every object, link and joint record, keyed by id, and a
//! single name index shared by all entity kinds so that a name identifies at
//! most one entity per world. Records never hold references to each other;
//! relations are stored as ids and resolved through the registry.

use hashbrown::HashMap;
use nalgebra::Unit;
use sim_env_types::{
    DofInformation, DofLimits, EntityKey, EntityType, JointId, LinkId, ObjectId, Result, SimError,
    WorldId,
};

use crate::description::ObjectDescription;
use crate::entity::Named;
use crate::joint::Joint;
use crate::kinematics::forward_kinematics;
use crate::link::Link;
use crate::object::Object;

/// Arena storage for the entities of one world.
#[derive(Debug, Default)]
pub struct Registry {
    objects: HashMap<ObjectId, Object>,
    links: HashMap<LinkId, Link>,
    joints: HashMap<JointId, Joint>,
    names: HashMap<String, EntityKey>,
    next_id: u64,
}

impl Registry {
    // =========================================================================
    // Lookup
    // =========================================================================

    /// Object or robot by id.
    #[must_use]
    pub fn object(&self, id: ObjectId) -> Option<&Object> {
        self.objects.get(&id)
    }

    /// Link by id.
    #[must_use]
    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.links.get(&id)
    }

    /// Joint by id.
    #[must_use]
    pub fn joint(&self, id: JointId) -> Option<&Joint> {
        self.joints.get(&id)
    }

    /// Entity registered under a name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<EntityKey> {
        self.names.get(name).copied()
    }

    /// Object or robot by name.
    #[must_use]
    pub fn object_by_name(&self, name: &str) -> Option<&Object> {
        match self.lookup(name)? {
            EntityKey::Object(id) => self.object(id),
            _ => None,
        }
    }

    /// Link by name.
    #[must_use]
    pub fn link_by_name(&self, name: &str) -> Option<&Link> {
        match self.lookup(name)? {
            EntityKey::Link(id) => self.link(id),
            _ => None,
        }
    }

    /// Joint by name.
    #[must_use]
    pub fn joint_by_name(&self, name: &str) -> Option<&Joint> {
        match self.lookup(name)? {
            EntityKey::Joint(id) => self.joint(id),
            _ => None,
        }
    }

    /// Every object and robot, ordered by id.
    pub fn objects(&self) -> impl Iterator<Item = &Object> {
        self.object_ids().into_iter().filter_map(|id| self.object(id))
    }

    /// Ids of every object and robot, sorted.
    #[must_use]
    pub fn object_ids(&self) -> Vec<ObjectId> {
        let mut ids: Vec<_> = self.objects.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Number of registered objects and robots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether no object is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    pub(crate) fn object_mut(&mut self, id: ObjectId) -> Option<&mut Object> {
        self.objects.get_mut(&id)
    }

    /// Register an object, returning its id and the geometry of each link
    /// that carries one. Nothing is registered on error.
    pub(crate) fn insert<G>(
        &mut self,
        world: WorldId,
        desc: ObjectDescription<G>,
    ) -> Result<(ObjectId, Vec<(LinkId, G)>)> {
        desc.validate()?;
        if let Some(name) = desc.entity_names().find(|n| self.names.contains_key(*n)) {
            return Err(SimError::DuplicateName {
                name: name.to_string(),
            });
        }

        let object_id = ObjectId(self.allocate());
        let mut link_ids: HashMap<String, LinkId> = HashMap::with_capacity(desc.links.len());
        let mut geometry = Vec::new();
        let mut links = Vec::with_capacity(desc.links.len());
        for link_desc in desc.links {
            let id = LinkId(self.allocate());
            link_ids.insert(link_desc.name.clone(), id);
            if let Some(g) = link_desc.geometry {
                geometry.push((id, g));
            }
            links.push(Link::new(id, link_desc.name, world, object_id));
        }
        let base_name = desc.base_link.as_deref().or_else(|| links.first().map(Named::name));
        let base_link = base_name
            .and_then(|n| link_ids.get(n).copied())
            .ok_or_else(|| {
                SimError::invalid_description(format!("object {:?} has no base link", desc.name))
            })?;

        let num_base = desc.base_dofs.len();
        let mut dof_info: Vec<DofInformation> = desc
            .base_dofs
            .iter()
            .enumerate()
            .map(|(i, axis)| {
                let limits = desc
                    .base_limits
                    .get(i)
                    .copied()
                    .unwrap_or_else(DofLimits::unlimited);
                DofInformation::new(i, limits, axis.is_rotational())
            })
            .collect();

        let mut joints = Vec::with_capacity(desc.joints.len());
        let mut initial_positions = Vec::with_capacity(desc.joints.len());
        for (joint_index, joint_desc) in desc.joints.into_iter().enumerate() {
            let id = JointId(self.allocate());
            let (Some(&parent), Some(&child)) =
                (link_ids.get(&joint_desc.parent), link_ids.get(&joint_desc.child))
            else {
                return Err(SimError::invalid_description(format!(
                    "joint {:?} references an unknown link",
                    joint_desc.name
                )));
            };
            let joint = Joint::new(
                id,
                joint_desc.name,
                world,
                object_id,
                joint_desc.joint_type,
                joint_index,
                num_base + joint_index,
                parent,
                child,
                Unit::new_normalize(joint_desc.axis),
                joint_desc.origin,
                joint_desc.limits,
            );
            dof_info.push(joint.dof_information());
            initial_positions.push(joint_desc.position);
            joints.push(joint);
        }

        let entity_type = if desc.robot {
            EntityType::Robot
        } else {
            EntityType::Object
        };
        let mut object = Object::new(
            object_id,
            desc.name,
            world,
            entity_type,
            desc.pose,
            desc.base_dofs,
            base_link,
            dof_info,
        );

        for link in &links {
            object.push_link(link.id());
        }
        for (joint, position) in joints.iter().zip(initial_positions) {
            object.push_joint(joint.id(), position);
        }
        for joint in &joints {
            for link in &mut links {
                if link.id() == joint.parent_link() {
                    link.add_child_joint(joint.id());
                }
                if link.id() == joint.child_link() {
                    link.add_parent_joint(joint.id());
                }
            }
        }

        self.names.insert(object.name().to_string(), object_id.into());
        for link in links {
            self.names.insert(link.name().to_string(), link.id().into());
            self.links.insert(link.id(), link);
        }
        for joint in joints {
            self.names.insert(joint.name().to_string(), joint.id().into());
            self.joints.insert(joint.id(), joint);
        }
        self.objects.insert(object_id, object);
        self.refresh(object_id);
        Ok((object_id, geometry))
    }

    /// Remove an object with its links and joints. Returns the removed link
    /// ids, or `None` if the object does not exist.
    pub(crate) fn remove(&mut self, id: ObjectId) -> Option<Vec<LinkId>> {
        let object = self.objects.remove(&id)?;
        self.names.remove(object.name());
        for link_id in object.links() {
            if let Some(link) = self.links.remove(link_id) {
                self.names.remove(link.name());
            }
        }
        for joint_id in object.joints() {
            if let Some(joint) = self.joints.remove(joint_id) {
                self.names.remove(joint.name());
            }
        }
        Some(object.links().to_vec())
    }

    /// Remove everything.
    pub(crate) fn clear(&mut self) {
        self.objects.clear();
        self.links.clear();
        self.joints.clear();
        self.names.clear();
    }

    /// Give an entity a new name.
    pub(crate) fn rename(&mut self, key: EntityKey, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(SimError::invalid_description("entity names must not be empty"));
        }
        match self.names.get(name) {
            Some(existing) if *existing == key => return Ok(()),
            Some(_) => {
                return Err(SimError::DuplicateName {
                    name: name.to_string(),
                })
            }
            None => {}
        }
        let old = match key {
            EntityKey::Object(id) => self.objects.get_mut(&id).map(|o| {
                let old = o.name().to_string();
                o.set_name(name.to_string());
                old
            }),
            EntityKey::Link(id) => self.links.get_mut(&id).map(|l| {
                let old = l.name().to_string();
                l.set_name(name.to_string());
                old
            }),
            EntityKey::Joint(id) => self.joints.get_mut(&id).map(|j| {
                let old = j.name().to_string();
                j.set_name(name.to_string());
                old
            }),
        }
        .ok_or_else(|| SimError::not_found(format!("{key:?}")))?;
        self.names.remove(&old);
        self.names.insert(name.to_string(), key);
        Ok(())
    }

    /// Recompute link and joint transforms of an object.
    pub(crate) fn refresh(&mut self, id: ObjectId) {
        let Some(transforms) = forward_kinematics(self, id) else {
            return;
        };
        for (link_id, tf) in transforms.links {
            if let Some(link) = self.links.get_mut(&link_id) {
                link.set_transform(tf);
            }
        }
        for (joint_id, tf) in transforms.joints {
            if let Some(joint) = self.joints.get_mut(&joint_id) {
                joint.set_transform(tf);
            }
        }
    }

    fn allocate(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}
