//! Declarative descriptions of objects, consumed by world registration.
//!
//! A backend's scene loader produces [`ObjectDescription`]s; the world
//! validates them, assigns ids and builds the entity records. Geometry is
//! opaque to the core: it is whatever the backend's `Geometry` type is.

use hashbrown::{HashMap, HashSet};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use sim_env_types::{BaseAxis, DofLimits, JointType, Pose, Result, SimError};

fn default_axis() -> Vector3<f64> {
    Vector3::z()
}

/// Description of one link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkDescription<G> {
    /// Unique link name.
    pub name: String,
    /// Collision geometry in the link frame, if the link is collidable.
    #[serde(default = "Option::default")]
    pub geometry: Option<G>,
}

impl<G> LinkDescription<G> {
    /// Create a link without geometry.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            geometry: None,
        }
    }

    /// Attach collision geometry.
    #[must_use]
    pub fn with_geometry(mut self, geometry: G) -> Self {
        self.geometry = Some(geometry);
        self
    }
}

/// Description of one joint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointDescription {
    /// Unique joint name.
    pub name: String,
    /// Revolute or prismatic.
    pub joint_type: JointType,
    /// Name of the parent link.
    pub parent: String,
    /// Name of the child link.
    pub child: String,
    /// Motion axis in the joint frame.
    #[serde(default = "default_axis")]
    pub axis: Vector3<f64>,
    /// Pose of the joint frame in the parent link frame at zero position.
    #[serde(default)]
    pub origin: Pose,
    /// Position, velocity and acceleration limits.
    #[serde(default)]
    pub limits: DofLimits,
    /// Initial position.
    #[serde(default)]
    pub position: f64,
}

impl JointDescription {
    /// Create a joint between two links.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        joint_type: JointType,
        parent: impl Into<String>,
        child: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            joint_type,
            parent: parent.into(),
            child: child.into(),
            axis: default_axis(),
            origin: Pose::identity(),
            limits: DofLimits::unlimited(),
            position: 0.0,
        }
    }

    /// Create a revolute joint.
    #[must_use]
    pub fn revolute(
        name: impl Into<String>,
        parent: impl Into<String>,
        child: impl Into<String>,
    ) -> Self {
        Self::new(name, JointType::Revolute, parent, child)
    }

    /// Create a prismatic joint.
    #[must_use]
    pub fn prismatic(
        name: impl Into<String>,
        parent: impl Into<String>,
        child: impl Into<String>,
    ) -> Self {
        Self::new(name, JointType::Prismatic, parent, child)
    }

    /// Set the motion axis.
    #[must_use]
    pub fn with_axis(mut self, axis: Vector3<f64>) -> Self {
        self.axis = axis;
        self
    }

    /// Set the joint origin in the parent link frame.
    #[must_use]
    pub fn with_origin(mut self, origin: Pose) -> Self {
        self.origin = origin;
        self
    }

    /// Set the limits.
    #[must_use]
    pub fn with_limits(mut self, limits: DofLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Set the initial position.
    #[must_use]
    pub fn with_position(mut self, position: f64) -> Self {
        self.position = position;
        self
    }
}

/// Description of an object or robot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectDescription<G> {
    /// Unique object name.
    pub name: String,
    /// Register as a robot (may carry a controller).
    #[serde(default)]
    pub robot: bool,
    /// Initial world-frame pose of the base link.
    #[serde(default)]
    pub pose: Pose,
    /// Free base axes, in DOF order. Empty for a static object.
    #[serde(default)]
    pub base_dofs: Vec<BaseAxis>,
    /// Limits of the base DOFs. Empty means unlimited.
    #[serde(default)]
    pub base_limits: Vec<DofLimits>,
    /// Links. The first one is the base link unless `base_link` is set.
    #[serde(default = "Vec::new")]
    pub links: Vec<LinkDescription<G>>,
    /// Joints, in joint-index order.
    #[serde(default)]
    pub joints: Vec<JointDescription>,
    /// Name of the base link.
    #[serde(default)]
    pub base_link: Option<String>,
}

impl<G> ObjectDescription<G> {
    /// Create a static object description with no links.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            robot: false,
            pose: Pose::identity(),
            base_dofs: Vec::new(),
            base_limits: Vec::new(),
            links: Vec::new(),
            joints: Vec::new(),
            base_link: None,
        }
    }

    /// Create a robot description.
    #[must_use]
    pub fn robot(name: impl Into<String>) -> Self {
        Self {
            robot: true,
            ..Self::new(name)
        }
    }

    /// Set the initial pose.
    #[must_use]
    pub fn with_pose(mut self, pose: Pose) -> Self {
        self.pose = pose;
        self
    }

    /// Free the given base axes (unlimited).
    #[must_use]
    pub fn with_base_dofs(mut self, axes: &[BaseAxis]) -> Self {
        self.base_dofs = axes.to_vec();
        self.base_limits.clear();
        self
    }

    /// Free the given base axes with limits.
    #[must_use]
    pub fn with_limited_base_dofs(mut self, axes: &[BaseAxis], limits: &[DofLimits]) -> Self {
        self.base_dofs = axes.to_vec();
        self.base_limits = limits.to_vec();
        self
    }

    /// Add a link.
    #[must_use]
    pub fn with_link(mut self, link: LinkDescription<G>) -> Self {
        self.links.push(link);
        self
    }

    /// Add a joint; joint indices follow insertion order.
    #[must_use]
    pub fn with_joint(mut self, joint: JointDescription) -> Self {
        self.joints.push(joint);
        self
    }

    /// Choose the base link by name.
    #[must_use]
    pub fn with_base_link(mut self, name: impl Into<String>) -> Self {
        self.base_link = Some(name.into());
        self
    }

    /// Name of the base link.
    #[must_use]
    pub fn base_link_name(&self) -> Option<&str> {
        self.base_link
            .as_deref()
            .or_else(|| self.links.first().map(|l| l.name.as_str()))
    }

    /// Number of DOFs the registered object will have.
    #[must_use]
    pub fn num_dofs(&self) -> usize {
        self.base_dofs.len() + self.joints.len()
    }

    /// Every entity name this description introduces.
    pub fn entity_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str())
            .chain(self.links.iter().map(|l| l.name.as_str()))
            .chain(self.joints.iter().map(|j| j.name.as_str()))
    }

    /// Check the structural invariants of the description.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidDescription`] if names are empty or
    /// repeated, a joint references a link outside this object, base axes
    /// are repeated or more than six, limits are malformed, or a link is not
    /// reachable from the base link.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for name in self.entity_names() {
            if name.is_empty() {
                return Err(SimError::invalid_description(format!(
                    "object {:?} contains an empty entity name",
                    self.name
                )));
            }
            if !seen.insert(name) {
                return Err(SimError::invalid_description(format!(
                    "name {name:?} used twice in object {:?}",
                    self.name
                )));
            }
        }

        let base = self.base_link_name().ok_or_else(|| {
            SimError::invalid_description(format!("object {:?} has no links", self.name))
        })?;
        if !self.links.iter().any(|l| l.name == base) {
            return Err(SimError::invalid_description(format!(
                "base link {base:?} is not a link of {:?}",
                self.name
            )));
        }

        if self.base_dofs.len() > 6 {
            return Err(SimError::invalid_description(format!(
                "object {:?} has {} base DOFs (at most 6)",
                self.name,
                self.base_dofs.len()
            )));
        }
        let unique_axes: HashSet<_> = self.base_dofs.iter().collect();
        if unique_axes.len() != self.base_dofs.len() {
            return Err(SimError::invalid_description(format!(
                "object {:?} repeats a base axis",
                self.name
            )));
        }
        if !self.base_limits.is_empty() && self.base_limits.len() != self.base_dofs.len() {
            return Err(SimError::invalid_description(format!(
                "object {:?} has {} base limits for {} base DOFs",
                self.name,
                self.base_limits.len(),
                self.base_dofs.len()
            )));
        }
        if !self.base_limits.iter().all(DofLimits::is_valid) || !self.pose.is_finite() {
            return Err(SimError::invalid_description(format!(
                "object {:?} has malformed base pose or limits",
                self.name
            )));
        }

        let link_names: HashSet<&str> = self.links.iter().map(|l| l.name.as_str()).collect();
        let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
        for joint in &self.joints {
            if !link_names.contains(joint.parent.as_str())
                || !link_names.contains(joint.child.as_str())
            {
                return Err(SimError::invalid_description(format!(
                    "joint {:?} connects links outside object {:?}",
                    joint.name, self.name
                )));
            }
            if joint.parent == joint.child {
                return Err(SimError::invalid_description(format!(
                    "joint {:?} connects link {:?} to itself",
                    joint.name, joint.parent
                )));
            }
            if joint.child == base {
                return Err(SimError::invalid_description(format!(
                    "joint {:?} has the base link as its child",
                    joint.name
                )));
            }
            if joint.axis.norm() < 1e-12 || !joint.axis.iter().all(|x| x.is_finite()) {
                return Err(SimError::invalid_description(format!(
                    "joint {:?} has a degenerate axis",
                    joint.name
                )));
            }
            if !joint.limits.is_valid() || !joint.position.is_finite() {
                return Err(SimError::invalid_description(format!(
                    "joint {:?} has malformed limits or position",
                    joint.name
                )));
            }
            children
                .entry(joint.parent.as_str())
                .or_default()
                .push(joint.child.as_str());
        }

        let mut reached: HashSet<&str> = [base].into_iter().collect();
        let mut stack = vec![base];
        while let Some(link) = stack.pop() {
            for &child in children.get(link).map(Vec::as_slice).unwrap_or_default() {
                if reached.insert(child) {
                    stack.push(child);
                }
            }
        }
        if let Some(orphan) = self.links.iter().find(|l| !reached.contains(l.name.as_str())) {
            return Err(SimError::invalid_description(format!(
                "link {:?} is not reachable from base link {base:?}",
                orphan.name
            )));
        }

        Ok(())
    }
}

/// A scene: the objects a world loads at once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDescription<G> {
    /// Objects in registration order.
    #[serde(default = "Vec::new")]
    pub objects: Vec<ObjectDescription<G>>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn arm() -> ObjectDescription<()> {
        ObjectDescription::robot("arm")
            .with_link(LinkDescription::new("base"))
            .with_link(LinkDescription::new("upper"))
            .with_link(LinkDescription::new("lower"))
            .with_joint(JointDescription::revolute("shoulder", "base", "upper"))
            .with_joint(JointDescription::prismatic("slide", "upper", "lower"))
    }

    #[test]
    fn test_valid_arm() {
        let desc = arm();
        assert!(desc.validate().is_ok());
        assert_eq!(desc.num_dofs(), 2);
        assert_eq!(desc.base_link_name(), Some("base"));
        assert_eq!(desc.entity_names().count(), 6);
    }

    #[test]
    fn test_rejects_foreign_link() {
        let desc = arm().with_joint(JointDescription::revolute("elbow", "lower", "gripper"));
        assert!(matches!(
            desc.validate(),
            Err(SimError::InvalidDescription { .. })
        ));
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let desc = arm().with_link(LinkDescription::new("upper"));
        assert!(desc.validate().is_err());
    }

    #[test]
    fn test_rejects_unreachable_link() {
        let desc = arm().with_link(LinkDescription::new("floating"));
        assert!(desc.validate().is_err());
    }

    #[test]
    fn test_rejects_too_many_base_axes() {
        let mut desc = arm().with_base_dofs(&BaseAxis::ALL);
        assert!(desc.validate().is_ok());
        desc.base_dofs.push(BaseAxis::X);
        assert!(desc.validate().is_err());
    }

    #[test]
    fn test_rejects_repeated_base_axis() {
        let desc = arm().with_base_dofs(&[BaseAxis::X, BaseAxis::X]);
        assert!(desc.validate().is_err());
    }

    #[test]
    fn test_rejects_empty_object() {
        let desc: ObjectDescription<()> = ObjectDescription::new("nothing");
        assert!(desc.validate().is_err());
    }

    #[test]
    fn test_deserialize_defaults() {
        let json = r#"{
            "name": "box",
            "links": [{ "name": "box_link" }]
        }"#;
        let desc: ObjectDescription<()> = serde_json::from_str(json).unwrap();
        assert!(!desc.robot);
        assert!(desc.base_dofs.is_empty());
        assert_eq!(desc.pose, Pose::identity());
        assert!(desc.validate().is_ok());
    }
}
