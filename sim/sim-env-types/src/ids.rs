//! Identifiers for worlds and the entities they own.
//!
//! Entities live in per-world arenas and refer to each other by id. An id is
//! only meaningful inside the world that issued it; looking up an id that
//! was removed (or never existed) yields `None` rather than a dangling
//! reference.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident, $label:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
        pub struct $name(pub u64);

        impl $name {
            /// Wrap a raw id.
            #[must_use]
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            /// The raw id.
            #[must_use]
            pub const fn raw(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($label, "({})"), self.0)
            }
        }
    };
}

entity_id!(
    /// Identifier of a simulation world.
    ///
    /// Every entity record carries the id of the world that owns it, which
    /// stands in for a back-reference to the owning world.
    WorldId,
    "World"
);
entity_id!(
    /// Identifier of an object (or robot) within a world.
    ObjectId,
    "Object"
);
entity_id!(
    /// Identifier of a link within a world.
    LinkId,
    "Link"
);
entity_id!(
    /// Identifier of a joint within a world.
    JointId,
    "Joint"
);

/// Kind of a registered entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EntityType {
    /// A passive object.
    Object,
    /// An object with an optional controller.
    Robot,
    /// A joint connecting two links.
    Joint,
    /// A rigid link.
    Link,
}

impl EntityType {
    /// Whether this entity lives in the object registry (objects and robots).
    #[must_use]
    pub const fn is_object_like(self) -> bool {
        matches!(self, Self::Object | Self::Robot)
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Object => "object",
            Self::Robot => "robot",
            Self::Joint => "joint",
            Self::Link => "link",
        })
    }
}

/// Key of any entity in a world's name registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EntityKey {
    /// An object or robot.
    Object(ObjectId),
    /// A link.
    Link(LinkId),
    /// A joint.
    Joint(JointId),
}

impl From<ObjectId> for EntityKey {
    fn from(id: ObjectId) -> Self {
        Self::Object(id)
    }
}

impl From<LinkId> for EntityKey {
    fn from(id: LinkId) -> Self {
        Self::Link(id)
    }
}

impl From<JointId> for EntityKey {
    fn from(id: JointId) -> Self {
        Self::Joint(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display() {
        assert_eq!(ObjectId::new(3).to_string(), "Object(3)");
        assert_eq!(LinkId::from(7).to_string(), "Link(7)");
        assert_eq!(JointId::new(0).raw(), 0);
        assert_eq!(WorldId::new(2).to_string(), "World(2)");
    }

    #[test]
    fn test_entity_type() {
        assert!(EntityType::Robot.is_object_like());
        assert!(EntityType::Object.is_object_like());
        assert!(!EntityType::Link.is_object_like());
        assert_eq!(EntityType::Joint.to_string(), "joint");
    }

    #[test]
    fn test_entity_key_from() {
        assert_eq!(EntityKey::from(LinkId::new(1)), EntityKey::Link(LinkId(1)));
        assert_ne!(
            EntityKey::from(ObjectId::new(1)),
            EntityKey::from(JointId::new(1))
        );
    }
}
