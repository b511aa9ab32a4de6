//! Capability traits shared by entity records.
//!
//! Entities are plain records stored in per-world arenas. Instead of an
//! inheritance hierarchy, each record implements the capabilities it has:
//!
//! | Capability         | Object | Robot | Link | Joint |
//! |--------------------|--------|-------|------|-------|
//! | [`Named`]          | ✓      | ✓     | ✓    | ✓     |
//! | [`Posed`]          | ✓      | ✓     | ✓    | ✓     |
//! | [`Collidable`]     | ✓      | ✓     | ✓    |       |
//! | [`DofAddressable`] | ✓      | ✓     |      |       |
//!
//! Robots are objects whose [`EntityType`] is `Robot`.

use hashbrown::HashSet;
use nalgebra::DVector;
use sim_env_types::{
    DofInformation, EntityType, Limits, LinkId, ObjectId, Pose, Result, SimError, WorldId,
};

/// Identity of a registered entity.
pub trait Named {
    /// Unique name within the owning world.
    fn name(&self) -> &str;

    /// Kind of entity.
    fn entity_type(&self) -> EntityType;

    /// Id of the owning world.
    fn world_id(&self) -> WorldId;
}

/// An entity with a world-frame transform.
pub trait Posed {
    /// Current world-frame transform.
    fn transform(&self) -> Pose;
}

/// Something that can appear on either side of a collision query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    /// Every link of an object.
    Object(ObjectId),
    /// A single link.
    Link(LinkId),
}

/// An entity that can take part in collision queries.
pub trait Collidable {
    /// The query target this entity stands for.
    fn collision_target(&self) -> Target;
}

impl Collidable for Target {
    fn collision_target(&self) -> Target {
        *self
    }
}

impl Collidable for ObjectId {
    fn collision_target(&self) -> Target {
        Target::Object(*self)
    }
}

impl Collidable for LinkId {
    fn collision_target(&self) -> Target {
        Target::Link(*self)
    }
}

impl<T: Collidable + ?Sized> Collidable for &T {
    fn collision_target(&self) -> Target {
        (**self).collision_target()
    }
}

/// DOF-indexed read access to an object's configuration.
///
/// Accessors that take an index list fall back to the active DOF set when
/// the list is empty. Output vectors follow the order of the given list (or
/// of the active set).
pub trait DofAddressable {
    /// Number of base DOFs (0 for a static object).
    fn num_base_dofs(&self) -> usize;

    /// Total number of DOFs.
    fn num_dofs(&self) -> usize;

    /// The active DOF set.
    fn active_dofs(&self) -> &[usize];

    /// Position of a single DOF.
    fn dof_position(&self, index: usize) -> Option<f64>;

    /// Velocity of a single DOF.
    fn dof_velocity(&self, index: usize) -> Option<f64>;

    /// Descriptor of a single DOF.
    fn dof_information(&self, index: usize) -> Option<DofInformation>;

    /// Whether the object has no base DOFs.
    fn is_static(&self) -> bool {
        self.num_base_dofs() == 0
    }

    /// All DOF indices, `0..num_dofs`.
    fn dof_indices(&self) -> Vec<usize> {
        (0..self.num_dofs()).collect()
    }

    /// Size of the active DOF set.
    fn num_active_dofs(&self) -> usize {
        self.active_dofs().len()
    }

    /// Resolve an index list: empty means the active set.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidDofIndex`] for an index outside
    /// `[0, num_dofs)`.
    fn resolve_dofs<'a>(&'a self, indices: &'a [usize]) -> Result<&'a [usize]> {
        if indices.is_empty() {
            return Ok(self.active_dofs());
        }
        check_dof_indices(indices, self.num_dofs(), false)?;
        Ok(indices)
    }

    /// Positions of the given DOFs.
    fn dof_positions(&self, indices: &[usize]) -> Result<DVector<f64>> {
        let dofs = self.resolve_dofs(indices)?;
        Ok(DVector::from_iterator(
            dofs.len(),
            dofs.iter().map(|&i| self.dof_position(i).unwrap_or_default()),
        ))
    }

    /// Velocities of the given DOFs.
    fn dof_velocities(&self, indices: &[usize]) -> Result<DVector<f64>> {
        let dofs = self.resolve_dofs(indices)?;
        Ok(DVector::from_iterator(
            dofs.len(),
            dofs.iter().map(|&i| self.dof_velocity(i).unwrap_or_default()),
        ))
    }

    /// Position limits of the given DOFs.
    fn dof_position_limits(&self, indices: &[usize]) -> Result<Vec<Limits>> {
        self.collect_limits(indices, |info| info.position_limits)
    }

    /// Velocity limits of the given DOFs.
    fn dof_velocity_limits(&self, indices: &[usize]) -> Result<Vec<Limits>> {
        self.collect_limits(indices, |info| info.velocity_limits)
    }

    /// Acceleration limits of the given DOFs.
    fn dof_acceleration_limits(&self, indices: &[usize]) -> Result<Vec<Limits>> {
        self.collect_limits(indices, |info| info.acceleration_limits)
    }

    /// Positions of every DOF in index order.
    fn all_dof_positions(&self) -> DVector<f64> {
        DVector::from_iterator(
            self.num_dofs(),
            (0..self.num_dofs()).map(|i| self.dof_position(i).unwrap_or_default()),
        )
    }

    /// Velocities of every DOF in index order.
    fn all_dof_velocities(&self) -> DVector<f64> {
        DVector::from_iterator(
            self.num_dofs(),
            (0..self.num_dofs()).map(|i| self.dof_velocity(i).unwrap_or_default()),
        )
    }

    #[doc(hidden)]
    fn collect_limits(
        &self,
        indices: &[usize],
        pick: impl Fn(&DofInformation) -> Limits,
    ) -> Result<Vec<Limits>> {
        let dofs = self.resolve_dofs(indices)?;
        Ok(dofs
            .iter()
            .map(|&i| {
                self.dof_information(i)
                    .as_ref()
                    .map_or(Limits::UNLIMITED, &pick)
            })
            .collect())
    }
}

/// Validate a DOF index list against `num_dofs`.
///
/// # Errors
///
/// Returns [`SimError::InvalidDofIndex`] for an out-of-range entry and, when
/// `unique` is set, [`SimError::DuplicateDofIndex`] for a repeated one.
pub fn check_dof_indices(indices: &[usize], num_dofs: usize, unique: bool) -> Result<()> {
    let mut seen = HashSet::with_capacity(indices.len());
    for &index in indices {
        if index >= num_dofs {
            return Err(SimError::InvalidDofIndex { index, num_dofs });
        }
        if unique && !seen.insert(index) {
            return Err(SimError::DuplicateDofIndex { index });
        }
    }
    Ok(())
}
