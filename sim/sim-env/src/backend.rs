//! The seam between the generic world and a concrete simulator.
//!
//! A [`Backend`] supplies the pieces that depend on a particular geometry
//! and physics engine: scene loading, pairwise link collision, one
//! integration step of an object's DOFs, and a visualization surface.
//! Everything else (naming, DOF addressing, the state stack, controller
//! scheduling and collision-query composition) lives in the world and is
//! shared across backends.

use std::fmt::Debug;
use std::path::Path;

use nalgebra::DVector;
use sim_env_types::{Contact, DofInformation, LinkId, ObjectId, Pose, Result};

use crate::description::ObjectDescription;
use crate::entity::DofAddressable;
use crate::object::Object;
use crate::viewer::WorldViewer;

/// A link as seen by the narrow phase: its identity, world transform and
/// backend geometry.
#[derive(Debug, Clone, Copy)]
pub struct LinkGeometry<'a, G> {
    /// Owning object.
    pub object: ObjectId,
    /// The link.
    pub link: LinkId,
    /// World-frame transform of the link.
    pub transform: Pose,
    /// Backend geometry attached to the link.
    pub geometry: &'a G,
}

/// Mutable access to an object's DOF state during integration.
///
/// Position writes go through the object, so base DOFs update the object
/// pose. Link transforms are refreshed by the world after the backend
/// returns.
pub struct Dynamics<'a> {
    object: &'a mut Object,
}

impl<'a> Dynamics<'a> {
    pub(crate) fn new(object: &'a mut Object) -> Self {
        Self { object }
    }

    /// The object being integrated.
    #[must_use]
    pub fn object(&self) -> &Object {
        self.object
    }

    /// Number of DOFs.
    #[must_use]
    pub fn num_dofs(&self) -> usize {
        self.object.num_dofs()
    }

    /// Positions of every DOF in index order.
    #[must_use]
    pub fn positions(&self) -> DVector<f64> {
        self.object.all_dof_positions()
    }

    /// Velocities of every DOF in index order.
    #[must_use]
    pub fn velocities(&self) -> DVector<f64> {
        self.object.all_dof_velocities()
    }

    /// Descriptor of a DOF.
    #[must_use]
    pub fn dof_information(&self, index: usize) -> Option<DofInformation> {
        self.object.dof_information(index)
    }

    /// Overwrite every DOF position. Extra entries are ignored.
    pub fn set_positions(&mut self, positions: &DVector<f64>) {
        self.object.set_all_positions(positions);
    }

    /// Overwrite every DOF velocity. A vector of the wrong length is ignored.
    pub fn set_velocities(&mut self, velocities: &DVector<f64>) {
        self.object.set_all_velocities(velocities);
    }
}

impl Debug for Dynamics<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dynamics")
            .field("object", &self.object.id())
            .finish()
    }
}

/// A concrete simulator behind a [`World`](crate::World).
pub trait Backend: Send {
    /// Geometry attached to links.
    type Geometry: Clone + Debug + Send + Sync + 'static;

    /// Backend name, used in logs and errors.
    fn name(&self) -> &str;

    /// Whether [`integrate`](Self::integrate) does anything.
    fn supports_physics(&self) -> bool;

    /// Read a scene file into object descriptions.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::SceneLoad`](sim_env_types::SimError::SceneLoad)
    /// if the file cannot be read or parsed.
    fn load_scene(&mut self, path: &Path) -> Result<Vec<ObjectDescription<Self::Geometry>>>;

    /// Test two links for collision.
    ///
    /// When `contacts` is given, every contact found is appended with its
    /// normal pointing from `a` to `b`.
    fn collide(
        &self,
        a: &LinkGeometry<'_, Self::Geometry>,
        b: &LinkGeometry<'_, Self::Geometry>,
        contacts: Option<&mut Vec<Contact>>,
    ) -> bool;

    /// Advance one object by `dt`. `forces` holds one generalized force per
    /// DOF, or `None` when no controller drives the object this step.
    fn integrate(&mut self, object: &mut Dynamics<'_>, forces: Option<&DVector<f64>>, dt: f64);

    /// Create the visualization surface for a world.
    fn create_viewer(&mut self) -> Box<dyn WorldViewer>;
}
