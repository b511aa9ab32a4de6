//! Simulation world container and entity management.
//!
//! The [`World`] owns every registered object, robot, link and joint of one
//! simulation, the backend that executes it, and the LIFO stack of saved
//! world states. Reads go through `&World`; every mutation goes through a
//! [`Transaction`], which holds the world mutably borrowed for its lifetime.

use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use hashbrown::HashMap;
use nalgebra::DVector;
use sim_env_types::{
    Contact, EntityKey, JointId, LinkId, ObjectId, ObjectState, Pose, Result, SimError,
    WorldConfig, WorldId, WorldState,
};

use crate::backend::{Backend, Dynamics};
use crate::collision::{CollisionQuery, Scope};
use crate::controller::{ControlInput, ControlOutput, SharedController};
use crate::description::ObjectDescription;
use crate::entity::{Collidable, DofAddressable, Named};
use crate::joint::Joint;
use crate::link::Link;
use crate::logger::{Logger, TracingLogger};
use crate::object::Object;
use crate::registry::Registry;
use crate::viewer::WorldViewer;

static NEXT_WORLD_ID: AtomicU64 = AtomicU64::new(0);

const LOG_PREFIX: &str = "World";

/// A simulation world driven by one backend.
pub struct World<B: Backend> {
    id: WorldId,
    config: WorldConfig,
    backend: B,
    registry: Registry,
    geometry: HashMap<LinkId, B::Geometry>,
    state_stack: Vec<WorldState>,
    logger: Arc<dyn Logger>,
    viewer: Option<Box<dyn WorldViewer>>,
    time: f64,
    step_count: u64,
}

impl<B: Backend> World<B> {
    /// Create an empty world with the default configuration.
    #[must_use]
    pub fn new(backend: B) -> Self {
        let config = WorldConfig::default();
        Self {
            id: WorldId(NEXT_WORLD_ID.fetch_add(1, Ordering::Relaxed)),
            logger: Arc::new(TracingLogger::new(config.log_level)),
            config,
            backend,
            registry: Registry::default(),
            geometry: HashMap::new(),
            state_stack: Vec::new(),
            viewer: None,
            time: 0.0,
            step_count: 0,
        }
    }

    /// Create an empty world with a custom configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_config(backend: B, config: WorldConfig) -> Result<Self> {
        config.validate()?;
        let mut world = Self::new(backend);
        world.logger.set_level(config.log_level);
        world.config = config;
        Ok(world)
    }

    /// Replace the diagnostic sink. The sink's threshold is set to the
    /// configured [`WorldConfig::log_level`].
    #[must_use]
    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        logger.set_level(self.config.log_level);
        self.logger = logger;
        self
    }

    /// Open a transaction: exclusive, mutable access for a sequence of
    /// operations.
    pub fn transaction(&mut self) -> Transaction<'_, B> {
        Transaction { world: self }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// World id, shared by every entity of this world.
    #[must_use]
    pub fn id(&self) -> WorldId {
        self.id
    }

    /// Configuration.
    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// The backend.
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Entity arenas.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The diagnostic sink.
    #[must_use]
    pub fn logger(&self) -> &Arc<dyn Logger> {
        &self.logger
    }

    /// The visualization surface, created by the backend on first use.
    pub fn viewer(&mut self) -> &mut dyn WorldViewer {
        self.viewer
            .get_or_insert_with(|| self.backend.create_viewer())
            .as_mut()
    }

    /// Physics timestep in seconds.
    #[must_use]
    pub fn physics_timestep(&self) -> f64 {
        self.config.physics_timestep
    }

    /// Whether the backend can step physics.
    #[must_use]
    pub fn supports_physics(&self) -> bool {
        self.backend.supports_physics()
    }

    /// Simulated time in seconds.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Number of physics steps taken.
    #[must_use]
    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Geometry attached to a link.
    #[must_use]
    pub fn link_geometry(&self, id: LinkId) -> Option<&B::Geometry> {
        self.geometry.get(&id)
    }

    // =========================================================================
    // Entity Lookup
    // =========================================================================

    /// Object or robot by id.
    #[must_use]
    pub fn object(&self, id: ObjectId) -> Option<&Object> {
        self.registry.object(id)
    }

    /// Object by name. Robots are only returned when `exclude_robots` is
    /// false.
    #[must_use]
    pub fn object_by_name(&self, name: &str, exclude_robots: bool) -> Option<&Object> {
        self.registry
            .object_by_name(name)
            .filter(|o| !(exclude_robots && o.is_robot()))
    }

    /// Robot by id.
    #[must_use]
    pub fn robot(&self, id: ObjectId) -> Option<&Object> {
        self.registry.object(id).filter(|o| o.is_robot())
    }

    /// Robot by name.
    #[must_use]
    pub fn robot_by_name(&self, name: &str) -> Option<&Object> {
        self.registry.object_by_name(name).filter(|o| o.is_robot())
    }

    /// Every object, ordered by id. Robots are included unless
    /// `exclude_robots` is set.
    #[must_use]
    pub fn objects(&self, exclude_robots: bool) -> Vec<&Object> {
        self.registry
            .objects()
            .filter(|o| !(exclude_robots && o.is_robot()))
            .collect()
    }

    /// Every robot, ordered by id.
    #[must_use]
    pub fn robots(&self) -> Vec<&Object> {
        self.registry.objects().filter(|o| o.is_robot()).collect()
    }

    /// Whether any non-robot object is registered.
    #[must_use]
    pub fn has_objects(&self) -> bool {
        self.registry.objects().any(|o| !o.is_robot())
    }

    /// Whether any robot is registered.
    #[must_use]
    pub fn has_robots(&self) -> bool {
        self.registry.objects().any(Object::is_robot)
    }

    /// Link by id.
    #[must_use]
    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.registry.link(id)
    }

    /// Link by name.
    #[must_use]
    pub fn link_by_name(&self, name: &str) -> Option<&Link> {
        self.registry.link_by_name(name)
    }

    /// Joint by id.
    #[must_use]
    pub fn joint(&self, id: JointId) -> Option<&Joint> {
        self.registry.joint(id)
    }

    /// Joint by name.
    #[must_use]
    pub fn joint_by_name(&self, name: &str) -> Option<&Joint> {
        self.registry.joint_by_name(name)
    }

    /// Current position of a joint.
    #[must_use]
    pub fn joint_position(&self, id: JointId) -> Option<f64> {
        let joint = self.registry.joint(id)?;
        self.registry
            .object(joint.object())?
            .dof_position(joint.dof_index())
    }

    /// Current velocity of a joint.
    #[must_use]
    pub fn joint_velocity(&self, id: JointId) -> Option<f64> {
        let joint = self.registry.joint(id)?;
        self.registry
            .object(joint.object())?
            .dof_velocity(joint.dof_index())
    }

    /// Links of an object, in registration order.
    #[must_use]
    pub fn object_links(&self, id: ObjectId) -> Vec<&Link> {
        self.registry.object(id).map_or_else(Vec::new, |o| {
            o.links().iter().filter_map(|&l| self.registry.link(l)).collect()
        })
    }

    /// Joints of an object, in joint-index order.
    #[must_use]
    pub fn object_joints(&self, id: ObjectId) -> Vec<&Joint> {
        self.registry.object(id).map_or_else(Vec::new, |o| {
            o.joints().iter().filter_map(|&j| self.registry.joint(j)).collect()
        })
    }

    // =========================================================================
    // Collision Queries
    // =========================================================================

    /// Whether `target` collides with anything in `scope`. Stops at the
    /// first colliding link pair.
    pub fn check_collision<'s>(
        &self,
        target: impl Collidable,
        scope: impl Into<Scope<'s>>,
    ) -> bool {
        self.collision_query()
            .run(target.collision_target(), scope.into(), None)
    }

    /// Like [`check_collision`](Self::check_collision), but evaluates every
    /// link pair and appends every contact found to `contacts`.
    pub fn check_collision_contacts<'s>(
        &self,
        target: impl Collidable,
        scope: impl Into<Scope<'s>>,
        contacts: &mut Vec<Contact>,
    ) -> bool {
        self.collision_query()
            .run(target.collision_target(), scope.into(), Some(contacts))
    }

    /// Whether two entities collide.
    pub fn collides(&self, a: impl Collidable, b: impl Collidable) -> bool {
        self.check_collision(a, Scope::Entity(b.collision_target()))
    }

    /// Whether an entity collides with any other object.
    pub fn in_collision(&self, target: impl Collidable) -> bool {
        self.check_collision(target, Scope::Anything)
    }

    fn collision_query(&self) -> CollisionQuery<'_, B> {
        CollisionQuery {
            backend: &self.backend,
            registry: &self.registry,
            geometry: &self.geometry,
        }
    }

    // =========================================================================
    // World State
    // =========================================================================

    /// Snapshot of every registered object, keyed by name.
    #[must_use]
    pub fn world_state(&self) -> WorldState {
        self.registry
            .objects()
            .map(|o| (o.name().to_string(), o.state()))
            .collect()
    }

    /// Depth of the state stack.
    #[must_use]
    pub fn saved_state_count(&self) -> usize {
        self.state_stack.len()
    }

    fn check_world_state(&self, state: &WorldState) -> Result<Vec<(ObjectId, ObjectState)>> {
        state
            .iter()
            .map(|(name, object_state)| {
                let object = self
                    .registry
                    .object_by_name(name)
                    .ok_or_else(|| SimError::not_found(name.as_str()))?;
                object.check_state(object_state)?;
                Ok((object.id(), object_state.clone()))
            })
            .collect()
    }

    fn clear_saved_states(&mut self, reason: &str) {
        if self.state_stack.is_empty() {
            return;
        }
        tracing::debug!(dropped = self.state_stack.len(), reason, "cleared state stack");
        self.logger.log_debug(
            &format!("{reason}: discarding {} saved states", self.state_stack.len()),
            LOG_PREFIX,
        );
        self.state_stack.clear();
    }

    fn object_record(&mut self, id: ObjectId) -> Result<&mut Object> {
        self.registry
            .object_mut(id)
            .ok_or_else(|| SimError::not_found(id.to_string()))
    }

    // =========================================================================
    // Simulation Control
    // =========================================================================

    fn step_once(&mut self) -> Result<()> {
        let dt = self.config.physics_timestep;
        let mut forces: HashMap<ObjectId, DVector<f64>> = HashMap::new();

        for robot in self.registry.objects() {
            let Some(controller) = robot.controller() else {
                continue;
            };
            let positions = robot.all_dof_positions();
            let velocities = robot.all_dof_velocities();
            let input = ControlInput {
                positions: &positions,
                velocities: &velocities,
                timestep: dt,
                robot,
            };
            let output = controller.lock().compute(&input).map_err(|e| {
                tracing::warn!(robot = robot.name(), error = %e, "controller failed, aborting step");
                self.logger
                    .log_err(&format!("controller of {} failed: {e}", robot.name()), LOG_PREFIX);
                SimError::controller(robot.name(), e.to_string())
            })?;
            match output {
                ControlOutput::Forces(f) if f.len() != robot.num_dofs() => {
                    return Err(SimError::dimension_mismatch(
                        format!("forces of {}", robot.name()),
                        robot.num_dofs(),
                        f.len(),
                    ));
                }
                ControlOutput::Forces(f) => {
                    forces.insert(robot.id(), f);
                }
                ControlOutput::Skip => {}
            }
        }

        for id in self.registry.object_ids() {
            let Some(object) = self.registry.object_mut(id) else {
                continue;
            };
            let mut dynamics = Dynamics::new(object);
            self.backend.integrate(&mut dynamics, forces.get(&id), dt);
            self.registry.refresh(id);
        }

        self.time += dt;
        self.step_count += 1;
        Ok(())
    }
}

impl<B: Backend> fmt::Debug for World<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("id", &self.id)
            .field("backend", &self.backend.name())
            .field("objects", &self.registry.len())
            .field("saved_states", &self.state_stack.len())
            .field("time", &self.time)
            .finish_non_exhaustive()
    }
}

/// Exclusive access to a [`World`] for a sequence of mutations.
///
/// Reads are available through `Deref`, so a transaction can inspect the
/// world between mutations without giving up its borrow.
pub struct Transaction<'w, B: Backend> {
    world: &'w mut World<B>,
}

impl<B: Backend> std::ops::Deref for Transaction<'_, B> {
    type Target = World<B>;

    fn deref(&self) -> &World<B> {
        self.world
    }
}

impl<B: Backend> fmt::Debug for Transaction<'_, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Transaction").field(&self.world).finish()
    }
}

impl<B: Backend> Transaction<'_, B> {
    /// The backend, mutably.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.world.backend
    }

    // =========================================================================
    // Registry
    // =========================================================================

    /// Replace the world's contents with a scene loaded by the backend.
    ///
    /// If the backend cannot read the scene the world is unchanged. If an
    /// object of the scene fails to register, the world is left empty.
    pub fn load_world(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let descriptions = self.world.backend.load_scene(path)?;
        let world = &mut *self.world;
        world.clear_saved_states("world reloaded");
        world.registry.clear();
        world.geometry.clear();
        world.time = 0.0;
        world.step_count = 0;

        let count = descriptions.len();
        for desc in descriptions {
            if let Err(e) = self.register(desc) {
                self.world.registry.clear();
                self.world.geometry.clear();
                return Err(SimError::SceneLoad {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                });
            }
        }
        tracing::info!(path = %path.display(), objects = count, "loaded world");
        self.world
            .logger
            .log_info(&format!("loaded {count} objects from {}", path.display()), LOG_PREFIX);
        Ok(())
    }

    /// Register an object or robot.
    pub fn add_object(&mut self, desc: ObjectDescription<B::Geometry>) -> Result<ObjectId> {
        let id = self.register(desc)?;
        self.world.clear_saved_states("object added");
        Ok(id)
    }

    /// Remove an object with its links and joints. Returns false if it does
    /// not exist.
    pub fn remove_object(&mut self, id: ObjectId) -> bool {
        let Some(links) = self.world.registry.remove(id) else {
            return false;
        };
        for link in links {
            self.world.geometry.remove(&link);
        }
        self.world.clear_saved_states("object removed");
        tracing::debug!(object = %id, "removed object");
        true
    }

    /// Rename an entity.
    ///
    /// Meant for backends that discover final entity names while loading a
    /// scene. The state stack is keyed by name and therefore cleared.
    #[doc(hidden)]
    pub fn rename_entity(&mut self, key: impl Into<EntityKey>, name: &str) -> Result<()> {
        self.world.registry.rename(key.into(), name)?;
        self.world.clear_saved_states("entity renamed");
        Ok(())
    }

    fn register(&mut self, desc: ObjectDescription<B::Geometry>) -> Result<ObjectId> {
        let world = &mut *self.world;
        let name = desc.name.clone();
        let (id, geometry) = world.registry.insert(world.id, desc)?;
        world.geometry.extend(geometry);
        tracing::debug!(object = %id, name = %name, "registered object");
        Ok(id)
    }

    // =========================================================================
    // DOF State
    // =========================================================================

    /// Replace an object's active DOF set.
    pub fn set_active_dofs(&mut self, id: ObjectId, indices: &[usize]) -> Result<()> {
        self.world.object_record(id)?.set_active_dofs(indices)
    }

    /// Set DOF positions. An empty index list addresses the active DOFs.
    pub fn set_dof_positions(
        &mut self,
        id: ObjectId,
        values: &DVector<f64>,
        indices: &[usize],
    ) -> Result<()> {
        self.world.object_record(id)?.set_dof_positions(values, indices)?;
        self.world.registry.refresh(id);
        Ok(())
    }

    /// Set DOF velocities. An empty index list addresses the active DOFs.
    pub fn set_dof_velocities(
        &mut self,
        id: ObjectId,
        values: &DVector<f64>,
        indices: &[usize],
    ) -> Result<()> {
        self.world.object_record(id)?.set_dof_velocities(values, indices)
    }

    /// Move an object's base.
    pub fn set_transform(&mut self, id: ObjectId, pose: Pose) -> Result<()> {
        if !pose.is_finite() {
            return Err(SimError::invalid_config("pose is not finite"));
        }
        self.world.object_record(id)?.set_pose(pose);
        self.world.registry.refresh(id);
        Ok(())
    }

    /// Apply a full object snapshot.
    pub fn set_state(&mut self, id: ObjectId, state: &ObjectState) -> Result<()> {
        self.world.object_record(id)?.set_state(state)?;
        self.world.registry.refresh(id);
        Ok(())
    }

    // =========================================================================
    // World State
    // =========================================================================

    /// Apply a world snapshot. Every named object must exist and every state
    /// must fit its object; otherwise nothing is applied and false is
    /// returned.
    pub fn set_world_state(&mut self, state: &WorldState) -> bool {
        match self.world.check_world_state(state) {
            Ok(checked) => {
                self.apply_checked(checked);
                true
            }
            Err(e) => {
                tracing::debug!(error = %e, "rejected world state");
                self.world
                    .logger
                    .log_warn(&format!("world state not applied: {e}"), LOG_PREFIX);
                false
            }
        }
    }

    /// Push the current world state.
    pub fn save_state(&mut self) {
        let snapshot = self.world.world_state();
        let world = &mut *self.world;
        world.state_stack.push(snapshot);
        if let Some(depth) = world.config.max_saved_states {
            while world.state_stack.len() > depth {
                world.state_stack.remove(0);
                tracing::warn!(depth, "state stack full, dropped oldest saved state");
                world
                    .logger
                    .log_warn("state stack full, dropped oldest saved state", LOG_PREFIX);
            }
        }
    }

    /// Pop the most recently saved state and apply it. Returns false when
    /// the stack is empty.
    pub fn restore_state(&mut self) -> bool {
        let Some(snapshot) = self.world.state_stack.pop() else {
            return false;
        };
        match self.world.check_world_state(&snapshot) {
            Ok(checked) => {
                self.apply_checked(checked);
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "saved state no longer fits the world");
                false
            }
        }
    }

    fn apply_checked(&mut self, checked: Vec<(ObjectId, ObjectState)>) {
        for (id, state) in checked {
            if let Some(object) = self.world.registry.object_mut(id) {
                // Dimensions were checked against this object.
                let _ = object.set_state(&state);
            }
            self.world.registry.refresh(id);
        }
    }

    // =========================================================================
    // Simulation Control
    // =========================================================================

    /// Bind a controller to a robot, replacing any previous one.
    pub fn set_controller(
        &mut self,
        id: ObjectId,
        controller: impl Into<SharedController>,
    ) -> Result<()> {
        let object = self.world.object_record(id)?;
        if !object.is_robot() {
            return Err(SimError::invalid_config(format!(
                "{} is not a robot",
                object.name()
            )));
        }
        object.set_controller(Some(controller.into()));
        Ok(())
    }

    /// Unbind a robot's controller, returning it.
    pub fn clear_controller(&mut self, id: ObjectId) -> Option<SharedController> {
        let object = self.world.registry.object_mut(id)?;
        let previous = object.controller().cloned();
        object.set_controller(None);
        previous
    }

    /// Change the physics timestep.
    pub fn set_physics_timestep(&mut self, dt: f64) -> Result<()> {
        let config = WorldConfig {
            physics_timestep: dt,
            ..self.world.config.clone()
        };
        config.validate()?;
        self.world.config = config;
        Ok(())
    }

    /// Advance physics by `steps` timesteps.
    ///
    /// Each step invokes every bound controller once, in robot-id order,
    /// then integrates every object.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::PhysicsUnsupported`] without touching the world
    /// if the backend has no physics. A controller failure aborts the
    /// current step with [`SimError::Controller`]; completed steps are kept.
    pub fn step_physics(&mut self, steps: usize) -> Result<()> {
        if !self.world.backend.supports_physics() {
            return Err(SimError::PhysicsUnsupported {
                backend: self.world.backend.name().to_string(),
            });
        }
        for _ in 0..steps {
            self.world.step_once()?;
        }
        Ok(())
    }
}
