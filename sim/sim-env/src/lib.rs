//! Backend-agnostic simulator abstraction.
//!
//! This crate lets motion-planning and control code work against one stable
//! interface regardless of which simulator runs underneath. It builds on
//! [`sim_env_types`] for the data structures.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         World<B>                             │
//! │  Registry: objects, robots, links, joints (unique names)    │
//! │  Provides: DOF state, collision queries, state stack,       │
//! │            controller stepping, logger, lazy viewer         │
//! └─────────────┬───────────────────────────────┬───────────────┘
//!               │ transaction()                 │
//!               ▼                               ▼
//! ┌───────────────────────────┐   ┌─────────────────────────────┐
//! │       Transaction          │   │        Backend (B)          │
//! │  Every mutation: add,      │──►│  load_scene, collide,       │
//! │  set state, save/restore,  │   │  integrate, create_viewer   │
//! │  step_physics              │   └─────────────────────────────┘
//! └───────────────────────────┘
//! ```
//!
//! Entities are records in per-world arenas, addressed by id. Capabilities
//! are traits: [`Named`], [`Posed`], [`Collidable`] and [`DofAddressable`].
//! A robot is an object with entity type `Robot` and an optional bound
//! [`Controller`].
//!
//! # DOF Addressing
//!
//! An object with `k` free base axes and `n` joints has `k + n` DOFs; joint
//! `i` owns DOF `k + i`. Accessors taking an index list read the active DOF
//! set when the list is empty.
//!
//! # Quick Start
//!
//! ```
//! use sim_env::reference::{ReferenceBackend, Shape};
//! use sim_env::{DofAddressable, LinkDescription, ObjectDescription, Scope, World};
//! use sim_env_types::{Point3, Pose};
//!
//! let mut world = World::new(ReferenceBackend::new());
//! let mut tx = world.transaction();
//!
//! let ball = |name: &str, x: f64| {
//!     ObjectDescription::new(name)
//!         .with_pose(Pose::from_position(Point3::new(x, 0.0, 0.0)))
//!         .with_link(LinkDescription::new(name.to_owned() + "_link").with_geometry(Shape::sphere(0.5)))
//! };
//! let a = tx.add_object(ball("a", 0.0)).unwrap();
//! let b = tx.add_object(ball("b", 0.8)).unwrap();
//!
//! assert!(tx.collides(a, b));
//! assert!(tx.check_collision(a, Scope::Anything));
//! assert_eq!(tx.object(a).unwrap().num_dofs(), 0);
//! ```
//!
//! # Stepping
//!
//! ```
//! use sim_env::reference::ReferenceBackend;
//! use sim_env::{
//!     ControlError, ControlInput, ControlOutput, DofAddressable, JointDescription,
//!     LinkDescription, ObjectDescription, SharedController, World,
//! };
//! use nalgebra::DVector;
//!
//! let mut world = World::new(ReferenceBackend::new());
//! let mut tx = world.transaction();
//! let arm = tx
//!     .add_object(
//!         ObjectDescription::robot("arm")
//!             .with_link(LinkDescription::new("base"))
//!             .with_link(LinkDescription::new("tip"))
//!             .with_joint(JointDescription::revolute("hinge", "base", "tip")),
//!     )
//!     .unwrap();
//!
//! // Constant unit torque on every DOF.
//! let push = |input: &ControlInput<'_>| -> Result<ControlOutput, ControlError> {
//!     Ok(ControlOutput::Forces(DVector::from_element(input.positions.len(), 1.0)))
//! };
//! tx.set_controller(arm, SharedController::new(push)).unwrap();
//! tx.step_physics(3).unwrap();
//!
//! assert!(tx.object(arm).unwrap().dof_velocity(0).unwrap() > 0.0);
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,     // Many methods can't be const due to nalgebra
    clippy::suboptimal_flops,          // mul_add style changes aren't always clearer
    clippy::missing_errors_doc,        // Error docs added where non-obvious
    clippy::module_name_repetitions,   // ReferenceBackend, SharedWorld read better
)]

pub mod backend;
pub mod collision;
pub mod controller;
pub mod description;
pub mod entity;
mod joint;
mod kinematics;
mod link;
pub mod logger;
mod object;
pub mod reference;
mod registry;
mod shared;
pub mod viewer;
mod world;

pub use backend::{Backend, Dynamics, LinkGeometry};
pub use collision::Scope;
pub use controller::{ControlError, ControlInput, ControlOutput, Controller, SharedController};
pub use description::{JointDescription, LinkDescription, ObjectDescription, SceneDescription};
pub use entity::{check_dof_indices, Collidable, DofAddressable, Named, Posed, Target};
pub use joint::Joint;
pub use link::Link;
pub use logger::{ConsoleLogger, Logger, TracingLogger};
pub use object::Object;
pub use registry::Registry;
pub use shared::SharedWorld;
pub use viewer::{DrawnFrame, Handle, RecordingViewer, WorldViewer};
pub use world::{Transaction, World};

// Re-export key types from sim-env-types for convenience
pub use sim_env_types::{
    BaseAxis, BaseCoordinates, Contact, DofInformation, DofLimits, EntityKey, EntityType, JointId,
    JointType, Limits, LinkId, LogLevel, ObjectId, ObjectState, Pose, Result, SimError,
    WorldConfig, WorldId, WorldState,
};
