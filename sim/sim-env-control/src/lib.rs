//! Controllers for [`sim_env`] robots.
//!
//! Controllers are layered: position controllers compute a velocity
//! command and hand it to a velocity controller, which turns it into one
//! force per DOF.
//!
//! ```text
//! ┌───────────────────────────┐   ┌─────────────────────────┐
//! │ RobotPositionController   │   │ Se2PositionController   │
//! │ per-DOF brake profile     │   │ synchronized x, y, yaw  │
//! └─────────────┬─────────────┘   └────────────┬────────────┘
//!               └───────────┬──────────────────┘
//!                           ▼ set_target_velocity
//!              ┌──────────────────────────┐
//!              │ PidVelocityController    │  ──► forces
//!              └──────────────────────────┘
//! ```
//!
//! Any [`RobotController`] is bound to a world through
//! [`ControllerAdapter`], which reports `None` outputs as
//! [`ControlOutput::Skip`](sim_env::ControlOutput::Skip).
//!
//! # Example
//!
//! ```
//! use nalgebra::DVector;
//! use sim_env::reference::ReferenceBackend;
//! use sim_env::{DofAddressable, DofLimits, JointDescription, LinkDescription, ObjectDescription, World};
//! use sim_env_control::{ControllerAdapter, RobotController, RobotPositionController};
//!
//! let mut world = World::new(ReferenceBackend::new());
//! let mut tx = world.transaction();
//! let arm = tx
//!     .add_object(
//!         ObjectDescription::robot("arm")
//!             .with_link(LinkDescription::new("base"))
//!             .with_link(LinkDescription::new("tip"))
//!             .with_joint(
//!                 JointDescription::prismatic("slide", "base", "tip").with_limits(
//!                     DofLimits::unlimited()
//!                         .with_position(-1.0, 1.0)
//!                         .with_velocity(1.0)
//!                         .with_acceleration(5.0),
//!                 ),
//!             ),
//!     )
//!     .unwrap();
//!
//! let controller = ControllerAdapter::new(RobotPositionController::default()).into_shared();
//! controller.lock().set_target(&DVector::from_vec(vec![0.5])).unwrap();
//! tx.set_controller(arm, controller.clone()).unwrap();
//! tx.step_physics(300).unwrap();
//!
//! let position = tx.object(arm).unwrap().dof_position(0).unwrap();
//! assert!((position - 0.5).abs() < 0.05);
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,     // Many methods can't be const due to nalgebra
    clippy::suboptimal_flops,          // mul_add style changes aren't always clearer
    clippy::missing_errors_doc,        // Error docs added where non-obvious
    clippy::module_name_repetitions,   // PidVelocityController reads better
)]

pub mod angles;
pub mod limits;
pub mod pid;
mod position;
mod robot;
mod se2;
mod velocity;

pub use angles::{cyclic_position_error, normalize_orientation, shortest_so2_direction};
pub use limits::{clamp, scale_to_limits, ScalingResult};
pub use pid::{IndependentPidController, PidController};
pub use position::RobotPositionController;
pub use robot::{ControllerAdapter, ProjectionFn, RobotController, RobotVelocityController};
pub use se2::Se2PositionController;
pub use velocity::{PidVelocityController, DEFAULT_VELOCITY_KP};
