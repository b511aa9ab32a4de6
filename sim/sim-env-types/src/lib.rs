//! Core data types for the sim-env simulator abstraction.
//!
//! This crate provides the vocabulary shared by worlds, backends and
//! planners:
//!
//! - [`ObjectId`], [`LinkId`], [`JointId`], [`WorldId`] - Arena identifiers
//! - [`Pose`] - World-frame rigid transforms
//! - [`Limits`], [`DofLimits`], [`DofInformation`] - Per-DOF bounds
//! - [`ObjectState`], [`WorldState`] - Complete state snapshots
//! - [`Contact`] - Collision query results
//! - [`WorldConfig`] - Timestep and state-stack settings
//! - [`SimError`] - Everything that can go wrong
//!
//! # Design Philosophy
//!
//! These types are **pure data**. They carry no behavior tied to a
//! particular simulator, so the same snapshot can be produced by one backend
//! and inspected by a planner, a logger, or a serialization layer.
//!
//! # DOF Layout
//!
//! An object with `k` base DOFs and `n` joints has `k + n` DOFs. DOFs
//! `0..k` are base-pose axes ([`BaseAxis`]); joint `i` owns DOF `k + i`.
//! Static objects have `k = 0`.
//!
//! # Example
//!
//! ```
//! use sim_env_types::{Limits, ObjectState, Pose};
//! use nalgebra::DVector;
//!
//! let state = ObjectState::new(
//!     DVector::from_vec(vec![0.1, 0.2]),
//!     DVector::zeros(2),
//!     Pose::identity(),
//!     vec![0, 1],
//! );
//! assert!(state.fits(2));
//!
//! let free = Limits::unlimited();
//! assert_eq!(free.as_pair(), (f64::MIN, f64::MAX));
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,     // Many methods can't be const due to nalgebra
    clippy::suboptimal_flops,          // mul_add style changes aren't always clearer
    clippy::missing_errors_doc,        // Error docs added where non-obvious
)]

mod config;
mod contact;
mod dof;
mod error;
mod ids;
mod joint;
mod log;
mod pose;
mod state;

pub use config::WorldConfig;
pub use contact::Contact;
pub use dof::{BaseAxis, BaseCoordinates, DofInformation, DofLimits, Limits};
pub use error::SimError;
pub use ids::{EntityKey, EntityType, JointId, LinkId, ObjectId, WorldId};
pub use joint::JointType;
pub use log::LogLevel;
pub use pose::Pose;
pub use state::{ObjectState, WorldState};

// Re-export math types for convenience
pub use nalgebra::{DVector, Isometry3, Point3, UnitQuaternion, Vector3};

/// Result type for world operations.
pub type Result<T> = std::result::Result<T, SimError>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_dof_information_from_limits() {
        let limits = DofLimits::default()
            .with_position(-1.0, 1.0)
            .with_velocity(2.0);
        let info = DofInformation::new(4, limits, true);

        assert_eq!(info.dof_index, 4);
        assert_eq!(info.velocity_limits, Limits::new(-2.0, 2.0));
        assert!(info.acceleration_limits.is_unlimited());
        assert!(!info.cyclic);
    }

    #[test]
    fn test_state_snapshot_pose() {
        let pose = Pose::from_position(Point3::new(1.0, 2.0, 3.0));
        let state = ObjectState::new(DVector::zeros(0), DVector::zeros(0), pose, Vec::new());

        assert_eq!(state.pose.position.z, 3.0);
        assert!(state.fits(0));
    }
}
