//! Object and world state snapshots.
//!
//! An [`ObjectState`] is a complete, independent snapshot of one object: it
//! covers every DOF regardless of the active set, so restoring it does not
//! depend on whatever subset a planner is focused on at the time.

use std::collections::BTreeMap;

use nalgebra::DVector;

use crate::Pose;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Snapshot of a single object's mutable state.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ObjectState {
    /// Positions of all DOFs, in DOF-index order.
    pub dof_positions: DVector<f64>,
    /// Velocities of all DOFs, in DOF-index order.
    pub dof_velocities: DVector<f64>,
    /// World-frame pose of the object's base.
    pub pose: Pose,
    /// Active DOF set at the time of the snapshot.
    pub active_dofs: Vec<usize>,
}

impl ObjectState {
    /// Create a snapshot from its parts.
    #[must_use]
    pub fn new(
        dof_positions: DVector<f64>,
        dof_velocities: DVector<f64>,
        pose: Pose,
        active_dofs: Vec<usize>,
    ) -> Self {
        Self {
            dof_positions,
            dof_velocities,
            pose,
            active_dofs,
        }
    }

    /// Number of DOFs covered by the snapshot.
    #[must_use]
    pub fn num_dofs(&self) -> usize {
        self.dof_positions.len()
    }

    /// Whether the snapshot is internally consistent for an object with
    /// `num_dofs` DOFs.
    #[must_use]
    pub fn fits(&self, num_dofs: usize) -> bool {
        self.dof_positions.len() == num_dofs
            && self.dof_velocities.len() == num_dofs
            && self.active_dofs.iter().all(|&i| i < num_dofs)
    }

    /// Check if any value is `NaN` or infinite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.dof_positions.iter().all(|x| x.is_finite())
            && self.dof_velocities.iter().all(|x| x.is_finite())
            && self.pose.is_finite()
    }
}

/// Snapshot of every object in a world, keyed by object name.
pub type WorldState = BTreeMap<String, ObjectState>;

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(n: usize) -> ObjectState {
        ObjectState::new(
            DVector::zeros(n),
            DVector::zeros(n),
            Pose::identity(),
            (0..n).collect(),
        )
    }

    #[test]
    fn test_fits() {
        let state = sample(3);
        assert_eq!(state.num_dofs(), 3);
        assert!(state.fits(3));
        assert!(!state.fits(4));

        let mut bad = sample(2);
        bad.active_dofs.push(5);
        assert!(!bad.fits(2));
    }

    #[test]
    fn test_world_state_is_ordered() {
        let mut world = WorldState::new();
        world.insert("zeta".into(), sample(1));
        world.insert("alpha".into(), sample(2));
        let names: Vec<_> = world.keys().cloned().collect();
        assert_eq!(names, vec!["alpha".to_string(), "zeta".to_string()]);
    }

    #[test]
    fn test_is_finite() {
        let mut state = sample(2);
        assert!(state.is_finite());
        state.dof_velocities[1] = f64::NAN;
        assert!(!state.is_finite());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_snapshot() {
        let state = sample(2);
        let json = serde_json::to_string(&state).unwrap_or_default();
        let back: Option<ObjectState> = serde_json::from_str(&json).ok();
        assert_eq!(back, Some(state));
    }
}
