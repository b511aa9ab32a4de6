//! Robot-level controller traits and the adapter that binds them to a world.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use nalgebra::DVector;
use parking_lot::Mutex;
use sim_env::{ControlError, ControlInput, ControlOutput, Controller, DofAddressable, Object};

/// Mutates a target vector in place given the controlled robot.
///
/// Used to project targets onto a constraint set before they are tracked.
pub type ProjectionFn = Box<dyn FnMut(&mut DVector<f64>, &Object) + Send>;

/// A controller that tracks a target vector for a robot.
///
/// Controllers do not hold on to the robot; it is passed in with every
/// [`ControlInput`].
pub trait RobotController: Send {
    /// Set the target to track.
    fn set_target(&mut self, target: &DVector<f64>) -> Result<(), ControlError>;

    /// Length of the target this controller expects for `robot`.
    fn target_dimension(&self, robot: &Object) -> usize;

    /// Compute one force per DOF of the robot, or `None` to leave the robot
    /// unactuated this step.
    fn control(&mut self, input: &ControlInput<'_>) -> Result<Option<DVector<f64>>, ControlError>;
}

/// A controller that tracks DOF velocities.
pub trait RobotVelocityController: RobotController {
    /// Set the velocity target, one entry per active DOF.
    fn set_target_velocity(&mut self, velocity: &DVector<f64>) -> Result<(), ControlError>;
}

/// Binds a [`RobotController`] as a world [`Controller`].
///
/// ```ignore
/// let handle = ControllerAdapter::new(controller).into_shared();
/// tx.set_controller(robot, handle.clone())?;
/// handle.lock().set_target(&target)?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct ControllerAdapter<C>(C);

impl<C: RobotController> ControllerAdapter<C> {
    /// Wrap a robot controller.
    #[must_use]
    pub fn new(controller: C) -> Self {
        Self(controller)
    }

    /// Wrap in a shared handle that can be bound to a world and retargeted
    /// by the caller.
    #[must_use]
    pub fn into_shared(self) -> Arc<Mutex<Self>> {
        Arc::new(Mutex::new(self))
    }

    /// Unwrap the robot controller.
    pub fn into_inner(self) -> C {
        self.0
    }
}

impl<C> Deref for ControllerAdapter<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.0
    }
}

impl<C> DerefMut for ControllerAdapter<C> {
    fn deref_mut(&mut self) -> &mut C {
        &mut self.0
    }
}

impl<C: RobotController> Controller for ControllerAdapter<C> {
    fn compute(&mut self, input: &ControlInput<'_>) -> Result<ControlOutput, ControlError> {
        Ok(self
            .0
            .control(input)?
            .map_or(ControlOutput::Skip, ControlOutput::Forces))
    }
}

/// Values of the active DOFs, gathered from a full DOF vector.
pub(crate) fn gather_active(robot: &Object, all: &DVector<f64>) -> DVector<f64> {
    let active = robot.active_dofs();
    DVector::from_iterator(
        active.len(),
        active.iter().map(|&i| all.get(i).copied().unwrap_or_default()),
    )
}

/// Full force vector with `active_values` at the active DOFs and zero
/// elsewhere.
pub(crate) fn scatter_active(robot: &Object, active_values: &DVector<f64>) -> DVector<f64> {
    let mut forces = DVector::zeros(robot.num_dofs());
    for (&dof, &value) in robot.active_dofs().iter().zip(active_values.iter()) {
        forces[dof] = value;
    }
    forces
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use sim_env::reference::ReferenceBackend;
    use sim_env::{JointDescription, LinkDescription, ObjectDescription, World};

    /// Replays a fixed answer.
    struct Fixed(Option<DVector<f64>>);

    impl RobotController for Fixed {
        fn set_target(&mut self, _: &DVector<f64>) -> Result<(), ControlError> {
            Ok(())
        }

        fn target_dimension(&self, _: &Object) -> usize {
            0
        }

        fn control(&mut self, _: &ControlInput<'_>) -> Result<Option<DVector<f64>>, ControlError> {
            Ok(self.0.clone())
        }
    }

    fn chain() -> (World<ReferenceBackend>, sim_env::ObjectId) {
        let mut world = World::new(ReferenceBackend::new());
        let id = world
            .transaction()
            .add_object(
                ObjectDescription::robot("chain")
                    .with_link(LinkDescription::new("l0"))
                    .with_link(LinkDescription::new("l1"))
                    .with_link(LinkDescription::new("l2"))
                    .with_link(LinkDescription::new("l3"))
                    .with_joint(JointDescription::revolute("j0", "l0", "l1").with_position(0.1))
                    .with_joint(JointDescription::revolute("j1", "l1", "l2").with_position(0.2))
                    .with_joint(JointDescription::revolute("j2", "l2", "l3").with_position(0.3)),
            )
            .unwrap();
        world.transaction().set_active_dofs(id, &[2, 0]).unwrap();
        (world, id)
    }

    #[test]
    fn test_adapter_maps_none_to_skip() {
        let (world, id) = chain();
        let robot = world.robot(id).unwrap();
        let positions = robot.all_dof_positions();
        let velocities = robot.all_dof_velocities();
        let input = ControlInput {
            positions: &positions,
            velocities: &velocities,
            timestep: 0.01,
            robot,
        };

        let mut skip = ControllerAdapter::new(Fixed(None));
        assert_eq!(skip.compute(&input).unwrap(), ControlOutput::Skip);

        let forces = DVector::from_vec(vec![1.0, 2.0, 3.0]);
        let mut push = ControllerAdapter::new(Fixed(Some(forces.clone())));
        assert_eq!(push.compute(&input).unwrap(), ControlOutput::Forces(forces));
        assert!(push.into_inner().0.is_some());
    }

    #[test]
    fn test_gather_and_scatter_follow_active_order() {
        let (world, id) = chain();
        let robot = world.robot(id).unwrap();
        let active = gather_active(robot, &robot.all_dof_positions());
        assert_eq!(active, DVector::from_vec(vec![0.3, 0.1]));

        let forces = scatter_active(robot, &DVector::from_vec(vec![5.0, 7.0]));
        assert_eq!(forces, DVector::from_vec(vec![7.0, 0.0, 5.0]));
    }
}
