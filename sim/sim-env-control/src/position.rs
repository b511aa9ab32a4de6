//! Position control of the active DOFs through a velocity controller.

use nalgebra::DVector;
use sim_env::{ControlError, ControlInput, DofAddressable, Named, Object};
use tracing::warn;

use crate::angles::{cyclic_position_error, normalize_orientation};
use crate::robot::{gather_active, ProjectionFn, RobotController, RobotVelocityController};
use crate::velocity::PidVelocityController;

/// Drives the active DOFs to a target position.
///
/// Every DOF is commanded independently to move at its velocity limit
/// towards the target, slowed so that it can still brake in time:
///
/// ```text
/// e        = target - q              (wrap-around error for cyclic DOFs)
/// a_brake  = |acc.max| if v < 0 else |acc.min|
/// v_cmd    = sign(e) · min(|vel limit in sign(e)|, sqrt(2·|e|·a_brake))
/// ```
///
/// The commanded velocities are handed to the wrapped velocity controller.
pub struct RobotPositionController<V = PidVelocityController> {
    velocity: V,
    target: DVector<f64>,
    position_projection: Option<ProjectionFn>,
    velocity_projection: Option<ProjectionFn>,
}

impl Default for RobotPositionController {
    fn default() -> Self {
        Self::new(PidVelocityController::default())
    }
}

impl<V: RobotVelocityController> RobotPositionController<V> {
    /// Create a position controller on top of a velocity controller.
    #[must_use]
    pub fn new(velocity: V) -> Self {
        Self {
            velocity,
            target: DVector::zeros(0),
            position_projection: None,
            velocity_projection: None,
        }
    }

    /// Project the target position before it is tracked.
    #[must_use]
    pub fn with_position_projection(
        mut self,
        projection: impl FnMut(&mut DVector<f64>, &Object) + Send + 'static,
    ) -> Self {
        self.position_projection = Some(Box::new(projection));
        self
    }

    /// Project the commanded velocity before it is handed on.
    #[must_use]
    pub fn with_velocity_projection(
        mut self,
        projection: impl FnMut(&mut DVector<f64>, &Object) + Send + 'static,
    ) -> Self {
        self.velocity_projection = Some(Box::new(projection));
        self
    }

    /// Set the target position, one entry per active DOF.
    pub fn set_target_position(&mut self, position: &DVector<f64>) {
        self.target = position.clone();
    }

    /// Current target position.
    #[must_use]
    pub fn target_position(&self) -> &DVector<f64> {
        &self.target
    }

    /// The wrapped velocity controller.
    pub fn velocity_controller_mut(&mut self) -> &mut V {
        &mut self.velocity
    }

    /// Velocities that bring the active DOFs to `target` without overshoot.
    fn commanded_velocities(
        robot: &Object,
        target: &DVector<f64>,
        positions: &DVector<f64>,
        velocities: &DVector<f64>,
    ) -> DVector<f64> {
        let active = robot.active_dofs();
        DVector::from_iterator(
            active.len(),
            active.iter().enumerate().map(|(idx, &dof)| {
                let Some(info) = robot.dof_information(dof) else {
                    return 0.0;
                };
                let error = if info.cyclic {
                    cyclic_position_error(
                        info.position_limits,
                        normalize_orientation(positions[idx]),
                        normalize_orientation(target[idx]),
                    )
                } else {
                    target[idx] - positions[idx]
                };

                let (sign, limit) = if error.is_sign_negative() {
                    (-1.0, info.velocity_limits.min)
                } else {
                    (1.0, info.velocity_limits.max)
                };
                let brake = if velocities[idx].is_sign_negative() {
                    info.acceleration_limits.max.abs()
                } else {
                    info.acceleration_limits.min.abs()
                };
                let brake_velocity = (2.0 * error.abs() * brake).sqrt();
                sign * brake_velocity.min(limit.abs())
            }),
        )
    }
}

impl<V: RobotVelocityController> RobotController for RobotPositionController<V> {
    fn set_target(&mut self, target: &DVector<f64>) -> Result<(), ControlError> {
        self.set_target_position(target);
        Ok(())
    }

    fn target_dimension(&self, robot: &Object) -> usize {
        robot.num_active_dofs()
    }

    fn control(&mut self, input: &ControlInput<'_>) -> Result<Option<DVector<f64>>, ControlError> {
        let robot = input.robot;
        if self.target.len() != robot.num_active_dofs() {
            warn!(
                robot = robot.name(),
                target = self.target.len(),
                active = robot.num_active_dofs(),
                "target position does not match the active DOFs"
            );
            return Ok(None);
        }

        let mut target = self.target.clone();
        if let Some(project) = self.position_projection.as_mut() {
            project(&mut target, robot);
        }

        let positions = gather_active(robot, input.positions);
        let velocities = gather_active(robot, input.velocities);
        let mut commanded = Self::commanded_velocities(robot, &target, &positions, &velocities);
        if let Some(project) = self.velocity_projection.as_mut() {
            project(&mut commanded, robot);
        }

        self.velocity.set_target_velocity(&commanded)?;
        self.velocity.control(input)
    }
}

impl<V: std::fmt::Debug> std::fmt::Debug for RobotPositionController<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RobotPositionController")
            .field("velocity", &self.velocity)
            .field("target", &self.target)
            .field("position_projection", &self.position_projection.is_some())
            .field("velocity_projection", &self.velocity_projection.is_some())
            .finish()
    }
}
