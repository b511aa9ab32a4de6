//! PID tracking of DOF velocities.

use nalgebra::DVector;
use sim_env::{ControlError, ControlInput, DofAddressable, Named, Object};
use tracing::warn;

use crate::limits::{scale_to_limits, ScalingResult};
use crate::pid::IndependentPidController;
use crate::robot::{gather_active, scatter_active, RobotController, RobotVelocityController};

/// Default proportional gain of the velocity loop.
pub const DEFAULT_VELOCITY_KP: f64 = 10.0;

/// Tracks a velocity target on the active DOFs with independent PIDs.
///
/// Each step the target is scaled uniformly into the active DOFs' velocity
/// limits, the PIDs run on the active DOF velocities, and their outputs are
/// written into a full-length force vector. Inactive DOFs get zero force.
#[derive(Debug, Clone)]
pub struct PidVelocityController {
    pid: IndependentPidController,
}

impl Default for PidVelocityController {
    fn default() -> Self {
        Self::new(DEFAULT_VELOCITY_KP, 0.0, 0.0)
    }
}

impl PidVelocityController {
    /// Create a controller with the given gains and no target.
    #[must_use]
    pub fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self {
            pid: IndependentPidController::new(kp, ki, kd),
        }
    }

    /// The underlying PID, for gain tuning.
    pub fn pid_mut(&mut self) -> &mut IndependentPidController {
        &mut self.pid
    }

    /// The underlying PID.
    #[must_use]
    pub fn pid(&self) -> &IndependentPidController {
        &self.pid
    }

    /// Current velocity target.
    #[must_use]
    pub fn target_velocity(&self) -> DVector<f64> {
        self.pid.target()
    }
}

impl RobotController for PidVelocityController {
    fn set_target(&mut self, target: &DVector<f64>) -> Result<(), ControlError> {
        self.set_target_velocity(target)
    }

    fn target_dimension(&self, robot: &Object) -> usize {
        robot.num_active_dofs()
    }

    fn control(&mut self, input: &ControlInput<'_>) -> Result<Option<DVector<f64>>, ControlError> {
        let robot = input.robot;
        let expected = robot.num_active_dofs();
        if self.pid.state_dimension() != expected {
            warn!(
                robot = robot.name(),
                target = self.pid.state_dimension(),
                active = expected,
                "velocity target does not match the active DOFs"
            );
            return Ok(None);
        }

        let mut target = self.pid.target();
        let limits = robot
            .dof_velocity_limits(&[])
            .map_err(|e| ControlError::Failed(e.to_string()))?;
        match scale_to_limits(&mut target, &limits)? {
            ScalingResult::NotScaled => {}
            ScalingResult::Scaled => {
                tracing::debug!(robot = robot.name(), "velocity target scaled into limits");
                self.pid.set_target(&target)?;
            }
            ScalingResult::Failure => {
                warn!(robot = robot.name(), "velocity target cannot be scaled into limits");
            }
        }

        let velocities = gather_active(robot, input.velocities);
        let output = self.pid.control(&velocities)?;
        Ok(Some(scatter_active(robot, &output)))
    }
}

impl RobotVelocityController for PidVelocityController {
    fn set_target_velocity(&mut self, velocity: &DVector<f64>) -> Result<(), ControlError> {
        if self.pid.state_dimension() != velocity.len() {
            self.pid.set_state_dimension(velocity.len());
        }
        self.pid.set_target(velocity)
    }
}
