//! Planar (x, y, yaw) position control for mobile robots.

use nalgebra::{DVector, Vector2, Vector3};
use sim_env::{BaseAxis, ControlError, ControlInput, DofAddressable, Limits, Named, Object};
use tracing::{debug, warn};

use crate::angles::{normalize_orientation, shortest_so2_direction};
use crate::robot::{RobotController, RobotVelocityController};
use crate::velocity::PidVelocityController;

/// Drives a planar robot base to a target `(x, y, yaw)`.
///
/// The robot's first three DOFs must be its `x`, `y` and `yaw` base axes.
/// Translation moves in a straight line towards the target and rotation
/// takes the shorter way around. Each part gets a trapezoidal speed
/// profile from its velocity and acceleration limits, and the faster part
/// is slowed so that both arrive together.
///
/// The resulting base velocities are handed to the wrapped velocity
/// controller; other active DOFs are commanded to stand still.
#[derive(Debug, Clone)]
pub struct Se2PositionController<V = PidVelocityController> {
    velocity: V,
    target: Option<Vector3<f64>>,
    cartesian_velocity_limit: f64,
    cartesian_acceleration_limit: f64,
    angular_velocity_limit: f64,
    angular_acceleration_limit: f64,
}

/// Smallest magnitude of the two bounds.
fn magnitude(limits: Limits) -> f64 {
    limits.min.abs().min(limits.max.abs())
}

/// Plateau speed that covers `distance` in `duration` with braking at
/// `acceleration`.
///
/// Solves `distance / v + v / (2·acceleration) = duration` for the smaller
/// root, in a form that stays accurate when the two terms nearly cancel.
fn synchronized_speed(acceleration: f64, duration: f64, distance: f64) -> f64 {
    let a = acceleration * duration;
    let b = (a * a - 2.0 * acceleration * distance).max(0.0);
    let denominator = a + b.sqrt();
    if denominator > 0.0 {
        2.0 * acceleration * distance / denominator
    } else {
        0.0
    }
}

/// Time to cover `distance` cruising at `speed` and then braking at
/// `acceleration`.
fn travel_time(distance: f64, speed: f64, acceleration: f64) -> f64 {
    let plateau = if distance > 0.0 {
        distance / speed - 0.5 * speed / acceleration
    } else {
        0.0
    };
    plateau.max(0.0) + speed / acceleration
}

impl<V: RobotVelocityController> Se2PositionController<V> {
    /// Create a controller for `robot`, reading its base limits.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::IncompatibleRobot`] if the robot does not
    /// start with `x`, `y` and `yaw` base DOFs, or if their velocity and
    /// acceleration limits are not finite and non-zero.
    pub fn new(robot: &Object, velocity: V) -> Result<Self, ControlError> {
        if robot.is_static() || !robot.base_axes().starts_with(&BaseAxis::PLANAR) {
            return Err(ControlError::IncompatibleRobot(format!(
                "{} must have x, y and yaw as its first base DOFs",
                robot.name()
            )));
        }
        let base = [0, 1, 2];
        let velocity_limits = robot
            .dof_velocity_limits(&base)
            .map_err(|e| ControlError::Failed(e.to_string()))?;
        let acceleration_limits = robot
            .dof_acceleration_limits(&base)
            .map_err(|e| ControlError::Failed(e.to_string()))?;

        let controller = Self {
            velocity,
            target: None,
            cartesian_velocity_limit: magnitude(velocity_limits[0])
                .min(magnitude(velocity_limits[1])),
            cartesian_acceleration_limit: magnitude(acceleration_limits[0])
                .min(magnitude(acceleration_limits[1])),
            angular_velocity_limit: magnitude(velocity_limits[2]),
            angular_acceleration_limit: magnitude(acceleration_limits[2]),
        };
        let limits = [
            controller.cartesian_velocity_limit,
            controller.cartesian_acceleration_limit,
            controller.angular_velocity_limit,
            controller.angular_acceleration_limit,
        ];
        // Unlimited axes report f64::MAX, which would overflow below.
        if limits.iter().any(|&l| !(l > 0.0 && l < f64::MAX)) {
            return Err(ControlError::IncompatibleRobot(format!(
                "{} needs finite, non-zero velocity and acceleration limits on x, y and yaw",
                robot.name()
            )));
        }
        Ok(controller)
    }

    /// Current target, with yaw normalized into `(-π, π]`.
    #[must_use]
    pub fn target_pose(&self) -> Option<Vector3<f64>> {
        self.target
    }

    /// Forget the target; the controller skips until a new one is set.
    pub fn clear_target(&mut self) {
        self.target = None;
    }

    /// Cartesian and angular velocity limits in use.
    #[must_use]
    pub fn velocity_limits(&self) -> (f64, f64) {
        (self.cartesian_velocity_limit, self.angular_velocity_limit)
    }

    /// Cartesian and angular acceleration limits in use.
    #[must_use]
    pub fn acceleration_limits(&self) -> (f64, f64) {
        (self.cartesian_acceleration_limit, self.angular_acceleration_limit)
    }

    /// The wrapped velocity controller.
    pub fn velocity_controller_mut(&mut self) -> &mut V {
        &mut self.velocity
    }

    /// Base velocity `(ẋ, ẏ, ω)` towards `target` from `pose`.
    fn set_point(&self, pose: Vector3<f64>, target: Vector3<f64>) -> Vector3<f64> {
        let (acc_c, acc_a) = self.acceleration_limits();

        let offset = Vector2::new(target.x - pose.x, target.y - pose.y);
        let distance = offset.norm();
        let direction = if distance > 0.0 {
            offset / distance
        } else {
            Vector2::zeros()
        };
        let mut speed = (2.0 * distance * acc_c)
            .sqrt()
            .min(self.cartesian_velocity_limit);

        let turn = shortest_so2_direction(normalize_orientation(pose.z), target.z);
        let angle = turn.abs();
        let mut omega = (2.0 * angle * acc_a).sqrt().min(self.angular_velocity_limit);

        let t_cartesian = travel_time(distance, speed, acc_c);
        let t_angular = travel_time(angle, omega, acc_a);
        if t_cartesian < t_angular {
            speed = synchronized_speed(acc_c, t_angular, distance);
        } else {
            omega = synchronized_speed(acc_a, t_cartesian, angle);
        }

        let omega = if angle > 0.0 { omega * turn.signum() } else { 0.0 };
        Vector3::new(speed * direction.x, speed * direction.y, omega)
    }
}

impl<V: RobotVelocityController> RobotController for Se2PositionController<V> {
    fn set_target(&mut self, target: &DVector<f64>) -> Result<(), ControlError> {
        ControlError::check_len("target pose", 3, target.len())?;
        let target = Vector3::new(target[0], target[1], normalize_orientation(target[2]));
        debug!(x = target.x, y = target.y, yaw = target.z, "planar target set");
        self.target = Some(target);
        Ok(())
    }

    fn target_dimension(&self, _robot: &Object) -> usize {
        3
    }

    fn control(&mut self, input: &ControlInput<'_>) -> Result<Option<DVector<f64>>, ControlError> {
        let robot = input.robot;
        let Some(target) = self.target else {
            warn!(robot = robot.name(), "no planar target set");
            return Ok(None);
        };
        ControlError::check_len("positions", robot.num_dofs(), input.positions.len())?;

        let pose = Vector3::new(input.positions[0], input.positions[1], input.positions[2]);
        let base = self.set_point(pose, target);

        let active = robot.active_dofs();
        let commanded = DVector::from_iterator(
            active.len(),
            active.iter().map(|&dof| base.get(dof).copied().unwrap_or(0.0)),
        );
        self.velocity.set_target_velocity(&commanded)?;
        self.velocity.control(input)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_synchronized_speed_matches_duration() {
        let (acc, distance) = (2.0, 3.0);
        let v = synchronized_speed(acc, 4.0, distance);
        assert_relative_eq!(travel_time(distance, v, acc), 4.0, epsilon = 1e-12);
        assert_eq!(synchronized_speed(acc, 0.0, 0.0), 0.0);
    }

    #[test]
    fn test_travel_time_in_braking_phase() {
        // Already too fast to cruise: only the braking time remains.
        assert_relative_eq!(travel_time(0.1, 1.0, 1.0), 1.0);
        assert_relative_eq!(travel_time(0.0, 0.0, 1.0), 0.0);
    }

    fn unit_controller() -> Se2PositionController<PidVelocityController> {
        Se2PositionController {
            velocity: PidVelocityController::default(),
            target: None,
            cartesian_velocity_limit: 1.0,
            cartesian_acceleration_limit: 1.0,
            angular_velocity_limit: 1.0,
            angular_acceleration_limit: 1.0,
        }
    }

    #[test]
    fn test_set_point_points_at_target() {
        let controller = unit_controller();
        let v = controller.set_point(Vector3::zeros(), Vector3::new(3.0, 4.0, 0.0));
        assert_relative_eq!(v, Vector3::new(0.6, 0.8, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_set_point_turns_short_way() {
        let controller = unit_controller();
        let v = controller.set_point(Vector3::new(0.0, 0.0, PI - 0.05), Vector3::new(0.0, 0.0, -PI + 0.05));
        assert!(v.z > 0.0);
        assert_eq!((v.x, v.y), (0.0, 0.0));
    }

    #[test]
    fn test_set_point_at_target_is_zero() {
        let controller = unit_controller();
        let here = Vector3::new(1.0, 2.0, FRAC_PI_2);
        assert_eq!(controller.set_point(here, here), Vector3::zeros());
    }

    #[test]
    fn test_set_target_validates_and_normalizes() {
        let mut controller = unit_controller();
        let err = controller.set_target(&DVector::zeros(2)).unwrap_err();
        assert_eq!(err, ControlError::dimension_mismatch("target pose", 3, 2));
        assert!(controller.target_pose().is_none());

        controller
            .set_target(&DVector::from_vec(vec![1.0, 2.0, 3.0 * FRAC_PI_2]))
            .unwrap();
        let target = controller.target_pose().unwrap();
        assert_relative_eq!(target.z, -FRAC_PI_2, epsilon = 1e-12);
        controller.clear_target();
        assert!(controller.target_pose().is_none());
    }
}
