//! Closed-loop controllers invoked during physics stepping.
//!
//! Once per step, the world hands every robot with a bound controller its
//! full DOF state and asks for one generalized force per DOF:
//!
//! ```text
//! positions, velocities, dt, &robot ──► Controller::compute ──► Forces(v) | Skip
//! ```
//!
//! `Skip` leaves the robot's forces unset for that step. Controllers are
//! bound by shared reference so that the caller can keep retargeting them
//! between steps.

use std::sync::Arc;

use nalgebra::DVector;
use parking_lot::{Mutex, MutexGuard};
use thiserror::Error;

use crate::object::Object;

/// Input to one controller invocation.
#[derive(Debug, Clone, Copy)]
pub struct ControlInput<'a> {
    /// Positions of every DOF.
    pub positions: &'a DVector<f64>,
    /// Velocities of every DOF.
    pub velocities: &'a DVector<f64>,
    /// Physics timestep in seconds.
    pub timestep: f64,
    /// The robot being controlled.
    pub robot: &'a Object,
}

/// Result of one controller invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlOutput {
    /// One generalized force per DOF.
    Forces(DVector<f64>),
    /// Apply no forces this step.
    Skip,
}

/// Failure reported by a controller.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ControlError {
    /// A vector argument has the wrong length.
    #[error("{what}: expected length {expected}, got {actual}")]
    DimensionMismatch {
        /// What was being checked.
        what: String,
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// The controller has no target to drive towards.
    #[error("no target set")]
    MissingTarget,

    /// The robot lacks the DOFs the controller needs.
    #[error("incompatible robot: {0}")]
    IncompatibleRobot(String),

    /// Any other failure.
    #[error("{0}")]
    Failed(String),
}

impl ControlError {
    /// Create a dimension mismatch error.
    #[must_use]
    pub fn dimension_mismatch(what: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            what: what.into(),
            expected,
            actual,
        }
    }

    /// Check a length, returning a dimension mismatch error if it differs.
    pub fn check_len(what: &str, expected: usize, actual: usize) -> Result<(), Self> {
        if expected == actual {
            Ok(())
        } else {
            Err(Self::dimension_mismatch(what, expected, actual))
        }
    }
}

/// A robot controller.
pub trait Controller: Send {
    /// Compute the forces for the current step.
    fn compute(&mut self, input: &ControlInput<'_>) -> Result<ControlOutput, ControlError>;
}

impl<F> Controller for F
where
    F: FnMut(&ControlInput<'_>) -> Result<ControlOutput, ControlError> + Send,
{
    fn compute(&mut self, input: &ControlInput<'_>) -> Result<ControlOutput, ControlError> {
        self(input)
    }
}

/// A controller bound to a robot, shared with the caller.
#[derive(Clone)]
pub struct SharedController(Arc<Mutex<dyn Controller>>);

impl SharedController {
    /// Wrap a controller.
    pub fn new<C: Controller + 'static>(controller: C) -> Self {
        Self(Arc::new(Mutex::new(controller)))
    }

    /// Lock the controller.
    pub fn lock(&self) -> MutexGuard<'_, dyn Controller> {
        self.0.lock()
    }

    /// Whether two handles refer to the same controller.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.0).cast::<()>(),
            Arc::as_ptr(&other.0).cast::<()>(),
        )
    }
}

impl<C: Controller + 'static> From<Arc<Mutex<C>>> for SharedController {
    fn from(controller: Arc<Mutex<C>>) -> Self {
        Self(controller)
    }
}

impl std::fmt::Debug for SharedController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SharedController(<dyn>)")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_check_len() {
        assert!(ControlError::check_len("target", 3, 3).is_ok());
        let err = ControlError::check_len("target", 3, 2).unwrap_err();
        assert_eq!(err.to_string(), "target: expected length 3, got 2");
    }

    #[test]
    fn test_shared_handle_keeps_caller_access() {
        struct Counter(usize);
        impl Controller for Counter {
            fn compute(&mut self, _: &ControlInput<'_>) -> Result<ControlOutput, ControlError> {
                self.0 += 1;
                Ok(ControlOutput::Skip)
            }
        }

        let inner = Arc::new(Mutex::new(Counter(0)));
        let shared = SharedController::from(Arc::clone(&inner));
        assert!(shared.ptr_eq(&shared.clone()));
        assert_eq!(format!("{shared:?}"), "SharedController(<dyn>)");
        inner.lock().0 = 5;
        assert_eq!(inner.lock().0, 5);
    }
}
