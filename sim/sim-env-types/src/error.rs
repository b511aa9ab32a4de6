//! Error types for world operations.
//!
//! Lookups by name or id never produce an error; they return `None`. The
//! variants below cover precondition violations (malformed DOF index lists,
//! stepping without physics support, duplicate names), scene loading
//! failures, and controller failures raised during a physics step.

use thiserror::Error;

/// Errors that can occur while building or driving a world.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    /// A DOF index lies outside `[0, num_dofs)`.
    #[error("DOF index {index} out of range for object with {num_dofs} DOFs")]
    InvalidDofIndex {
        /// The offending index.
        index: usize,
        /// Number of DOFs of the object.
        num_dofs: usize,
    },

    /// A DOF index appears twice where uniqueness is required.
    #[error("duplicate DOF index {index}")]
    DuplicateDofIndex {
        /// The repeated index.
        index: usize,
    },

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

    /// An entity name is already taken in this world.
    #[error("entity name already in use: {name}")]
    DuplicateName {
        /// The conflicting name.
        name: String,
    },

    /// An entity referenced by a mutating operation does not exist.
    #[error("entity not found: {name}")]
    EntityNotFound {
        /// Name or id of the missing entity.
        name: String,
    },

    /// Invalid timestep.
    #[error("invalid timestep: {0} (must be positive and finite)")]
    InvalidTimestep(f64),

    /// An object description violates a structural invariant.
    #[error("invalid object description: {reason}")]
    InvalidDescription {
        /// What is wrong with the description.
        reason: String,
    },

    /// Invalid configuration.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the configuration error.
        reason: String,
    },

    /// A scene could not be loaded.
    #[error("failed to load scene {path}: {reason}")]
    SceneLoad {
        /// Path of the scene.
        path: String,
        /// Underlying failure.
        reason: String,
    },

    /// Physics stepping requested on a backend that has none.
    #[error("backend {backend} does not support physics")]
    PhysicsUnsupported {
        /// Backend name.
        backend: String,
    },

    /// A robot controller failed; the physics step was aborted.
    #[error("controller of robot {robot} failed: {reason}")]
    Controller {
        /// Name of the robot.
        robot: String,
        /// Failure reported by the controller.
        reason: String,
    },
}

impl SimError {
    /// Create an invalid description error.
    #[must_use]
    pub fn invalid_description(reason: impl Into<String>) -> Self {
        Self::InvalidDescription {
            reason: reason.into(),
        }
    }

    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Create a dimension mismatch error.
    #[must_use]
    pub fn dimension_mismatch(what: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            what: what.into(),
            expected,
            actual,
        }
    }

    /// Create an entity-not-found error.
    #[must_use]
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::EntityNotFound { name: name.into() }
    }

    /// Create a controller failure.
    #[must_use]
    pub fn controller(robot: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Controller {
            robot: robot.into(),
            reason: reason.into(),
        }
    }

    /// Check if this error is a caller bug rather than a runtime condition.
    #[must_use]
    pub fn is_precondition_violation(&self) -> bool {
        matches!(
            self,
            Self::InvalidDofIndex { .. }
                | Self::DuplicateDofIndex { .. }
                | Self::DimensionMismatch { .. }
                | Self::PhysicsUnsupported { .. }
        )
    }

    /// Check if this is a controller failure.
    #[must_use]
    pub fn is_controller_error(&self) -> bool {
        matches!(self, Self::Controller { .. })
    }

    /// Check if this is a configuration error.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::InvalidConfig { .. } | Self::InvalidTimestep(_))
    }
}
