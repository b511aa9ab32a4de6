//! A self-contained backend for tests and examples.
//!
//! [`ReferenceBackend`] implements every [`Backend`](crate::Backend) method
//! with the simplest thing that honors the contract: sphere, box and plane
//! shapes, unit-inertia integration, JSON scene files and a viewer that
//! records what it draws.

mod backend;
mod shapes;

pub use backend::ReferenceBackend;
pub use shapes::{shape_contact, Shape, ShapeContact};
