//! Contact records produced by collision queries.

use nalgebra::{Point3, Vector3};

use crate::{LinkId, ObjectId};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single detected contact between two links.
///
/// The `a` side is the entity named first in the query, the `b` side the
/// second. Object and link ids are weak references: they may fail to
/// resolve if the world changed after the query.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Contact {
    /// Object on side a.
    pub object_a: ObjectId,
    /// Link on side a.
    pub link_a: LinkId,
    /// Object on side b.
    pub object_b: ObjectId,
    /// Link on side b.
    pub link_b: LinkId,
    /// Contact point in world frame.
    pub point: Point3<f64>,
    /// Contact normal in world frame, pointing from a towards b.
    pub normal: Vector3<f64>,
    /// Penetration depth (non-negative when touching or overlapping).
    pub depth: f64,
}

impl Contact {
    /// Swap the a and b sides, reversing the normal.
    #[must_use]
    pub fn flip(self) -> Self {
        Self {
            object_a: self.object_b,
            link_a: self.link_b,
            object_b: self.object_a,
            link_b: self.link_a,
            point: self.point,
            normal: -self.normal,
            depth: self.depth,
        }
    }

    /// Check that point, normal and depth are finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.point.coords.iter().all(|x| x.is_finite())
            && self.normal.iter().all(|x| x.is_finite())
            && self.depth.is_finite()
    }
}
