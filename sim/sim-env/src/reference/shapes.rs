//! Primitive link geometry and its narrow phase.
//!
//! Shapes are expressed in the link frame and placed in the world by the
//! link transform. Every pair test returns the deepest contact, with the
//! normal pointing from the first shape to the second.

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use sim_env_types::Pose;

/// Tolerance below which a separating axis is considered degenerate.
const AXIS_EPSILON: f64 = 1e-9;

/// Collision shape attached to a link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    /// Sphere centered at the link origin.
    Sphere {
        /// Sphere radius in meters.
        radius: f64,
    },
    /// Box centered at the link origin, aligned with the link axes.
    Box {
        /// Half-extents along each link axis.
        half_extents: Vector3<f64>,
    },
    /// Half-space `normal · x <= distance`, in the link frame.
    ///
    /// The normal points out of the solid side.
    Plane {
        /// Outward unit normal.
        normal: Vector3<f64>,
        /// Offset of the boundary from the link origin along the normal.
        distance: f64,
    },
}

impl Shape {
    /// Create a sphere.
    #[must_use]
    pub fn sphere(radius: f64) -> Self {
        Self::Sphere { radius }
    }

    /// Create a box from half-extents.
    #[must_use]
    pub fn cuboid(half_extents: Vector3<f64>) -> Self {
        Self::Box { half_extents }
    }

    /// Create a ground plane through the link origin with normal +Z.
    #[must_use]
    pub fn ground() -> Self {
        Self::Plane {
            normal: Vector3::z(),
            distance: 0.0,
        }
    }
}

/// A contact between two placed shapes, in world frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeContact {
    /// Contact point.
    pub point: Point3<f64>,
    /// Unit normal from the first shape to the second.
    pub normal: Vector3<f64>,
    /// Penetration depth (non-negative).
    pub depth: f64,
}

impl ShapeContact {
    /// Swap the roles of the two shapes.
    #[must_use]
    pub fn flip(self) -> Self {
        Self {
            normal: -self.normal,
            ..self
        }
    }
}

/// Test two placed shapes for contact.
#[must_use]
pub fn shape_contact(a: &Shape, pose_a: &Pose, b: &Shape, pose_b: &Pose) -> Option<ShapeContact> {
    match (a, b) {
        // =====================================================================
        // Sphere collisions
        // =====================================================================
        (Shape::Sphere { radius: r_a }, Shape::Sphere { radius: r_b }) => {
            sphere_sphere(pose_a.position, *r_a, pose_b.position, *r_b)
        }

        (Shape::Sphere { radius }, Shape::Plane { normal, distance }) => {
            let (n, d) = world_plane(pose_b, normal, *distance)?;
            sphere_plane(pose_a.position, *radius, &n, d)
        }

        // Plane-Sphere (flip)
        (Shape::Plane { normal, distance }, Shape::Sphere { radius }) => {
            let (n, d) = world_plane(pose_a, normal, *distance)?;
            sphere_plane(pose_b.position, *radius, &n, d).map(ShapeContact::flip)
        }

        // =====================================================================
        // Box collisions
        // =====================================================================
        (Shape::Box { half_extents: he_a }, Shape::Box { half_extents: he_b }) => {
            box_box(pose_a, he_a, pose_b, he_b)
        }

        (Shape::Box { half_extents }, Shape::Sphere { radius }) => {
            box_sphere(pose_a, half_extents, pose_b.position, *radius)
        }

        // Sphere-Box (flip)
        (Shape::Sphere { radius }, Shape::Box { half_extents }) => {
            box_sphere(pose_b, half_extents, pose_a.position, *radius).map(ShapeContact::flip)
        }

        (Shape::Box { half_extents }, Shape::Plane { normal, distance }) => {
            let (n, d) = world_plane(pose_b, normal, *distance)?;
            box_plane(pose_a, half_extents, &n, d)
        }

        // Plane-Box (flip)
        (Shape::Plane { normal, distance }, Shape::Box { half_extents }) => {
            let (n, d) = world_plane(pose_a, normal, *distance)?;
            box_plane(pose_b, half_extents, &n, d).map(ShapeContact::flip)
        }

        // Planes are static scenery.
        (Shape::Plane { .. }, Shape::Plane { .. }) => None,
    }
}

/// World-frame normal and offset of a link-frame plane.
fn world_plane(pose: &Pose, normal: &Vector3<f64>, distance: f64) -> Option<(Vector3<f64>, f64)> {
    let unit = normal.try_normalize(AXIS_EPSILON)?;
    let n = pose.transform_vector(&unit);
    let on_plane = pose.transform_point(&Point3::from(unit * distance));
    Some((n, n.dot(&on_plane.coords)))
}

fn sphere_sphere(
    c_a: Point3<f64>,
    r_a: f64,
    c_b: Point3<f64>,
    r_b: f64,
) -> Option<ShapeContact> {
    let delta = c_b - c_a;
    let dist = delta.norm();
    let depth = r_a + r_b - dist;
    if depth < 0.0 {
        return None;
    }
    let normal = if dist > AXIS_EPSILON {
        delta / dist
    } else {
        Vector3::z()
    };
    Some(ShapeContact {
        point: c_a + normal * (r_a - depth * 0.5),
        normal,
        depth,
    })
}

/// Sphere (first) against half-space (second).
fn sphere_plane(
    center: Point3<f64>,
    radius: f64,
    n: &Vector3<f64>,
    d: f64,
) -> Option<ShapeContact> {
    let signed = n.dot(&center.coords) - d;
    let depth = radius - signed;
    if depth < 0.0 {
        return None;
    }
    Some(ShapeContact {
        point: center - n * signed,
        normal: -n,
        depth,
    })
}

/// Oriented box (first) against sphere (second).
fn box_sphere(
    pose: &Pose,
    half_extents: &Vector3<f64>,
    center: Point3<f64>,
    radius: f64,
) -> Option<ShapeContact> {
    let local = pose.inverse_transform_point(&center);
    let closest = Point3::new(
        local.x.clamp(-half_extents.x, half_extents.x),
        local.y.clamp(-half_extents.y, half_extents.y),
        local.z.clamp(-half_extents.z, half_extents.z),
    );
    let diff = local - closest;
    let dist = diff.norm();

    if dist > AXIS_EPSILON {
        let depth = radius - dist;
        if depth < 0.0 {
            return None;
        }
        return Some(ShapeContact {
            point: pose.transform_point(&closest),
            normal: pose.transform_vector(&(diff / dist)),
            depth,
        });
    }

    // Center inside the box: push out through the nearest face.
    let (axis, face_dist) = (0..3)
        .map(|i| (i, half_extents[i] - local[i].abs()))
        .fold((0, f64::MAX), |best, cur| if cur.1 < best.1 { cur } else { best });
    let mut normal_local = Vector3::zeros();
    normal_local[axis] = if local[axis] < 0.0 { -1.0 } else { 1.0 };
    Some(ShapeContact {
        point: center,
        normal: pose.transform_vector(&normal_local),
        depth: radius + face_dist,
    })
}

/// Oriented box (first) against half-space (second).
fn box_plane(
    pose: &Pose,
    half_extents: &Vector3<f64>,
    n: &Vector3<f64>,
    d: f64,
) -> Option<ShapeContact> {
    let (deepest, signed) = box_corners(pose, half_extents)
        .map(|p| (p, n.dot(&p.coords) - d))
        .fold((pose.position, f64::MAX), |best, cur| {
            if cur.1 < best.1 {
                cur
            } else {
                best
            }
        });
    if signed > 0.0 {
        return None;
    }
    Some(ShapeContact {
        point: deepest,
        normal: -n,
        depth: -signed,
    })
}

/// Oriented box against oriented box by the separating axis theorem.
///
/// Tests the three face normals of each box and their nine cross products;
/// the axis of least overlap gives the contact normal.
fn box_box(
    pose_a: &Pose,
    he_a: &Vector3<f64>,
    pose_b: &Pose,
    he_b: &Vector3<f64>,
) -> Option<ShapeContact> {
    let axes_a = box_axes(pose_a);
    let axes_b = box_axes(pose_b);
    let t = pose_b.position - pose_a.position;

    let mut candidates: Vec<Vector3<f64>> = Vec::with_capacity(15);
    candidates.extend_from_slice(&axes_a);
    candidates.extend_from_slice(&axes_b);
    for a in &axes_a {
        for b in &axes_b {
            candidates.push(a.cross(b));
        }
    }

    let mut best: Option<(f64, Vector3<f64>)> = None;
    for axis in candidates {
        let Some(axis) = axis.try_normalize(AXIS_EPSILON) else {
            continue;
        };
        let r_a = projected_radius(&axes_a, he_a, &axis);
        let r_b = projected_radius(&axes_b, he_b, &axis);
        let dist = t.dot(&axis);
        let overlap = r_a + r_b - dist.abs();
        if overlap < 0.0 {
            return None;
        }
        if best.map_or(true, |(o, _)| overlap < o) {
            let oriented = if dist < 0.0 { -axis } else { axis };
            best = Some((overlap, oriented));
        }
    }

    let (depth, normal) = best?;
    let on_a = support(pose_a, &axes_a, he_a, &normal);
    let on_b = support(pose_b, &axes_b, he_b, &-normal);
    Some(ShapeContact {
        point: Point3::from((on_a.coords + on_b.coords) * 0.5),
        normal,
        depth,
    })
}

fn box_axes(pose: &Pose) -> [Vector3<f64>; 3] {
    [
        pose.transform_vector(&Vector3::x()),
        pose.transform_vector(&Vector3::y()),
        pose.transform_vector(&Vector3::z()),
    ]
}

fn projected_radius(axes: &[Vector3<f64>; 3], he: &Vector3<f64>, dir: &Vector3<f64>) -> f64 {
    (0..3).map(|i| he[i] * axes[i].dot(dir).abs()).sum()
}

/// Farthest point of a box along `dir`.
fn support(
    pose: &Pose,
    axes: &[Vector3<f64>; 3],
    he: &Vector3<f64>,
    dir: &Vector3<f64>,
) -> Point3<f64> {
    (0..3).fold(pose.position, |p, i| {
        let sign = if axes[i].dot(dir) < 0.0 { -1.0 } else { 1.0 };
        p + axes[i] * (sign * he[i])
    })
}

fn box_corners<'a>(
    pose: &'a Pose,
    he: &'a Vector3<f64>,
) -> impl Iterator<Item = Point3<f64>> + 'a {
    (0..8).map(move |i| {
        let corner = Point3::new(
            if i & 1 == 0 { -he.x } else { he.x },
            if i & 2 == 0 { -he.y } else { he.y },
            if i & 4 == 0 { -he.z } else { he.z },
        );
        pose.transform_point(&corner)
    })
}
