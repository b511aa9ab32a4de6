//! Scene builders shared by the integration suites.

#![allow(dead_code)]

use nalgebra::{Point3, Vector3};
use sim_env::reference::{ReferenceBackend, Shape};
use sim_env::{
    BaseAxis, DofLimits, JointDescription, LinkDescription, ObjectDescription, ObjectId, Pose,
    World,
};

/// A static sphere.
pub fn ball(name: &str, x: f64, radius: f64) -> ObjectDescription<Shape> {
    ObjectDescription::new(name)
        .with_pose(Pose::from_position(Point3::new(x, 0.0, 0.0)))
        .with_link(LinkDescription::new(format!("{name}_link")).with_geometry(Shape::sphere(radius)))
}

/// A static unit cube with a free planar base.
pub fn crate_box(name: &str, x: f64) -> ObjectDescription<Shape> {
    ObjectDescription::new(name)
        .with_base_dofs(&BaseAxis::PLANAR)
        .with_pose(Pose::from_position(Point3::new(x, 0.0, 0.0)))
        .with_link(
            LinkDescription::new(format!("{name}_link"))
                .with_geometry(Shape::cuboid(Vector3::new(0.5, 0.5, 0.5))),
        )
}

/// A planar mobile base carrying a two-joint arm.
///
/// DOFs: `x`, `y`, `yaw` (base), then `shoulder` (revolute, limited to
/// ±π/2) and `elbow` (revolute, unlimited). The tool sphere sits 0.5 m
/// along the base x axis at zero position.
pub fn mobile_arm(name: &str, x: f64) -> ObjectDescription<Shape> {
    let base_limits = [
        DofLimits::unlimited().with_velocity(1.0),
        DofLimits::unlimited().with_velocity(1.0),
        DofLimits::unlimited().with_velocity(2.0),
    ];
    ObjectDescription::robot(name)
        .with_limited_base_dofs(&BaseAxis::PLANAR, &base_limits)
        .with_pose(Pose::from_position(Point3::new(x, 0.0, 0.0)))
        .with_link(
            LinkDescription::new(format!("{name}_base"))
                .with_geometry(Shape::cuboid(Vector3::new(0.3, 0.3, 0.1))),
        )
        .with_link(LinkDescription::new(format!("{name}_upper")))
        .with_link(
            LinkDescription::new(format!("{name}_tool")).with_geometry(Shape::sphere(0.1)),
        )
        .with_joint(
            JointDescription::revolute(
                format!("{name}_shoulder"),
                format!("{name}_base"),
                format!("{name}_upper"),
            )
            .with_limits(
                DofLimits::unlimited()
                    .with_position(-std::f64::consts::FRAC_PI_2, std::f64::consts::FRAC_PI_2)
                    .with_velocity(1.5)
                    .with_acceleration(4.0),
            ),
        )
        .with_joint(
            JointDescription::revolute(
                format!("{name}_elbow"),
                format!("{name}_upper"),
                format!("{name}_tool"),
            )
            .with_origin(Pose::from_position(Point3::new(0.5, 0.0, 0.0)))
            .with_limits(DofLimits::unlimited().with_velocity(2.0)),
        )
}

/// A static object with one revolute joint and no base DOFs.
pub fn hinge(name: &str) -> ObjectDescription<Shape> {
    ObjectDescription::new(name)
        .with_link(LinkDescription::new(format!("{name}_frame")))
        .with_link(LinkDescription::new(format!("{name}_door")))
        .with_joint(JointDescription::revolute(
            format!("{name}_pin"),
            format!("{name}_frame"),
            format!("{name}_door"),
        ))
}

/// Ids of the standard test scene.
pub struct Scene {
    pub world: World<ReferenceBackend>,
    pub robot: ObjectId,
    pub left: ObjectId,
    pub right: ObjectId,
    pub door: ObjectId,
}

/// A robot at the origin, a ball overlapping it, a distant crate and a
/// hinge.
pub fn scene() -> Scene {
    let mut world = World::new(ReferenceBackend::new());
    let mut tx = world.transaction();
    let robot = tx.add_object(mobile_arm("robot", 0.0)).unwrap_or_else(|e| panic!("{e}"));
    let left = tx.add_object(ball("left", 0.5, 0.3)).unwrap_or_else(|e| panic!("{e}"));
    let right = tx.add_object(crate_box("right", 10.0)).unwrap_or_else(|e| panic!("{e}"));
    let door = tx.add_object(hinge("door")).unwrap_or_else(|e| panic!("{e}"));
    drop(tx);
    Scene {
        world,
        robot,
        left,
        right,
        door,
    }
}
