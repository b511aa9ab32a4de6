//! DOF layout, index lists and active DOF sets.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]

mod common;

use approx::assert_relative_eq;
use nalgebra::DVector;
use proptest::prelude::*;
use sim_env::{DofAddressable, Limits, Named, Posed, SimError};

// ============================================================================
// Layout
// ============================================================================

#[test]
fn joint_i_owns_dof_k_plus_i() {
    let scene = common::scene();
    let robot = scene.world.robot(scene.robot).unwrap();

    assert_eq!(robot.num_base_dofs(), 3);
    assert_eq!(robot.num_dofs(), 5);
    assert_eq!(robot.dof_indices(), vec![0, 1, 2, 3, 4]);
    for (i, joint) in scene.world.object_joints(scene.robot).iter().enumerate() {
        assert_eq!(joint.joint_index(), i);
        assert_eq!(joint.dof_index(), 3 + i);
        assert_eq!(robot.joint_from_dof_index(3 + i), Some(joint.id()));
    }
    assert_eq!(robot.joint_from_dof_index(1), None);
}

#[test]
fn static_hinge_has_one_dof() {
    let scene = common::scene();
    let door = scene.world.object(scene.door).unwrap();
    assert!(door.is_static());
    assert_eq!(door.num_dofs(), 1);
    assert_eq!(door.active_dofs(), &[0]);

    let pin = scene.world.joint_by_name("door_pin").unwrap();
    assert_eq!(pin.dof_index(), 0);
}

#[test]
fn static_ball_has_no_dofs() {
    let scene = common::scene();
    let ball = scene.world.object(scene.left).unwrap();
    assert_eq!(ball.num_dofs(), 0);
    assert_eq!(ball.dof_positions(&[]).unwrap().len(), 0);
}

#[test]
fn unlimited_dofs_report_extreme_bounds() {
    let scene = common::scene();
    let robot = scene.world.robot(scene.robot).unwrap();
    let limits = robot.dof_position_limits(&[4, 3]).unwrap();
    assert_eq!(limits[0].as_pair(), (f64::MIN, f64::MAX));
    assert_eq!(
        limits[1],
        Limits::new(-std::f64::consts::FRAC_PI_2, std::f64::consts::FRAC_PI_2)
    );

    let info = robot.dof_information(4).unwrap();
    assert!(info.cyclic);
    assert!(!robot.dof_information(3).unwrap().cyclic);
    assert!(!robot.dof_information(0).unwrap().cyclic);
}

#[test]
fn velocity_limits_follow_index_order() {
    let scene = common::scene();
    let robot = scene.world.robot(scene.robot).unwrap();
    let limits = robot.dof_velocity_limits(&[2, 0, 4]).unwrap();
    assert_eq!(
        limits,
        vec![
            Limits::symmetric(2.0),
            Limits::symmetric(1.0),
            Limits::symmetric(2.0)
        ]
    );
}

// ============================================================================
// Reads and Writes
// ============================================================================

#[test]
fn base_dofs_write_through_to_pose_and_links() {
    let mut scene = common::scene();
    let mut tx = scene.world.transaction();
    tx.set_dof_positions(scene.robot, &DVector::from_vec(vec![2.0, -1.0]), &[0, 1])
        .unwrap();

    let robot = tx.robot(scene.robot).unwrap();
    assert_relative_eq!(robot.transform().position.x, 2.0);
    assert_relative_eq!(robot.transform().position.y, -1.0);

    let tool = tx.link_by_name("robot_tool").unwrap();
    assert_relative_eq!(tool.transform().position.x, 2.5, epsilon = 1e-12);
    assert_relative_eq!(tool.transform().position.y, -1.0, epsilon = 1e-12);
}

#[test]
fn joint_writes_move_child_links() {
    let mut scene = common::scene();
    let mut tx = scene.world.transaction();
    tx.set_dof_positions(
        scene.robot,
        &DVector::from_vec(vec![std::f64::consts::FRAC_PI_2]),
        &[3],
    )
    .unwrap();

    let tool = tx.link_by_name("robot_tool").unwrap().transform();
    assert_relative_eq!(tool.position.x, 0.0, epsilon = 1e-12);
    assert_relative_eq!(tool.position.y, 0.5, epsilon = 1e-12);

    let shoulder = tx.joint_by_name("robot_shoulder").unwrap().id();
    assert_relative_eq!(tx.joint_position(shoulder).unwrap(), std::f64::consts::FRAC_PI_2);
}

#[test]
fn empty_index_list_uses_active_set() {
    let mut scene = common::scene();
    let mut tx = scene.world.transaction();
    tx.set_active_dofs(scene.robot, &[4, 0]).unwrap();
    tx.set_dof_positions(scene.robot, &DVector::from_vec(vec![0.7, 3.0]), &[])
        .unwrap();

    let robot = tx.robot(scene.robot).unwrap();
    assert_eq!(robot.active_dofs(), &[4, 0]);
    let active = robot.dof_positions(&[]).unwrap();
    assert_relative_eq!(active[0], 0.7);
    assert_relative_eq!(active[1], 3.0);
    assert_relative_eq!(robot.dof_position(4).unwrap(), 0.7);
}

#[test]
fn invalid_index_lists_are_rejected() {
    let mut scene = common::scene();
    let mut tx = scene.world.transaction();

    let err = tx
        .set_dof_positions(scene.robot, &DVector::from_vec(vec![1.0]), &[5])
        .unwrap_err();
    assert_eq!(
        err,
        SimError::InvalidDofIndex {
            index: 5,
            num_dofs: 5
        }
    );

    let err = tx
        .set_dof_positions(scene.robot, &DVector::from_vec(vec![1.0, 2.0]), &[1, 1])
        .unwrap_err();
    assert_eq!(err, SimError::DuplicateDofIndex { index: 1 });

    let err = tx
        .set_dof_velocities(scene.robot, &DVector::from_vec(vec![1.0]), &[0, 1])
        .unwrap_err();
    assert!(matches!(err, SimError::DimensionMismatch { expected: 2, actual: 1, .. }));

    assert!(tx.set_active_dofs(scene.robot, &[0, 9]).is_err());
    assert_eq!(tx.robot(scene.robot).unwrap().active_dofs(), &[0, 1, 2, 3, 4]);
}

#[test]
fn failed_write_leaves_object_untouched() {
    let mut scene = common::scene();
    let mut tx = scene.world.transaction();
    let before = tx.robot(scene.robot).unwrap().state();
    assert!(tx
        .set_dof_positions(scene.robot, &DVector::from_vec(vec![1.0, 2.0]), &[0, 7])
        .is_err());
    assert_eq!(tx.robot(scene.robot).unwrap().state(), before);
}

#[test]
fn unknown_object_is_not_found() {
    let mut scene = common::scene();
    let mut tx = scene.world.transaction();
    assert!(tx.remove_object(scene.left));
    let err = tx
        .set_dof_velocities(scene.left, &DVector::zeros(0), &[])
        .unwrap_err();
    assert!(matches!(err, SimError::EntityNotFound { .. }));
    assert!(tx.object(scene.left).is_none());
    assert!(tx.object_by_name("left", false).is_none());
}

#[test]
fn lookups_by_name_respect_robot_filter() {
    let scene = common::scene();
    let world = &scene.world;
    assert!(world.object_by_name("robot", false).is_some());
    assert!(world.object_by_name("robot", true).is_none());
    assert!(world.robot_by_name("left").is_none());
    assert_eq!(world.robot_by_name("robot").unwrap().name(), "robot");
    assert_eq!(world.objects(true).len(), 3);
    assert_eq!(world.objects(false).len(), 4);
    assert_eq!(world.robots().len(), 1);
    assert!(world.has_objects());
    assert!(world.has_robots());
}

// ============================================================================
// Property Tests
// ============================================================================

fn arb_robot_positions() -> impl Strategy<Value = Vec<f64>> {
    (
        -5.0..5.0f64,
        -5.0..5.0f64,
        -3.0..3.0f64,
        -1.5..1.5f64,
        -10.0..10.0f64,
    )
        .prop_map(|(x, y, yaw, shoulder, elbow)| vec![x, y, yaw, shoulder, elbow])
}

fn arb_index_subset() -> impl Strategy<Value = Vec<usize>> {
    Just((0..5).collect::<Vec<usize>>())
        .prop_shuffle()
        .prop_flat_map(|order| (1..=5usize).prop_map(move |n| order[..n].to_vec()))
}

proptest! {
    #[test]
    fn positions_read_back_in_any_order(
        values in arb_robot_positions(),
        indices in arb_index_subset(),
    ) {
        let mut scene = common::scene();
        let mut tx = scene.world.transaction();
        let subset = DVector::from_iterator(indices.len(), indices.iter().map(|&i| values[i]));
        tx.set_dof_positions(scene.robot, &subset, &indices).unwrap();

        let robot = tx.robot(scene.robot).unwrap();
        let read = robot.dof_positions(&indices).unwrap();
        for (k, &i) in indices.iter().enumerate() {
            prop_assert!((read[k] - values[i]).abs() < 1e-9);
        }
    }

    #[test]
    fn velocities_read_back_through_active_set(
        values in prop::collection::vec(-3.0..3.0f64, 5),
        active in arb_index_subset(),
    ) {
        let mut scene = common::scene();
        let mut tx = scene.world.transaction();
        tx.set_active_dofs(scene.robot, &active).unwrap();
        let subset = DVector::from_iterator(active.len(), active.iter().map(|&i| values[i]));
        tx.set_dof_velocities(scene.robot, &subset, &[]).unwrap();

        let robot = tx.robot(scene.robot).unwrap();
        prop_assert_eq!(robot.dof_velocities(&[]).unwrap(), subset);
        for i in (0..5).filter(|i| !active.contains(i)) {
            prop_assert_eq!(robot.dof_velocity(i), Some(0.0));
        }
    }
}
