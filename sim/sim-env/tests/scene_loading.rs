//! Loading JSON scenes through the reference backend.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]

use std::io::Write;

use approx::assert_relative_eq;
use nalgebra::DVector;
use sim_env::reference::{ReferenceBackend, Shape};
use sim_env::{BaseAxis, DofAddressable, JointType, Named, Posed, SimError, World, WorldState};
use tempfile::NamedTempFile;

const SCENE: &str = r#"{
    "objects": [
        {
            "name": "ground",
            "links": [
                {
                    "name": "ground_link",
                    "geometry": { "type": "plane", "normal": [0.0, 0.0, 1.0], "distance": 0.0 }
                }
            ]
        },
        {
            "name": "crate",
            "base_dofs": ["x", "y", "z"],
            "pose": { "position": [2.0, 0.0, 0.45], "rotation": [0.0, 0.0, 0.0, 1.0] },
            "links": [
                {
                    "name": "crate_link",
                    "geometry": { "type": "box", "half_extents": [0.5, 0.5, 0.5] }
                }
            ]
        },
        {
            "name": "arm",
            "robot": true,
            "links": [
                { "name": "arm_base", "geometry": { "type": "sphere", "radius": 0.2 } },
                { "name": "arm_link" }
            ],
            "joints": [
                {
                    "name": "arm_slide",
                    "joint_type": "prismatic",
                    "parent": "arm_base",
                    "child": "arm_link",
                    "axis": [1.0, 0.0, 0.0],
                    "limits": { "position": { "min": -1.0, "max": 1.0 } },
                    "position": 0.25
                }
            ]
        }
    ]
}"#;

fn scene_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn loaded() -> World<ReferenceBackend> {
    let file = scene_file(SCENE);
    let mut world = World::new(ReferenceBackend::new());
    world.transaction().load_world(file.path()).unwrap();
    world
}

// ============================================================================
// Successful Loads
// ============================================================================

#[test]
fn loads_objects_robots_and_geometry() {
    let world = loaded();
    assert_eq!(world.objects(false).len(), 3);
    assert_eq!(world.robots().len(), 1);

    let crate_box = world.object_by_name("crate", true).unwrap();
    assert_eq!(crate_box.base_axes(), &[BaseAxis::X, BaseAxis::Y, BaseAxis::Z]);
    assert_eq!(crate_box.transform().position.z, 0.45);
    assert_eq!(
        world.link_geometry(crate_box.base_link()),
        Some(&Shape::cuboid(nalgebra::Vector3::new(0.5, 0.5, 0.5)))
    );

    let slide = world.joint_by_name("arm_slide").unwrap();
    assert_eq!(slide.joint_type(), JointType::Prismatic);
    assert_eq!(world.joint_position(slide.id()), Some(0.25));
    assert_relative_eq!(
        world.link_by_name("arm_link").unwrap().transform().position.x,
        0.25
    );
}

#[test]
fn loaded_scene_supports_queries() {
    let world = loaded();
    let ground = world.object_by_name("ground", false).unwrap().id();
    let crate_box = world.object_by_name("crate", false).unwrap().id();
    let arm = world.robot_by_name("arm").unwrap().id();

    // Both the crate and the arm's base sphere sink into the ground.
    assert!(world.collides(crate_box, ground));
    assert!(world.collides(arm, ground));
    assert!(!world.collides(arm, crate_box));
}

#[test]
fn reloading_replaces_contents() {
    let mut world = loaded();
    let old_arm = world.robot_by_name("arm").unwrap().id();
    world.transaction().save_state();

    let file =
        scene_file(r#"{ "objects": [ { "name": "solo", "links": [ { "name": "solo_link" } ] } ] }"#);
    world.transaction().load_world(file.path()).unwrap();

    assert_eq!(world.objects(false).len(), 1);
    assert!(world.robot(old_arm).is_none());
    assert!(world.link_by_name("arm_base").is_none());
    assert_eq!(world.saved_state_count(), 0);
    assert_eq!(world.object_by_name("solo", false).unwrap().name(), "solo");
}

#[test]
fn world_state_survives_json() {
    let mut world = loaded();
    let arm = world.robot_by_name("arm").unwrap().id();
    world
        .transaction()
        .set_dof_positions(arm, &DVector::from_vec(vec![-0.5]), &[])
        .unwrap();
    let json = serde_json::to_string(&world.world_state()).unwrap();

    world
        .transaction()
        .set_dof_positions(arm, &DVector::from_vec(vec![0.9]), &[])
        .unwrap();
    let saved: WorldState = serde_json::from_str(&json).unwrap();
    assert!(world.transaction().set_world_state(&saved));
    assert_eq!(world.robot(arm).unwrap().dof_position(0), Some(-0.5));
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn malformed_json_leaves_world_unchanged() {
    let mut world = loaded();
    let file = scene_file("{ \"objects\": [ { \"name\": ");
    let err = world.transaction().load_world(file.path()).unwrap_err();
    assert!(matches!(err, SimError::SceneLoad { .. }));
    assert_eq!(world.objects(false).len(), 3);
}

#[test]
fn invalid_object_empties_world() {
    let mut world = loaded();
    let file = scene_file(
        r#"{ "objects": [
            { "name": "a", "links": [ { "name": "a_link" } ] },
            { "name": "a", "links": [ { "name": "b_link" } ] }
        ] }"#,
    );
    let err = world.transaction().load_world(file.path()).unwrap_err();
    match err {
        SimError::SceneLoad { path, reason } => {
            assert_eq!(path, file.path().display().to_string());
            assert!(reason.contains("already in use"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!world.has_objects());
    assert!(!world.has_robots());
}

#[test]
fn missing_file_is_a_scene_error() {
    let mut world = World::new(ReferenceBackend::new());
    let dir = tempfile::tempdir().unwrap();
    let err = world
        .transaction()
        .load_world(dir.path().join("absent.json"))
        .unwrap_err();
    assert!(matches!(err, SimError::SceneLoad { .. }));
}
