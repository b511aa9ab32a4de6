//! The reference backend.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use nalgebra::DVector;
use sim_env_types::{Contact, Result, SimError};

use super::shapes::{shape_contact, Shape};
use crate::backend::{Backend, Dynamics, LinkGeometry};
use crate::description::{ObjectDescription, SceneDescription};
use crate::viewer::{RecordingViewer, WorldViewer};

/// Primitive shapes, unit-inertia dynamics and JSON scenes.
///
/// # Dynamics
///
/// Every DOF is treated as an independent unit mass. One step of length
/// `dt` with generalized force `f` is semi-implicit Euler:
///
/// ```text
/// a = clamp(f, acceleration limits)
/// v = clamp(v + a·dt, velocity limits)
/// q = q + v·dt        (clamped to position limits; v = 0 on clamp)
/// ```
///
/// When no forces are given (no controller, or the controller skipped the
/// step) `f = 0`, so an object at rest stays where it is.
///
/// # Scenes
///
/// [`load_scene`](Backend::load_scene) reads a JSON
/// [`SceneDescription<Shape>`](SceneDescription).
#[derive(Debug)]
pub struct ReferenceBackend {
    physics: bool,
    pair_checks: AtomicUsize,
    viewer: RecordingViewer,
}

impl ReferenceBackend {
    /// A backend with physics.
    #[must_use]
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            physics: true,
            pair_checks: AtomicUsize::new(0),
            viewer: RecordingViewer::new(),
        }
    }

    /// A backend without physics: collision and kinematics only.
    #[must_use]
    pub fn kinematic() -> Self {
        Self {
            physics: false,
            ..Self::new()
        }
    }

    /// Number of link pairs handed to the narrow phase so far.
    #[must_use]
    pub fn pair_checks(&self) -> usize {
        self.pair_checks.load(Ordering::Relaxed)
    }

    /// Reset the pair counter.
    pub fn reset_pair_checks(&self) {
        self.pair_checks.store(0, Ordering::Relaxed);
    }

    /// What the world's viewer has drawn.
    #[must_use]
    pub fn recorder(&self) -> &RecordingViewer {
        &self.viewer
    }

    fn scene_error(path: &Path, reason: impl ToString) -> SimError {
        SimError::SceneLoad {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

impl Backend for ReferenceBackend {
    type Geometry = Shape;

    fn name(&self) -> &str {
        "reference"
    }

    fn supports_physics(&self) -> bool {
        self.physics
    }

    fn load_scene(&mut self, path: &Path) -> Result<Vec<ObjectDescription<Shape>>> {
        let text = std::fs::read_to_string(path).map_err(|e| Self::scene_error(path, e))?;
        let scene: SceneDescription<Shape> =
            serde_json::from_str(&text).map_err(|e| Self::scene_error(path, e))?;
        tracing::debug!(path = %path.display(), objects = scene.objects.len(), "parsed scene");
        Ok(scene.objects)
    }

    fn collide(
        &self,
        a: &LinkGeometry<'_, Shape>,
        b: &LinkGeometry<'_, Shape>,
        contacts: Option<&mut Vec<Contact>>,
    ) -> bool {
        self.pair_checks.fetch_add(1, Ordering::Relaxed);
        let Some(hit) = shape_contact(a.geometry, &a.transform, b.geometry, &b.transform) else {
            return false;
        };
        if let Some(out) = contacts {
            out.push(Contact {
                object_a: a.object,
                link_a: a.link,
                object_b: b.object,
                link_b: b.link,
                point: hit.point,
                normal: hit.normal,
                depth: hit.depth,
            });
        }
        true
    }

    fn integrate(&mut self, object: &mut Dynamics<'_>, forces: Option<&DVector<f64>>, dt: f64) {
        if !self.physics {
            return;
        }
        let n = object.num_dofs();
        let mut q = object.positions();
        let mut v = object.velocities();
        for i in 0..n {
            let Some(info) = object.dof_information(i) else {
                continue;
            };
            let f = forces.and_then(|f| f.get(i).copied()).unwrap_or(0.0);
            let a = info.acceleration_limits.clamp(f);
            v[i] = info.velocity_limits.clamp(v[i] + a * dt);
            let next = q[i] + v[i] * dt;
            if info.position_limits.contains(next) {
                q[i] = next;
            } else {
                q[i] = info.position_limits.clamp(next);
                v[i] = 0.0;
            }
        }
        object.set_velocities(&v);
        object.set_positions(&q);
    }

    fn create_viewer(&mut self) -> Box<dyn WorldViewer> {
        Box::new(self.viewer.clone())
    }
}
