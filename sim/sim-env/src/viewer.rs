//! Visualization surface.
//!
//! A viewer draws debug primitives into a backend's visualization and hands
//! back a [`Handle`] per primitive. Handles are unique for the lifetime of
//! the process.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use sim_env_types::Pose;

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);

/// Identifier of a drawn primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle {
    id: u64,
}

impl Handle {
    /// Allocate a fresh handle.
    #[must_use]
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            id: NEXT_HANDLE.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Raw handle value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.id
    }
}

impl std::fmt::Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Handle({})", self.id)
    }
}

/// Visualization surface of a world.
pub trait WorldViewer: Send {
    /// Draw a coordinate frame with axes of `length` drawn `width` wide.
    fn draw_frame(&mut self, transform: &Pose, length: f64, width: f64) -> Handle;

    /// Draw a coordinate frame with unit axes.
    fn draw_default_frame(&mut self, transform: &Pose) -> Handle {
        self.draw_frame(transform, 1.0, 0.1)
    }
}

/// A frame drawn by a [`RecordingViewer`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawnFrame {
    /// Handle returned to the caller.
    pub handle: Handle,
    /// Frame pose.
    pub transform: Pose,
    /// Axis length.
    pub length: f64,
    /// Axis width.
    pub width: f64,
}

/// A viewer that records what it is asked to draw.
///
/// Clones share the same record, so a backend can keep one and inspect what
/// the world drew through another.
#[derive(Debug, Clone, Default)]
pub struct RecordingViewer {
    frames: Arc<Mutex<Vec<DrawnFrame>>>,
}

impl RecordingViewer {
    /// Create an empty recording viewer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames drawn so far, oldest first.
    #[must_use]
    pub fn drawn_frames(&self) -> Vec<DrawnFrame> {
        self.frames.lock().clone()
    }
}

impl WorldViewer for RecordingViewer {
    fn draw_frame(&mut self, transform: &Pose, length: f64, width: f64) -> Handle {
        let handle = Handle::new();
        self.frames.lock().push(DrawnFrame {
            handle,
            transform: *transform,
            length,
            width,
        });
        tracing::trace!(%handle, length, width, "drew frame");
        handle
    }
}
