//! A world shared across threads.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::backend::Backend;
use crate::world::World;

/// A [`World`] behind `Arc<Mutex<_>>`.
///
/// Locking yields exclusive access; opening a transaction on the guard gives
/// an atomic view over a sequence of operations.
///
/// ```
/// use sim_env::reference::ReferenceBackend;
/// use sim_env::{SharedWorld, World};
///
/// let shared = SharedWorld::new(World::new(ReferenceBackend::new()));
/// let other = shared.clone();
/// std::thread::spawn(move || {
///     let mut world = other.lock();
///     world.transaction().save_state();
/// })
/// .join()
/// .ok();
/// assert_eq!(shared.lock().saved_state_count(), 1);
/// ```
pub struct SharedWorld<B: Backend> {
    inner: Arc<Mutex<World<B>>>,
}

impl<B: Backend> SharedWorld<B> {
    /// Share a world.
    #[must_use]
    pub fn new(world: World<B>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(world)),
        }
    }

    /// Lock the world.
    pub fn lock(&self) -> MutexGuard<'_, World<B>> {
        self.inner.lock()
    }

    /// Lock the world if nobody else holds it.
    pub fn try_lock(&self) -> Option<MutexGuard<'_, World<B>>> {
        self.inner.try_lock()
    }
}

impl<B: Backend> Clone for SharedWorld<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: Backend> std::fmt::Debug for SharedWorld<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedWorld")
            .field("strong_count", &Arc::strong_count(&self.inner))
            .finish_non_exhaustive()
    }
}

impl<B: Backend> From<World<B>> for SharedWorld<B> {
    fn from(world: World<B>) -> Self {
        Self::new(world)
    }
}
