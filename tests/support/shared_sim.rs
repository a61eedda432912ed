//! A `SimTestApp` that rspec closures can share.

use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use test_utils::SimTestApp;

/// Forwards `Send` and `Sync` for a mutex-guarded simulation app.
pub struct ThreadSafeSim(pub SimTestApp);

impl Deref for ThreadSafeSim {
    type Target = SimTestApp;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for ThreadSafeSim {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

// SAFETY: rspec fixtures must be `Clone + Send + Sync`, but suites run
// serially and every access goes through the mutex, so the app never moves
// between threads while borrowed.
unsafe impl Send for ThreadSafeSim {}
unsafe impl Sync for ThreadSafeSim {}

/// Shared pointer type for the wrapped app.
pub type SharedSim = Arc<Mutex<ThreadSafeSim>>;

/// Wraps an app for sharing.
pub fn share(sim: SimTestApp) -> SharedSim {
    Arc::new(Mutex::new(ThreadSafeSim(sim)))
}

/// Locks the shared app, recovering from a poisoned mutex.
pub fn lock(sim: &SharedSim) -> MutexGuard<'_, ThreadSafeSim> {
    sim.lock().unwrap_or_else(PoisonError::into_inner)
}
