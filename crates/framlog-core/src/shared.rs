//! Cloneable handle for stores used from several threads
//!
//! `FramStore` never locks internally. When more than one context writes to
//! the device, every operation must hold the whole store, because an append is
//! several dependent frames and the write latch is device-wide.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::engine::FramStore;

/// `FramStore` behind one mutex
pub struct SharedStore<T> {
    inner: Arc<Mutex<FramStore<T>>>,
}

impl<T> Clone for SharedStore<T> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<T> SharedStore<T> {
    pub fn new(store: FramStore<T>) -> Self {
        Self { inner: Arc::new(Mutex::new(store)) }
    }

    /// Exclusive access until the guard drops
    pub fn lock(&self) -> MutexGuard<'_, FramStore<T>> {
        self.inner.lock()
    }

    /// Run `f` with exclusive access
    pub fn with<R>(&self, f: impl FnOnce(&mut FramStore<T>) -> R) -> R {
        f(&mut self.inner.lock())
    }
}

impl<T> From<FramStore<T>> for SharedStore<T> {
    fn from(store: FramStore<T>) -> Self {
        Self::new(store)
    }
}
