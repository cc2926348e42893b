//! Recyclable handle buffers.
//!
//! Each consumer that walks adjacency (the model, the feature tracker) owns
//! its own `RefPool`. Buffers are acquired as scoped [`PooledRefs`] guards and
//! go back to the pool on drop, including on early returns and `?` exits.

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use super::{Element, Handle};

/// Default number of idle buffers kept per pool.
pub(crate) const DEFAULT_MAX_IDLE: usize = 16;

/// Pool of reusable `Vec<Handle<K>>` buffers.
pub struct RefPool<K> {
    idle: Mutex<Vec<Vec<Handle<K>>>>,
    max_idle: usize,
    outstanding: AtomicUsize,
}

impl<K: Element> RefPool<K> {
    /// Creates a pool that keeps at most `max_idle` buffers around.
    #[must_use]
    pub fn new(max_idle: usize) -> Self {
        Self {
            idle: Mutex::new(Vec::new()),
            max_idle: max_idle.max(1),
            outstanding: AtomicUsize::new(0),
        }
    }

    /// Creates a pool with the default idle limit.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_MAX_IDLE)
    }

    /// Takes an empty buffer from the pool, allocating one if none is idle.
    pub fn acquire(&self) -> PooledRefs<'_, K> {
        let buffer = self.idle.lock().pop().unwrap_or_default();
        self.outstanding.fetch_add(1, Ordering::Relaxed);
        PooledRefs {
            pool: self,
            buffer,
        }
    }

    /// Number of buffers currently checked out.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Relaxed)
    }

    /// Number of idle buffers ready for reuse.
    #[must_use]
    pub fn idle(&self) -> usize {
        self.idle.lock().len()
    }

    fn release(&self, mut buffer: Vec<Handle<K>>) {
        self.outstanding.fetch_sub(1, Ordering::Relaxed);
        buffer.clear();
        let mut idle = self.idle.lock();
        if idle.len() < self.max_idle {
            idle.push(buffer);
        }
    }
}

impl<K: Element> Default for RefPool<K> {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// A handle buffer checked out of a [`RefPool`].
pub struct PooledRefs<'p, K: Element> {
    pool: &'p RefPool<K>,
    buffer: Vec<Handle<K>>,
}

impl<K: Element> Deref for PooledRefs<'_, K> {
    type Target = Vec<Handle<K>>;

    fn deref(&self) -> &Self::Target {
        &self.buffer
    }
}

impl<K: Element> DerefMut for PooledRefs<'_, K> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.buffer
    }
}

impl<K: Element> Drop for PooledRefs<'_, K> {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.buffer));
    }
}
