//! The coarse process-wide state lock.
//!
//! Every read of shared ledger, mempool or block-index state happens under
//! this lock. It is reentrant so that a collaborator invoked while the
//! lock is held may take it again on the same thread.

use std::fmt;
use std::sync::Arc;

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};

/// Shared handle to the state lock. Clones refer to the same lock.
#[derive(Clone, Default)]
pub struct StateLock {
    inner: Arc<ReentrantMutex<()>>,
}

impl StateLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until the lock is held by this thread.
    pub fn lock(&self) -> ReentrantMutexGuard<'_, ()> {
        self.inner.lock()
    }

    /// Take the lock only if no other thread holds it.
    pub fn try_lock(&self) -> Option<ReentrantMutexGuard<'_, ()>> {
        self.inner.try_lock()
    }

    /// True when both handles refer to the same lock.
    pub fn same_lock(&self, other: &StateLock) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for StateLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateLock")
            .field("handles", &Arc::strong_count(&self.inner))
            .finish()
    }
}
