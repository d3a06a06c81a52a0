//! Optional thread placement for worker threads.

/// A scheduler directive applied on each worker thread before it starts.
///
/// Placement is a performance hint only: the engine's results never depend
/// on it. Implementations typically pin the calling thread to a core.
pub trait Placement: Send + Sync {
    /// Called on the worker's own thread with its zero-based index.
    fn place(&self, worker: usize);
}

/// Leaves worker threads wherever the OS schedules them.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unpinned;

impl Placement for Unpinned {
    fn place(&self, _worker: usize) {}
}

impl<F> Placement for F
where
    F: Fn(usize) + Send + Sync,
{
    fn place(&self, worker: usize) {
        self(worker)
    }
}
