use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Run-state of one bulk job or spam loop.
///
/// Loops hold a clone and re-read [`JobHandle::is_running`] at every iteration
/// boundary. Only [`super::TaskRegistry`] flips it to stopped.
#[derive(Debug, Clone)]
pub struct JobHandle {
    id: u64,
    running: Arc<AtomicBool>,
}

impl JobHandle {
    pub(crate) fn new(id: u64) -> Self {
        Self {
            id,
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub(crate) fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Whether both values refer to the same job.
    pub fn same_job(&self, other: &JobHandle) -> bool {
        Arc::ptr_eq(&self.running, &other.running)
    }
}
