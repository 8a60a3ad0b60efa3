//! Running count of scheduled vs settled remote operations

use serde::Serialize;
use std::future::Future;
use std::sync::Mutex;

/// Snapshot reported to the progress sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Progress {
    pub total: usize,
    pub finished: usize,
}

impl Progress {
    pub fn is_complete(&self) -> bool {
        self.finished == self.total
    }
}

/// Counts tracked operations of one run and reports every change to a sink.
///
/// The sink is called with the counter lock held, so observers always see a
/// non-decreasing sequence even when operations settle back to back.
pub struct ProgressTracker<'a> {
    state: Mutex<Progress>,
    sink: &'a (dyn Fn(Progress) + Send + Sync),
}

impl<'a> ProgressTracker<'a> {
    pub fn new(sink: &'a (dyn Fn(Progress) + Send + Sync)) -> Self {
        Self {
            state: Mutex::new(Progress::default()),
            sink,
        }
    }

    /// Schedule one operation. It counts as finished when the guard drops.
    pub fn begin(&self) -> TrackedOperation<'_, 'a> {
        self.update(|progress| progress.total += 1);
        TrackedOperation { tracker: self }
    }

    fn end(&self) {
        self.update(|progress| progress.finished += 1);
    }

    fn update(&self, change: impl FnOnce(&mut Progress)) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        change(&mut state);
        (self.sink)(*state);
    }

    /// Run `operation` as a tracked operation, settled on success and failure alike
    pub async fn track<F: Future>(&self, operation: F) -> F::Output {
        let _operation = self.begin();
        operation.await
    }

    pub fn snapshot(&self) -> Progress {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Scoped handle of one scheduled operation
pub struct TrackedOperation<'t, 'a> {
    tracker: &'t ProgressTracker<'a>,
}

impl Drop for TrackedOperation<'_, '_> {
    fn drop(&mut self) {
        self.tracker.end();
    }
}
