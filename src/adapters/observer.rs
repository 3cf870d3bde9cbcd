use std::path::Path;

use crate::types::ExecError;

/// Callback surface of one deletion batch.
///
/// Every callback fires on the batch worker thread. `on_progress` carries
/// the just-finished item's path and is skipped for the final item;
/// `on_complete` fires exactly once when the batch exhausts without abort;
/// `on_failure` fires exactly once with the aborting cause. A silent
/// cancellation fires neither completion nor failure.
pub trait BatchObserver: Send + Sync {
    fn on_progress(&self, finished: &Path);
    fn on_complete(&self);
    fn on_failure(&self, cause: &ExecError);
}

/// Observer that ignores every event.
#[derive(Default, Clone, Copy, Debug)]
pub struct NullObserver;

impl BatchObserver for NullObserver {
    fn on_progress(&self, _finished: &Path) {}
    fn on_complete(&self) {}
    fn on_failure(&self, _cause: &ExecError) {}
}
