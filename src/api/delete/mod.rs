//! Batch deletion: submission-time checks, ordering, and the worker spawn.
//!
//! Submission performs the consistency check and the child-before-ancestor
//! sort on the caller's thread, then hands the ordered items to a
//! dedicated worker. Everything after the spawn is reported through the
//! observer callbacks and the returned handle.

use std::path::Path;
use std::thread::{self, JoinHandle};

use serde_json::json;
use uuid::Uuid;

use crate::adapters::BatchObserver;
use crate::constants::BATCH_WORKER_NAME;
use crate::logging::audit::{now_iso, AuditCtx};
use crate::logging::{AuditSink, FactsEmitter, StageLogger};
use crate::types::{BatchOutcome, BatchReport, BatchRequest, ExecError, FsObject};

use super::broker::Broker;
use super::errors::{ApiError, ErrorId};

pub(crate) mod worker;

/// Handle to one running batch.
///
/// A running batch cannot be canceled: deletion is not safely
/// interruptible mid-item because of the mount/unmount guarantee. The
/// handle only joins the outcome.
#[derive(Debug)]
pub struct BatchHandle {
    batch_id: String,
    thread: JoinHandle<BatchReport>,
}

impl BatchHandle {
    #[must_use]
    pub fn batch_id(&self) -> &str {
        &self.batch_id
    }

    /// Block until the worker finishes and return the final report.
    #[must_use]
    pub fn wait(self) -> BatchReport {
        match self.thread.join() {
            Ok(report) => report,
            Err(_) => BatchReport {
                batch_id: self.batch_id,
                deleted: Vec::new(),
                duration_ms: 0,
                outcome: BatchOutcome::Aborted(ExecError::ExecutionFailed(
                    "batch worker panicked".to_string(),
                )),
            },
        }
    }
}

pub(crate) fn submit<E, A>(
    broker: Broker<E, A>,
    request: BatchRequest,
    current_dir: Option<&Path>,
    observer: Box<dyn BatchObserver>,
) -> Result<BatchHandle, ApiError>
where
    E: FactsEmitter + Clone + Send + 'static,
    A: AuditSink + Clone + Send + 'static,
{
    let batch_id = Uuid::new_v4().to_string();
    let ctx = AuditCtx::new(&broker.facts, batch_id.clone(), now_iso());
    let slog = StageLogger::new(&ctx);

    // Hard pre-condition: never start a batch that would delete the
    // caller's own location out from under it.
    if let Some(cur) = current_dir {
        if let Some(offender) = request
            .items
            .iter()
            .find(|item| cur.starts_with(item.path()))
        {
            let msg = format!(
                "current directory {} is inside {}",
                cur.display(),
                offender.path().display()
            );
            slog.batch_submit()
                .path(offender.path().display().to_string())
                .field("items", json!(request.len()))
                .error_id(ErrorId::E_CONSISTENCY)
                .emit_failure();
            return Err(ApiError::ConsistencyViolation(msg));
        }
    }

    let mut items = request.items;
    sort_children_first(&mut items);

    slog.batch_submit()
        .field("items", json!(items.len()))
        .emit_success();

    let worker_id = batch_id.clone();
    let thread = thread::Builder::new()
        .name(BATCH_WORKER_NAME.to_string())
        .spawn(move || worker::run(&broker, worker_id, &items, observer.as_ref()))
        .map_err(|e| ApiError::WorkerUnavailable(e.to_string()))?;

    Ok(BatchHandle { batch_id, thread })
}

/// Order children strictly before any selected ancestor: deeper paths
/// first, lexicographic within one depth. Deterministic, so replaying the
/// same request yields the same execution order.
fn sort_children_first(items: &mut [FsObject]) {
    items.sort_by(|a, b| {
        depth(b.path())
            .cmp(&depth(a.path()))
            .then_with(|| a.path().cmp(b.path()))
    });
}

fn depth(path: &Path) -> usize {
    path.components().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FsoKind;
    use std::path::PathBuf;

    fn fso(path: &str, kind: FsoKind) -> FsObject {
        FsObject {
            path: PathBuf::from(path),
            kind,
            size: 0,
            link_target: None,
        }
    }

    #[test]
    fn descendants_sort_before_ancestors() {
        let mut items = vec![
            fso("/sdcard/a", FsoKind::Directory),
            fso("/sdcard/a/b", FsoKind::File),
            fso("/sdcard/c", FsoKind::File),
        ];
        sort_children_first(&mut items);
        let order: Vec<_> = items.iter().map(|i| i.path().to_path_buf()).collect();
        assert_eq!(
            order,
            vec![
                PathBuf::from("/sdcard/a/b"),
                PathBuf::from("/sdcard/a"),
                PathBuf::from("/sdcard/c"),
            ]
        );
    }

    #[test]
    fn sort_is_stable_for_any_input_order() {
        let mut one = vec![
            fso("/d/x/y/z", FsoKind::File),
            fso("/d", FsoKind::Directory),
            fso("/d/x", FsoKind::Directory),
        ];
        let mut two = vec![
            fso("/d/x", FsoKind::Directory),
            fso("/d/x/y/z", FsoKind::File),
            fso("/d", FsoKind::Directory),
        ];
        sort_children_first(&mut one);
        sort_children_first(&mut two);
        assert_eq!(one, two);
        assert_eq!(one[0].path(), Path::new("/d/x/y/z"));
        assert_eq!(one[2].path(), Path::new("/d"));
    }
}
