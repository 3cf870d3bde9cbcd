//! The batch worker: an explicit state machine driving sequential deletion
//! with elevation retries and post-delete verification.

use std::path::{Path, PathBuf};
use std::time::Instant;

use log::Level;
use serde_json::json;

use crate::adapters::BatchObserver;
use crate::api::errors::error_id_for;
use crate::api::guard;
use crate::api::retry::{self, Resolution};
use crate::logging::audit::{now_iso, AuditCtx};
use crate::logging::{AuditSink, FactsEmitter, StageLogger};
use crate::types::{BatchOutcome, BatchReport, ExecError, ExecUnit, FsObject, PendingSteps};

use super::super::broker::Broker;

/// Lifecycle of one batch. Every transition is explicit; there is no
/// implicit "keep going after failure" path.
enum BatchState {
    Pending,
    Running { cursor: usize },
    AwaitingResolution { cursor: usize, pending: PendingSteps },
    Done,
    /// `cause: None` is a silent cancellation.
    Aborted { cause: Option<ExecError> },
}

pub(crate) fn run<E, A>(
    broker: &Broker<E, A>,
    batch_id: String,
    items: &[FsObject],
    observer: &dyn BatchObserver,
) -> BatchReport
where
    E: FactsEmitter,
    A: AuditSink,
{
    let started = Instant::now();
    let total = items.len();
    let mut deleted: Vec<PathBuf> = Vec::new();
    let ctx = AuditCtx::new(&broker.facts, batch_id.clone(), now_iso());

    broker
        .audit
        .log(Level::Info, &format!("batch {batch_id}: {total} item(s)"));

    let mut state = BatchState::Pending;
    let outcome = loop {
        state = match state {
            BatchState::Pending => BatchState::Running { cursor: 0 },
            BatchState::Running { cursor } if cursor == total => BatchState::Done,
            BatchState::Running { cursor } => {
                let item = &items[cursor];
                match delete_item(broker, &ctx, item) {
                    Ok(()) => {
                        note_deleted(&ctx, item, cursor, total, &mut deleted, observer);
                        BatchState::Running { cursor: cursor + 1 }
                    }
                    Err(ExecError::InsufficientPermissions { pending }) => {
                        BatchState::AwaitingResolution { cursor, pending }
                    }
                    Err(cause) => {
                        note_failed(&ctx, item, &cause);
                        observer.on_failure(&cause);
                        BatchState::Aborted { cause: Some(cause) }
                    }
                }
            }
            BatchState::AwaitingResolution { cursor, pending } => {
                let item = &items[cursor];
                match await_resolution(broker, &ctx, item, &pending) {
                    Resolution::Resolved => {
                        // One resolution attempt per item; any replay
                        // failure aborts rather than re-parking.
                        match retry::replay(broker, &pending)
                            .and_then(|()| verify_deleted(broker, item.path()))
                        {
                            Ok(()) => {
                                note_deleted(&ctx, item, cursor, total, &mut deleted, observer);
                                BatchState::Running { cursor: cursor + 1 }
                            }
                            Err(cause) => {
                                note_failed(&ctx, item, &cause);
                                observer.on_failure(&cause);
                                BatchState::Aborted { cause: Some(cause) }
                            }
                        }
                    }
                    Resolution::Failed(cause) => {
                        note_failed(&ctx, item, &cause);
                        observer.on_failure(&cause);
                        BatchState::Aborted { cause: Some(cause) }
                    }
                    Resolution::Canceled => BatchState::Aborted { cause: None },
                }
            }
            BatchState::Done => break BatchOutcome::Completed,
            BatchState::Aborted { cause: Some(cause) } => break BatchOutcome::Aborted(cause),
            BatchState::Aborted { cause: None } => break BatchOutcome::Canceled,
        };
    };

    if matches!(outcome, BatchOutcome::Completed) {
        observer.on_complete();
    }

    let report = BatchReport {
        batch_id,
        deleted,
        duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        outcome,
    };

    let slog = StageLogger::new(&ctx);
    let row = slog
        .batch_result()
        .field("outcome", json!(report.outcome.label()))
        .field("deleted", json!(report.deleted.len()))
        .field("duration_ms", json!(report.duration_ms));
    match &report.outcome {
        BatchOutcome::Completed => row.emit_success(),
        BatchOutcome::Canceled => row.emit_warn(),
        BatchOutcome::Aborted(cause) => row.error_id(error_id_for(cause)).emit_failure(),
    }
    broker.audit.log(
        Level::Info,
        &format!(
            "batch {}: {} ({} deleted)",
            report.batch_id,
            report.outcome.label(),
            report.deleted.len()
        ),
    );

    report
}

/// Delete one selected entry through the guard and verify it is gone.
///
/// The unit kind follows the snapshot taken at selection time, not a live
/// re-stat: a path recorded as a directory is removed recursively even if
/// it changed underneath.
fn delete_item<E, A>(
    broker: &Broker<E, A>,
    ctx: &AuditCtx,
    item: &FsObject,
) -> Result<(), ExecError>
where
    E: FactsEmitter,
    A: AuditSink,
{
    let unit = if item.is_directory() {
        ExecUnit::delete_dir(item.path())
    } else {
        ExecUnit::delete_file(item.path())
    };
    guard::run(broker, broker.writable(unit), ctx)?;
    verify_deleted(broker, item.path())
}

/// Confirm deletion by querying the entry back. An answer means the delete
/// silently failed; any query error counts as confirmed deletion.
fn verify_deleted<E, A>(broker: &Broker<E, A>, path: &Path) -> Result<(), ExecError>
where
    E: FactsEmitter,
    A: AuditSink,
{
    match broker.execute(ExecUnit::info(path, false)) {
        Ok(_) => Err(ExecError::ExecutionFailed(format!(
            "{} still present after delete",
            path.display()
        ))),
        Err(_) => Ok(()),
    }
}

/// Park on the resolver for one elevation failure. No installed resolver
/// reads as cancellation.
fn await_resolution<E, A>(
    broker: &Broker<E, A>,
    ctx: &AuditCtx,
    item: &FsObject,
    pending: &PendingSteps,
) -> Resolution
where
    E: FactsEmitter,
    A: AuditSink,
{
    let slog = StageLogger::new(ctx);
    let builder = slog
        .batch_resolution()
        .path(item.path().display().to_string())
        .field("pending_steps", json!(pending.len()));

    let (Some(resolver), Some(denied)) = (broker.resolver.as_deref(), pending.denied()) else {
        builder
            .field("resolution", json!("canceled"))
            .field("resolver", json!(false))
            .emit_warn();
        return Resolution::Canceled;
    };

    let (ticket, wait) = retry::resolution_channel();
    resolver.resolve(denied, ticket);
    let resolution = wait.wait();

    let builder = builder.unit(denied.kind_name());
    match &resolution {
        Resolution::Resolved => builder.field("resolution", json!("resolved")).emit_success(),
        Resolution::Failed(cause) => builder
            .field("resolution", json!("failed"))
            .error_id(error_id_for(cause))
            .emit_failure(),
        Resolution::Canceled => builder.field("resolution", json!("canceled")).emit_warn(),
    }
    resolution
}

fn note_deleted(
    ctx: &AuditCtx,
    item: &FsObject,
    cursor: usize,
    total: usize,
    deleted: &mut Vec<PathBuf>,
    observer: &dyn BatchObserver,
) {
    deleted.push(item.path().to_path_buf());
    StageLogger::new(ctx)
        .batch_item()
        .path(item.path().display().to_string())
        .field("index", json!(cursor))
        .field("entry", serde_json::to_value(item).unwrap_or_default())
        .emit_success();
    // The final item reports through completion, not progress.
    if cursor + 1 < total {
        observer.on_progress(item.path());
    }
}

fn note_failed(ctx: &AuditCtx, item: &FsObject, cause: &ExecError) {
    StageLogger::new(ctx)
        .batch_item()
        .path(item.path().display().to_string())
        .error_id(error_id_for(cause))
        .emit_failure();
}

