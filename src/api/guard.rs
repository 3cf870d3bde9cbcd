//! Writable-operation guard: remount read-write, run the unit, and always
//! remount read-only again.
//!
//! The one exit that skips cleanup is an elevation failure, where the
//! remount-read-only step joins the pending list instead: it must run
//! after the now-pending original unit eventually succeeds, so cleanup is
//! owed to the caller's replay.

use serde_json::json;

use crate::api::errors::{error_id_for, ErrorId};
use crate::logging::audit::AuditCtx;
use crate::logging::{AuditSink, FactsEmitter, StageLogger};
use crate::types::{ExecError, ExecUnit, MountMode, UnitOutput, WritableUnit};

use super::broker::Broker;

pub(crate) fn run<E: FactsEmitter, A: AuditSink>(
    broker: &Broker<E, A>,
    writable: WritableUnit,
    ctx: &AuditCtx,
) -> Result<UnitOutput, ExecError> {
    let WritableUnit { unit, mount } = writable;
    let slog = StageLogger::new(ctx);

    // No resolvable mount, remount disallowed, or already read-write:
    // run unguarded and let the filesystem report its own refusal.
    let mp = match mount {
        Some(m) if m.remount_allowed && m.mode != MountMode::ReadWrite => m,
        _ => return broker.dispatch(unit),
    };

    let mount_path = mp.path.display().to_string();
    let mount_rw = ExecUnit::remount(mp.clone(), MountMode::ReadWrite);
    let mount_ro = ExecUnit::remount(mp, MountMode::ReadOnly);

    match broker.dispatch(mount_rw) {
        Ok(_) => {
            slog.guard_mount()
                .path(mount_path.clone())
                .field("mode", json!("rw"))
                .emit_success();
        }
        Err(ExecError::InsufficientPermissions { pending }) => {
            let pending = pending.followed_by([unit, mount_ro]);
            slog.guard_mount()
                .path(mount_path)
                .field("mode", json!("rw"))
                .field("pending_steps", json!(pending.len()))
                .error_id(ErrorId::E_PERM)
                .emit_failure();
            return Err(ExecError::InsufficientPermissions { pending });
        }
        Err(other) => {
            slog.guard_mount()
                .path(mount_path)
                .field("mode", json!("rw"))
                .error_id(error_id_for(&other))
                .emit_failure();
            return Err(other);
        }
    }

    match broker.dispatch(unit) {
        Err(ExecError::InsufficientPermissions { pending }) => {
            // Cleanup deferred to the replay.
            let pending = pending.followed_by([mount_ro]);
            slog.guard_unmount()
                .path(mount_path)
                .field("mode", json!("ro"))
                .field("deferred", json!(true))
                .field("pending_steps", json!(pending.len()))
                .emit_warn();
            Err(ExecError::InsufficientPermissions { pending })
        }
        Ok(value) => match broker.dispatch(mount_ro) {
            Ok(_) => {
                slog.guard_unmount()
                    .path(mount_path)
                    .field("mode", json!("ro"))
                    .emit_success();
                Ok(value)
            }
            Err(unmount_err) => {
                slog.guard_unmount()
                    .path(mount_path)
                    .field("mode", json!("ro"))
                    .error_id(error_id_for(&unmount_err))
                    .emit_failure();
                Err(unmount_err)
            }
        },
        Err(op_err) => {
            // The operation's error outranks a cleanup error.
            match broker.dispatch(mount_ro) {
                Ok(_) => {
                    slog.guard_unmount()
                        .path(mount_path)
                        .field("mode", json!("ro"))
                        .emit_success();
                }
                Err(unmount_err) => {
                    slog.guard_unmount()
                        .path(mount_path)
                        .field("mode", json!("ro"))
                        .error_id(error_id_for(&unmount_err))
                        .emit_warn();
                }
            }
            Err(op_err)
        }
    }
}
