// Facade for the API module; delegates to submodules under src/api/

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use log::Level;
use serde_json::json;
use uuid::Uuid;

use crate::adapters::{BatchObserver, ElevationResolver};
use crate::channel::{Channel, ChannelProvider, ChannelSlot, LocalChannelProvider};
use crate::fs::mounts::{MountRegistry, ProcMountRegistry};
use crate::logging::audit::{now_iso, AuditCtx};
use crate::logging::{AuditSink, FactsEmitter, StageLogger};
use crate::policy::Policy;
use crate::types::{
    BatchRequest, ExecError, ExecUnit, MountPoint, PendingSteps, UnitOutput, WritableUnit,
};

mod broker;
mod delete;
pub mod errors;
mod guard;
mod ops;
pub mod retry;

pub use delete::BatchHandle;
pub use retry::{Resolution, ResolutionTicket};

/// Privileged execution facade over one session channel.
///
/// All mutations funnel through [`Drawbridge::writable_execute`], which
/// owns the remount discipline; queries go through the plain
/// [`Drawbridge::execute`] path. The facade is the only constructor of
/// batch workers.
pub struct Drawbridge<E: FactsEmitter, A: AuditSink> {
    broker: broker::Broker<E, A>,
}

impl<E: FactsEmitter, A: AuditSink> Drawbridge<E, A> {
    /// Build a facade with the default collaborators: the live mount table
    /// and a local shell channel allocated lazily on first dispatch.
    pub fn new(facts: E, audit: A, policy: Policy) -> Self {
        let registry = ProcMountRegistry::new(policy.mounts.remount.clone());
        let provider = LocalChannelProvider::new(Duration::from_millis(policy.channel.timeout_ms));
        Self {
            broker: broker::Broker {
                facts,
                audit,
                policy,
                registry: Arc::new(registry),
                provider: Arc::new(provider),
                slot: Arc::new(ChannelSlot::empty()),
                resolver: None,
            },
        }
    }

    /// Use an already-allocated channel for this session instead of
    /// allocating from the provider.
    #[must_use]
    pub fn with_channel(mut self, channel: Box<dyn Channel>) -> Self {
        self.broker.slot = Arc::new(ChannelSlot::holding(channel));
        self
    }

    #[must_use]
    pub fn with_channel_provider(mut self, provider: Box<dyn ChannelProvider>) -> Self {
        self.broker.provider = Arc::from(provider);
        self.broker.slot = Arc::new(ChannelSlot::empty());
        self
    }

    #[must_use]
    pub fn with_mount_registry(mut self, registry: Box<dyn MountRegistry>) -> Self {
        self.broker.registry = Arc::from(registry);
        self
    }

    /// Install the resolver consulted on elevation failures inside a
    /// batch. Without one, every elevation failure reads as canceled.
    #[must_use]
    pub fn with_elevation_resolver(mut self, resolver: Box<dyn ElevationResolver>) -> Self {
        self.broker.resolver = Some(Arc::from(resolver));
        self
    }

    /// Run one unit with no writability handling.
    ///
    /// Contractually for non-mutating units; a read-only refusal here is
    /// reported as an execution failure, not as a recoverable condition.
    ///
    /// # Errors
    ///
    /// Any classified failure of the underlying run.
    pub fn execute(&self, unit: ExecUnit) -> Result<UnitOutput, ExecError> {
        let ctx = AuditCtx::new(&self.broker.facts, Uuid::new_v4().to_string(), now_iso());
        let slog = StageLogger::new(&ctx);
        let kind = unit.kind_name();
        let path = unit.target().display().to_string();
        self.broker
            .audit
            .log(Level::Debug, &format!("execute {kind} {path}"));
        match self.broker.execute(unit) {
            Ok(out) => {
                slog.execute().unit(kind).path(path).emit_success();
                Ok(out)
            }
            Err(e) => {
                slog.execute()
                    .unit(kind)
                    .path(path)
                    .error_id(errors::error_id_for(&e))
                    .emit_failure();
                Err(e)
            }
        }
    }

    /// Pair a unit with its target's mount point from the registry.
    #[must_use]
    pub fn writable(&self, unit: ExecUnit) -> WritableUnit {
        self.broker.writable(unit)
    }

    /// Run one mutating unit under the writable-operation guard.
    ///
    /// If the target's mount is read-only and remountable, the guard
    /// remounts it read-write first and read-only again afterwards. On an
    /// elevation failure the error carries every step still owed, in
    /// execution order, for [`Drawbridge::replay`].
    ///
    /// # Errors
    ///
    /// Any classified failure of the unit or of the guard's own remounts.
    pub fn writable_execute(&self, writable: WritableUnit) -> Result<UnitOutput, ExecError> {
        let ctx = AuditCtx::new(&self.broker.facts, Uuid::new_v4().to_string(), now_iso());
        let slog = StageLogger::new(&ctx);
        let kind = writable.unit.kind_name();
        let path = writable.unit.target().display().to_string();
        self.broker
            .audit
            .log(Level::Debug, &format!("writable execute {kind} {path}"));
        match guard::run(&self.broker, writable, &ctx) {
            Ok(out) => {
                slog.execute()
                    .unit(kind)
                    .path(path)
                    .field("writable", json!(true))
                    .emit_success();
                Ok(out)
            }
            Err(e) => {
                slog.execute()
                    .unit(kind)
                    .path(path)
                    .field("writable", json!(true))
                    .error_id(errors::error_id_for(&e))
                    .emit_failure();
                Err(e)
            }
        }
    }

    /// Re-issue the steps carried by an elevation failure after the
    /// resolver granted privileges. Runs the denied unit first, then
    /// whatever cleanup the guard still owed.
    ///
    /// # Errors
    ///
    /// The first failing step's error, unchanged.
    pub fn replay(&self, pending: &PendingSteps) -> Result<(), ExecError> {
        retry::replay(&self.broker, pending)
    }

    /// Snapshot of the mount table as the registry currently reads it.
    #[must_use]
    pub fn mount_points(&self) -> Vec<MountPoint> {
        self.broker.registry.mount_points()
    }
}

impl<E, A> Drawbridge<E, A>
where
    E: FactsEmitter + Clone + Send + 'static,
    A: AuditSink + Clone + Send + 'static,
{
    /// Submit a deletion batch and hand it to a dedicated worker.
    ///
    /// `current_dir`, when given, is checked against every selected item
    /// before anything is deleted: a batch containing an ancestor of it is
    /// rejected whole. Items are reordered children-first so a selected
    /// directory never disappears before a separately selected child.
    ///
    /// # Errors
    ///
    /// [`errors::ApiError::ConsistencyViolation`] before any deletion if
    /// the check fails, or [`errors::ApiError::WorkerUnavailable`] if the
    /// worker thread cannot be spawned.
    pub fn delete_batch(
        &self,
        request: BatchRequest,
        current_dir: Option<&Path>,
        observer: Box<dyn BatchObserver>,
    ) -> Result<BatchHandle, errors::ApiError> {
        delete::submit(self.broker.clone(), request, current_dir, observer)
    }
}
