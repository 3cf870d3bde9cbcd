//! Execution broker: resolves the channel, runs units, and classifies raw
//! failures into the fixed taxonomy exactly once.

use std::sync::Arc;

use crate::adapters::ElevationResolver;
use crate::channel::{ChannelError, ChannelProvider, ChannelSlot};
use crate::fs::mounts::MountRegistry;
use crate::logging::{AuditSink, FactsEmitter};
use crate::policy::Policy;
use crate::types::{ExecError, ExecUnit, PendingSteps, UnitOutput, WritableUnit};

/// Shared engine behind the facade. Cheap to clone: the sinks are expected
/// to be handles, and every collaborator sits behind an `Arc`.
pub(crate) struct Broker<E: FactsEmitter, A: AuditSink> {
    pub facts: E,
    pub audit: A,
    pub policy: Policy,
    pub registry: Arc<dyn MountRegistry>,
    pub provider: Arc<dyn ChannelProvider>,
    pub slot: Arc<ChannelSlot>,
    pub resolver: Option<Arc<dyn ElevationResolver>>,
}

impl<E: FactsEmitter + Clone, A: AuditSink + Clone> Clone for Broker<E, A> {
    fn clone(&self) -> Self {
        Self {
            facts: self.facts.clone(),
            audit: self.audit.clone(),
            policy: self.policy.clone(),
            registry: Arc::clone(&self.registry),
            provider: Arc::clone(&self.provider),
            slot: Arc::clone(&self.slot),
            resolver: self.resolver.clone(),
        }
    }
}

impl<E: FactsEmitter, A: AuditSink> Broker<E, A> {
    /// Run `unit` through the session channel and classify any raw failure.
    ///
    /// This is the writable-path entry: a raw read-only refusal surfaces
    /// as `ReadOnlyFilesystem` unchanged.
    pub(crate) fn dispatch(&self, unit: ExecUnit) -> Result<UnitOutput, ExecError> {
        let channel = self
            .slot
            .obtain(self.provider.as_ref())
            .map_err(|e| ExecError::AllocationFailed(e.to_string()))?;
        let raw = match channel.lock() {
            Ok(mut ch) => ch.run(unit.clone()),
            Err(_) => {
                return Err(ExecError::AllocationFailed(
                    "channel mutex poisoned".to_string(),
                ))
            }
        };
        raw.map_err(|e| classify(e, unit))
    }

    /// Plain execute: contractually only for non-mutating units.
    ///
    /// A read-only-filesystem refusal here is a caller contract violation,
    /// not a recoverable condition, and is recoded to `ExecutionFailed`.
    pub(crate) fn execute(&self, unit: ExecUnit) -> Result<UnitOutput, ExecError> {
        match self.dispatch(unit) {
            Err(ExecError::ReadOnlyFilesystem) => Err(ExecError::ExecutionFailed(
                "read-only filesystem on a plain execute".to_string(),
            )),
            other => other,
        }
    }

    /// Build a writable unit, resolving the target's mount point from the
    /// registry. A target outside every table entry yields `mount: None`.
    pub(crate) fn writable(&self, unit: ExecUnit) -> WritableUnit {
        let mount = unit
            .write_target()
            .and_then(|path| self.registry.mount_for(path));
        WritableUnit::new(unit, mount)
    }
}

/// Map a raw channel failure onto the public taxonomy. A permission denial
/// seeds the pending-steps list with the unit that was denied; the guard
/// appends the steps still owed behind it.
fn classify(raw: ChannelError, unit: ExecUnit) -> ExecError {
    match raw {
        ChannelError::NotFound => ExecError::NotFound,
        ChannelError::PermissionDenied => ExecError::InsufficientPermissions {
            pending: PendingSteps::seed(unit),
        },
        ChannelError::Unsupported => ExecError::CommandUnavailable,
        ChannelError::Timeout => ExecError::Timeout,
        ChannelError::Failed(detail) => ExecError::ExecutionFailed(detail),
        ChannelError::ReadOnly => ExecError::ReadOnlyFilesystem,
    }
}
