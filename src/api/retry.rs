//! Elevation resolution protocol between a parked worker and an
//! out-of-band resolver.
//!
//! An elevation failure carries the steps still owed; the worker parks on
//! a single-shot channel while the resolver decides. Cancellation is a
//! first-class resolution value, and dropping the unfired ticket counts as
//! cancellation so an abandoned resolver can never hang the worker.

use crossbeam_channel::{bounded, Receiver, Sender};

use crate::logging::{AuditSink, FactsEmitter};
use crate::types::{ExecError, PendingSteps};

use super::broker::Broker;

/// Resolver's answer to one elevation failure.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// Privileges granted; the pending steps may be replayed.
    Resolved,
    /// Resolution failed; the carried cause aborts the waiting operation.
    Failed(ExecError),
    /// The user backed out; abort silently.
    Canceled,
}

/// Single-shot handle a resolver fires exactly once.
pub struct ResolutionTicket {
    tx: Sender<Resolution>,
}

impl ResolutionTicket {
    /// Deliver the answer. Consumes the ticket; a second answer is
    /// unrepresentable.
    pub fn fire(self, resolution: Resolution) {
        let _ = self.tx.send(resolution);
    }
}

/// Worker-side end of the single-shot channel.
pub(crate) struct ResolutionWait {
    rx: Receiver<Resolution>,
}

impl ResolutionWait {
    /// Block until the resolver answers. A dropped ticket reads as
    /// cancellation.
    pub(crate) fn wait(self) -> Resolution {
        self.rx.recv().unwrap_or(Resolution::Canceled)
    }
}

pub(crate) fn resolution_channel() -> (ResolutionTicket, ResolutionWait) {
    let (tx, rx) = bounded(1);
    (ResolutionTicket { tx }, ResolutionWait { rx })
}

/// Re-issue a pending-steps list after privileges were granted.
///
/// Each step runs through the plain execute path in order; the first
/// failure stops the replay and is returned unchanged. Replaying the list
/// the guard built restores the mount/op/unmount discipline: the denied
/// step runs first, then whatever was still owed behind it.
pub(crate) fn replay<E: FactsEmitter, A: AuditSink>(
    broker: &Broker<E, A>,
    pending: &PendingSteps,
) -> Result<(), ExecError> {
    for step in pending.steps() {
        broker.execute(step.clone())?;
    }
    Ok(())
}
