use crate::api::retry::{Resolution, ResolutionTicket};
use crate::types::ExecUnit;

/// Out-of-band authority that can grant elevated privileges.
///
/// Called from the batch worker (or any caller handling an elevation
/// failure) with the denied unit and a single-shot ticket. The call itself
/// must not block: a UI-driven resolver typically hands the ticket to its
/// interactive thread and returns, firing the ticket later. Dropping the
/// ticket unfired counts as cancellation.
pub trait ElevationResolver: Send + Sync {
    fn resolve(&self, denied: &ExecUnit, ticket: ResolutionTicket);
}

/// Resolver that cancels every request immediately.
#[derive(Default, Clone, Copy, Debug)]
pub struct AutoDenyResolver;

impl ElevationResolver for AutoDenyResolver {
    fn resolve(&self, _denied: &ExecUnit, ticket: ResolutionTicket) {
        ticket.fire(Resolution::Canceled);
    }
}
