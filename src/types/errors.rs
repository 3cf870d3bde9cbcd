//! The fixed failure taxonomy of the execution layer.
//!
//! Raw channel failures are classified into `ExecError` exactly once, at
//! the broker boundary, and never re-classified upstream.

use thiserror::Error;

use super::unit::ExecUnit;

/// Ordered list of units still owed execution after an elevation failure.
///
/// The head is the unit that was denied; the guard appends the steps behind
/// it (the original operation and/or the remount-read-only cleanup).
/// Immutable once raised: replay consumes a read of the same list the
/// failure carried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSteps(Vec<ExecUnit>);

impl PendingSteps {
    /// Start a list from the unit that was denied.
    pub(crate) fn seed(unit: ExecUnit) -> Self {
        Self(vec![unit])
    }

    /// Return a new list with `steps` appended in order.
    pub(crate) fn followed_by(self, steps: impl IntoIterator<Item = ExecUnit>) -> Self {
        let mut inner = self.0;
        inner.extend(steps);
        Self(inner)
    }

    #[must_use]
    pub fn steps(&self) -> &[ExecUnit] {
        &self.0
    }

    /// The unit that was denied.
    #[must_use]
    pub fn denied(&self) -> Option<&ExecUnit> {
        self.0.first()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Classified failure of one operation.
#[derive(Debug, Clone, Error)]
pub enum ExecError {
    /// Target path does not exist.
    #[error("no such file or directory")]
    NotFound,
    /// Elevation required. The only kind eligible for the retry protocol;
    /// carries the steps a resolver must replay once privileges are granted.
    #[error("insufficient permissions; {} step(s) pending", .pending.len())]
    InsufficientPermissions { pending: PendingSteps },
    /// The operation kind cannot be realized by the channel.
    #[error("operation not available on this channel")]
    CommandUnavailable,
    /// The channel's bounded per-command time was exceeded.
    #[error("operation timed out")]
    Timeout,
    /// The channel completed but reported failure, or a post-condition
    /// check found the operation did not take effect.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),
    /// A writable unit's mount could not be made writable.
    #[error("read-only filesystem")]
    ReadOnlyFilesystem,
    /// No command channel could be obtained.
    #[error("channel allocation failed: {0}")]
    AllocationFailed(String),
}

/// Convenient alias for results in the execution layer.
pub type Result<T> = std::result::Result<T, ExecError>;
